use chrono::{DateTime, Utc};

use crate::models::{ActivityEntry, ActivityRecord};

/// Human-relative labels for an activity feed. Input order is preserved
/// (callers sort most-recent first); `now` is the reference instant.
pub fn format_activity_feed(records: &[ActivityRecord], now: DateTime<Utc>) -> Vec<ActivityEntry> {
    records
        .iter()
        .map(|record| ActivityEntry {
            time: relative_label(record.occurred_at, now),
            detail: record.detail.clone(),
        })
        .collect()
}

/// First matching bucket wins: <60s "Just now", then minutes, hours, days,
/// weeks. Future timestamps (clock skew) clamp to "Just now".
pub fn relative_label(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - at).num_seconds().max(0);
    if seconds < 60 {
        return "Just now".to_string();
    }

    let (count, unit) = if seconds < 3_600 {
        (seconds / 60, "minute")
    } else if seconds < 86_400 {
        (seconds / 3_600, "hour")
    } else if seconds < 604_800 {
        (seconds / 86_400, "day")
    } else {
        (seconds / 604_800, "week")
    };

    let plural = if count == 1 { "" } else { "s" };
    format!("{count} {unit}{plural} ago")
}

#[cfg(test)]
mod tests {
    use super::{format_activity_feed, relative_label};
    use crate::models::ActivityRecord;
    use chrono::{Duration, Utc};

    #[test]
    fn buckets_match_documented_examples() {
        let now = Utc::now();
        assert_eq!(relative_label(now - Duration::seconds(30), now), "Just now");
        assert_eq!(relative_label(now - Duration::seconds(90), now), "1 minute ago");
        assert_eq!(relative_label(now - Duration::minutes(5), now), "5 minutes ago");
        assert_eq!(relative_label(now - Duration::hours(3), now), "3 hours ago");
        assert_eq!(relative_label(now - Duration::days(1), now), "1 day ago");
        assert_eq!(relative_label(now - Duration::days(2), now), "2 days ago");
        assert_eq!(relative_label(now - Duration::days(6), now), "6 days ago");
        assert_eq!(relative_label(now - Duration::days(7), now), "1 week ago");
        assert_eq!(relative_label(now - Duration::days(21), now), "3 weeks ago");
    }

    #[test]
    fn future_timestamps_clamp_to_just_now() {
        let now = Utc::now();
        assert_eq!(relative_label(now + Duration::hours(2), now), "Just now");
    }

    #[test]
    fn feed_preserves_input_order() {
        let now = Utc::now();
        let records = vec![
            ActivityRecord {
                detail: "created task".to_string(),
                occurred_at: now - Duration::seconds(10),
            },
            ActivityRecord {
                detail: "closed sprint".to_string(),
                occurred_at: now - Duration::days(2),
            },
        ];
        let feed = format_activity_feed(&records, now);
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].time, "Just now");
        assert_eq!(feed[0].detail, "created task");
        assert_eq!(feed[1].time, "2 days ago");
    }
}
