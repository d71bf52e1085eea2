use chrono::{Duration, NaiveDate};

use crate::accessors::EntityAccessor;
use crate::errors::{EngineError, EngineResult};
use crate::models::{BurndownSeries, TaskStatus};
use crate::stats::round1;

/// Ideal-vs-actual remaining-work series across a sprint's calendar span,
/// inclusive of both endpoint days.
///
/// `actual` is a single current snapshot repeated across every day on or
/// before `today`, with `None` for future days — no historical daily state
/// exists, so this is deliberately NOT a day-by-day history.
pub fn sprint_burndown(
    accessor: &dyn EntityAccessor,
    sprint_id: i64,
    today: NaiveDate,
) -> EngineResult<BurndownSeries> {
    let sprint = accessor
        .get_sprint(sprint_id)?
        .ok_or_else(|| EngineError::NotFound(format!("Sprint {sprint_id} not found")))?;

    let tasks = accessor.get_tasks_for_sprint(sprint_id)?;
    let total = tasks.len() as u32;
    if total == 0 {
        return Ok(BurndownSeries {
            labels: Vec::new(),
            ideal: Vec::new(),
            actual: Vec::new(),
            sprint_name: sprint.name,
            total_tasks: 0,
            completed_tasks: 0,
        });
    }

    let completed = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Done)
        .count() as u32;
    let total_f = f64::from(total);

    let (Some(start), Some(end)) = (sprint.start_date, sprint.end_date) else {
        // Single-point degraded series when the calendar span is unknown.
        return Ok(BurndownSeries {
            labels: vec!["Day 1".to_string()],
            ideal: vec![total_f],
            actual: vec![Some(total_f)],
            sprint_name: sprint.name,
            total_tasks: total,
            completed_tasks: completed,
        });
    };

    let span = (end - start).num_days() + 1;
    if span < 1 {
        tracing::warn!(sprint_id, %start, %end, "sprint dates inverted, clamping span to one day");
    }
    let days = span.max(1);
    let daily_burn = total_f / days as f64;

    let remaining_snapshot = total_f - f64::from(completed);
    let mut labels = Vec::with_capacity(days as usize);
    let mut ideal = Vec::with_capacity(days as usize);
    let mut actual = Vec::with_capacity(days as usize);
    for i in 0..days {
        labels.push(format!("Day {}", i + 1));
        // Linear ideal line; may dip slightly negative on the last day from
        // rounding, which is accepted rather than corrected.
        ideal.push(round1(total_f - daily_burn * (i + 1) as f64));
        let date = start + Duration::days(i);
        actual.push(if date <= today {
            Some(remaining_snapshot)
        } else {
            None
        });
    }

    Ok(BurndownSeries {
        labels,
        ideal,
        actual,
        sprint_name: sprint.name,
        total_tasks: total,
        completed_tasks: completed,
    })
}
