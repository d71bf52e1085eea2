use crate::models::{CriticalTask, ProjectStats, Recommendation, RiskLevel, StressIndex};
use crate::stats::round2;

/// Workload pressure as the remaining/total ratio, two decimals.
pub fn stress_index(stats: &ProjectStats) -> StressIndex {
    if stats.total_tasks == 0 {
        return StressIndex {
            value: 0.0,
            detail: "No tasks assigned yet.".to_string(),
        };
    }

    let stress = f64::from(stats.tasks_remaining) / f64::from(stats.total_tasks);
    let detail = if stress > 0.7 {
        "Team is highly loaded. Consider redistributing tasks."
    } else if stress > 0.4 {
        "Team has moderate workload."
    } else {
        "Team workload is manageable."
    };

    StressIndex {
        value: round2(stress),
        detail: detail.to_string(),
    }
}

/// Rule-based advisory entries. Rules fire independently, in fixed order;
/// only when none fires does the single "on track" entry appear.
pub fn recommendations(
    stats: &ProjectStats,
    _critical: &[CriticalTask],
) -> Vec<Recommendation> {
    let velocity = parse_velocity(&stats.velocity);
    let mut entries = Vec::new();

    if stats.unassigned_critical > 0 {
        entries.push(Recommendation {
            text: format!(
                "Assign {} unassigned critical task(s) to team members.",
                stats.unassigned_critical
            ),
            risk: RiskLevel::High,
        });
    }

    if velocity < 50.0 {
        entries.push(Recommendation {
            text: "Velocity is below 50%. Consider reviewing task estimates or adding resources."
                .to_string(),
            risk: RiskLevel::High,
        });
    } else if velocity < 75.0 {
        entries.push(Recommendation {
            text: "Velocity is moderate. Monitor progress closely.".to_string(),
            risk: RiskLevel::Medium,
        });
    }

    if stats.tasks_remaining > 20 {
        entries.push(Recommendation {
            text: format!(
                "{} tasks remaining. Consider prioritizing backlog.",
                stats.tasks_remaining
            ),
            risk: RiskLevel::Medium,
        });
    }

    if entries.is_empty() {
        entries.push(Recommendation {
            text: "Project is on track. No immediate actions required.".to_string(),
            risk: RiskLevel::Low,
        });
    }

    entries
}

/// The stats record carries velocity as the documented percentage string;
/// a malformed value degrades to 0 rather than erroring.
fn parse_velocity(velocity: &str) -> f64 {
    velocity
        .trim_end_matches('%')
        .parse::<f64>()
        .unwrap_or_else(|_| {
            tracing::warn!(velocity, "malformed velocity string, treating as 0");
            0.0
        })
}
