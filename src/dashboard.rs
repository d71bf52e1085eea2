use chrono::{DateTime, Utc};

use crate::accessors::EntityAccessor;
use crate::activity::format_activity_feed;
use crate::advice::{recommendations, stress_index};
use crate::critical::critical_tasks;
use crate::errors::{EngineError, EngineResult};
use crate::models::{DashboardPayload, Project, ProjectPhase};
use crate::stats::project_stats;

const ACTIVITY_FEED_LIMIT: u32 = 10;

/// Where a project sits in its calendar lifecycle, judged against today.
pub fn project_phase(project: &Project, now: DateTime<Utc>) -> ProjectPhase {
    let today = now.date_naive();
    if project.end_date.is_some_and(|end| end < today) {
        ProjectPhase::Completed
    } else if project.start_date.is_some_and(|start| start > today) {
        ProjectPhase::Planning
    } else {
        ProjectPhase::Active
    }
}

/// Complete dashboard for one project: stats, critical tasks, activity
/// feed, recommendations, and stress index in a single payload. Either
/// fully populated or a NotFound/failure signal — never partial.
pub fn project_dashboard(
    accessor: &dyn EntityAccessor,
    project_id: i64,
    now: DateTime<Utc>,
) -> EngineResult<DashboardPayload> {
    let project = accessor
        .get_project(project_id)?
        .ok_or_else(|| EngineError::NotFound(format!("Project {project_id} not found")))?;

    let stats = project_stats(accessor, project_id)?;
    let critical = critical_tasks(accessor, project_id, None)?;
    let activity = accessor.get_recent_activity(project_id, ACTIVITY_FEED_LIMIT)?;
    let advice = recommendations(&stats, &critical);
    let stress = stress_index(&stats);

    Ok(DashboardPayload {
        status: project_phase(&project, now),
        project,
        stats,
        critical_tasks: critical,
        activities: format_activity_feed(&activity, now),
        recommendations: advice,
        stress_index: stress.value,
        stress_detail: stress.detail,
    })
}
