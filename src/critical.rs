use crate::accessors::EntityAccessor;
use crate::errors::EngineResult;
use crate::models::{CriticalTask, TaskPriority, TaskStatus};

pub const DEFAULT_CRITICAL_LIMIT: u32 = 10;

/// Unassigned HIGH/MEDIUM work that is not done, HIGH first, newest first
/// within a priority band, truncated to `limit`. Priorities surface as the
/// P1/P2 short codes.
pub fn critical_tasks(
    accessor: &dyn EntityAccessor,
    project_id: i64,
    limit: Option<u32>,
) -> EngineResult<Vec<CriticalTask>> {
    let limit = limit.unwrap_or(DEFAULT_CRITICAL_LIMIT) as usize;
    let mut candidates: Vec<_> = accessor
        .get_tasks_for_project(project_id)?
        .into_iter()
        .filter(|t| {
            matches!(t.priority, TaskPriority::High | TaskPriority::Medium)
                && t.assigned_id.is_none()
                && t.status != TaskStatus::Done
        })
        .collect();

    candidates.sort_by(|a, b| {
        priority_rank(a.priority)
            .cmp(&priority_rank(b.priority))
            .then(b.id.cmp(&a.id))
    });

    Ok(candidates
        .into_iter()
        .take(limit)
        .map(|t| CriticalTask {
            id: t.id,
            title: t.title,
            priority: t.priority.short_code().to_string(),
        })
        .collect())
}

fn priority_rank(priority: TaskPriority) -> u8 {
    match priority {
        TaskPriority::High => 0,
        TaskPriority::Medium => 1,
        TaskPriority::Low => 2,
    }
}
