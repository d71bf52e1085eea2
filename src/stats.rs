use crate::accessors::EntityAccessor;
use crate::errors::{EngineError, EngineResult};
use crate::models::{ProjectStats, TaskPriority, TaskStatus};

/// Per-project dashboard counters: `velocity`, `aiRiskIndex`,
/// `tasksRemaining`, `budgetForecast`, `unassignedCritical`, `totalTasks`.
/// Field names are a documented contract consumed by dashboards.
///
/// Backlog tasks never contribute; an empty task set short-circuits to the
/// zero payload with only the budget forecast derived from the project row.
pub fn project_stats(accessor: &dyn EntityAccessor, project_id: i64) -> EngineResult<ProjectStats> {
    let project = accessor
        .get_project(project_id)?
        .ok_or_else(|| EngineError::NotFound(format!("Project {project_id} not found")))?;
    let budget_forecast = format_currency(project.budget);

    let tasks = accessor.get_tasks_for_project(project_id)?;
    let total = tasks.len() as u32;
    if total == 0 {
        return Ok(ProjectStats {
            velocity: format_percent(0.0),
            ai_risk_index: 0,
            tasks_remaining: 0,
            budget_forecast,
            unassigned_critical: 0,
            total_tasks: 0,
        });
    }

    let completed = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Done)
        .count() as u32;
    let velocity = round1(f64::from(completed) / f64::from(total) * 100.0);

    let unassigned_critical = tasks
        .iter()
        .filter(|t| {
            t.priority == TaskPriority::High
                && t.assigned_id.is_none()
                && t.status != TaskStatus::Done
        })
        .count() as u32;

    let ai_risk_index = risk_index(unassigned_critical, velocity);

    tracing::debug!(
        project_id,
        total,
        completed,
        unassigned_critical,
        ai_risk_index,
        "computed project stats"
    );

    Ok(ProjectStats {
        velocity: format_percent(velocity),
        ai_risk_index,
        tasks_remaining: total - completed,
        budget_forecast,
        unassigned_critical,
        total_tasks: total,
    })
}

/// Fixed policy: 15 points per unassigned critical task plus the velocity
/// deficit, clamped to [0, 100]. Coefficients are a product decision copied
/// from observed behavior; do not tune without stakeholder sign-off.
fn risk_index(unassigned_critical: u32, velocity: f64) -> u32 {
    let raw = f64::from(unassigned_critical) * 15.0 + (100.0 - velocity).max(0.0);
    raw.round().min(100.0) as u32
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub(crate) fn format_percent(velocity: f64) -> String {
    format!("{velocity:.1}%")
}

/// `"$" + thousands-grouped whole units`; missing, zero, or malformed
/// budgets all collapse to `"$0"`.
pub(crate) fn format_currency(budget: Option<f64>) -> String {
    let amount = budget.filter(|b| b.is_finite() && *b > 0.0).unwrap_or(0.0);
    let whole = amount.round() as u64;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (offset, ch) in digits.chars().enumerate() {
        if offset > 0 && (digits.len() - offset) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("${grouped}")
}

#[cfg(test)]
mod tests {
    use super::{format_currency, project_stats, risk_index};
    use crate::accessors::fixtures::{project, sprint, task, MemoryAccessor};
    use crate::errors::EngineError;
    use crate::models::{TaskPriority, TaskStatus};

    fn accessor_with_tasks(tasks: Vec<crate::models::Task>) -> MemoryAccessor {
        MemoryAccessor {
            projects: vec![project(1, Some(50_000.0))],
            sprints: vec![sprint(10, 1)],
            tasks,
            ..MemoryAccessor::default()
        }
    }

    #[test]
    fn empty_scope_short_circuits_to_zero_payload() {
        let accessor = accessor_with_tasks(vec![]);
        let stats = project_stats(&accessor, 1).expect("stats");
        assert_eq!(stats.velocity, "0.0%");
        assert_eq!(stats.ai_risk_index, 0);
        assert_eq!(stats.tasks_remaining, 0);
        assert_eq!(stats.total_tasks, 0);
        assert_eq!(stats.budget_forecast, "$50,000");
    }

    #[test]
    fn documented_scenario_matches() {
        // 10 tasks, 6 DONE, 2 HIGH unassigned not-done.
        let mut tasks = Vec::new();
        for id in 1..=6 {
            tasks.push(task(id, Some(10), TaskStatus::Done, TaskPriority::Medium));
        }
        tasks.push(task(7, Some(10), TaskStatus::Todo, TaskPriority::High));
        tasks.push(task(8, Some(10), TaskStatus::InProgress, TaskPriority::High));
        tasks.push(task(9, Some(10), TaskStatus::Todo, TaskPriority::Low));
        tasks.push(task(10, Some(10), TaskStatus::InReview, TaskPriority::Low));

        let stats = project_stats(&accessor_with_tasks(tasks), 1).expect("stats");
        assert_eq!(stats.velocity, "60.0%");
        assert_eq!(stats.unassigned_critical, 2);
        assert_eq!(stats.ai_risk_index, 70);
        assert_eq!(stats.tasks_remaining, 4);
        assert_eq!(stats.budget_forecast, "$50,000");
    }

    #[test]
    fn backlog_tasks_are_excluded() {
        let mut tasks = vec![task(1, Some(10), TaskStatus::Done, TaskPriority::Low)];
        tasks.push(task(2, None, TaskStatus::Todo, TaskPriority::High));
        let stats = project_stats(&accessor_with_tasks(tasks), 1).expect("stats");
        assert_eq!(stats.total_tasks, 1);
        assert_eq!(stats.unassigned_critical, 0);
        assert_eq!(stats.velocity, "100.0%");
    }

    #[test]
    fn risk_index_is_clamped() {
        assert_eq!(risk_index(0, 100.0), 0);
        assert_eq!(risk_index(20, 0.0), 100);
        assert_eq!(risk_index(2, 62.5), 68); // 30 + 37.5 rounds to 68
    }

    #[test]
    fn missing_project_is_not_found() {
        let accessor = MemoryAccessor::default();
        let err = project_stats(&accessor, 99).expect_err("no project");
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[test]
    fn currency_grouping() {
        assert_eq!(format_currency(None), "$0");
        assert_eq!(format_currency(Some(0.0)), "$0");
        assert_eq!(format_currency(Some(-10.0)), "$0");
        assert_eq!(format_currency(Some(999.0)), "$999");
        assert_eq!(format_currency(Some(50_000.0)), "$50,000");
        assert_eq!(format_currency(Some(1_234_567.89)), "$1,234,568");
        assert_eq!(format_currency(Some(f64::NAN)), "$0");
    }
}
