use chrono::{DateTime, NaiveDate, Utc};
use std::fmt::Write as _;

use crate::accessors::{EntityAccessor, Summarizer};
use crate::errors::{EngineError, EngineResult};
use crate::models::{
    Note, OverallMetrics, ProjectReport, SprintInfo, SprintMetrics, SprintReport, SummarizedSprint,
    Task, TaskBreakdown, TaskStatus,
};
use crate::stats::round2;

const PROMPT_COMPLETED_LIMIT: usize = 20;
const PROMPT_BLOCKED_LIMIT: usize = 10;
const PROMPT_NOTES_LIMIT: usize = 10;
const PROMPT_NOTE_PREVIEW_CHARS: usize = 200;

/// Full history of one sprint: metrics, tasks grouped by status, and the
/// prompt handed to the external summarizer. `generated_at` stamps the
/// moment of generation, not of the underlying data.
pub fn sprint_report(
    accessor: &dyn EntityAccessor,
    sprint_id: i64,
    generated_at: DateTime<Utc>,
) -> EngineResult<SprintReport> {
    let sprint = accessor
        .get_sprint(sprint_id)?
        .ok_or_else(|| EngineError::NotFound(format!("Sprint {sprint_id} not found")))?;
    let tasks = accessor.get_tasks_for_sprint(sprint_id)?;

    let metrics = sprint_metrics(&tasks);
    let breakdown = group_by_status(tasks);
    let ai_summary_prompt = sprint_prompt(
        &sprint.name,
        sprint.start_date,
        sprint.end_date,
        &metrics,
        &breakdown,
    );

    Ok(SprintReport {
        sprint_info: SprintInfo {
            sprint_id: sprint.id,
            name: sprint.name,
            start_date: sprint.start_date,
            end_date: sprint.end_date,
            velocity: sprint.velocity,
        },
        metrics,
        tasks: breakdown,
        generated_at,
        ai_summary_prompt,
    })
}

/// Project mode: per-sprint reports, project-level notes, and overall
/// metrics including the mean of per-sprint completion rates.
pub fn project_report(
    accessor: &dyn EntityAccessor,
    project_id: i64,
    generated_at: DateTime<Utc>,
) -> EngineResult<ProjectReport> {
    let project = accessor
        .get_project(project_id)?
        .ok_or_else(|| EngineError::NotFound(format!("Project {project_id} not found")))?;
    let sprints = accessor.get_sprints_for_project(project_id)?;
    let notes = accessor.get_notes_for_project(project_id)?;

    let mut reports = Vec::with_capacity(sprints.len());
    for sprint in &sprints {
        reports.push(sprint_report(accessor, sprint.id, generated_at)?);
    }

    let total_tasks: u32 = reports.iter().map(|r| r.metrics.total_tasks).sum();
    let completed_tasks: u32 = reports.iter().map(|r| r.metrics.completed_tasks).sum();
    let overall_completion_rate = if total_tasks > 0 {
        round2(f64::from(completed_tasks) / f64::from(total_tasks) * 100.0)
    } else {
        0.0
    };
    let average_sprint_velocity = if reports.is_empty() {
        0.0
    } else {
        round2(
            reports.iter().map(|r| r.metrics.completion_rate).sum::<f64>() / reports.len() as f64,
        )
    };

    let overall_metrics = OverallMetrics {
        total_tasks,
        completed_tasks,
        overall_completion_rate,
        average_sprint_velocity,
    };
    let ai_summary_prompt = project_prompt(&project.name, &reports, &overall_metrics, &notes);

    tracing::debug!(
        project_id,
        sprints = reports.len(),
        total_tasks,
        completed_tasks,
        "compiled project report"
    );

    Ok(ProjectReport {
        project_id: project.id,
        project_name: project.name,
        total_sprints: reports.len() as u32,
        sprints: reports,
        notes,
        overall_metrics,
        generated_at,
        ai_summary_prompt,
    })
}

/// Builds the sprint report, hands the prompt to the summarizer, and passes
/// its response through unmodified. Summarizer failures propagate as-is.
pub fn summarize_sprint(
    accessor: &dyn EntityAccessor,
    summarizer: &dyn Summarizer,
    sprint_id: i64,
    generated_at: DateTime<Utc>,
) -> EngineResult<SummarizedSprint> {
    let report = sprint_report(accessor, sprint_id, generated_at)?;
    let summary = summarizer.summarize(&report.ai_summary_prompt)?;
    Ok(SummarizedSprint { report, summary })
}

pub(crate) fn sprint_metrics(tasks: &[Task]) -> SprintMetrics {
    let count_status = |status: TaskStatus| tasks.iter().filter(|t| t.status == status).count() as u32;

    let total_tasks = tasks.len() as u32;
    let completed_tasks = count_status(TaskStatus::Done);
    let completion_rate = if total_tasks > 0 {
        round2(f64::from(completed_tasks) / f64::from(total_tasks) * 100.0)
    } else {
        0.0
    };

    let hours = |t: &Task| t.estimate_hours.filter(|h| h.is_finite() && *h >= 0.0).unwrap_or(0.0);
    let total_estimated_hours: f64 = tasks.iter().map(hours).sum();
    let completed_hours: f64 = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Done)
        .map(hours)
        .sum();
    let hours_completion_rate = if total_estimated_hours > 0.0 {
        round2(completed_hours / total_estimated_hours * 100.0)
    } else {
        0.0
    };

    SprintMetrics {
        total_tasks,
        completed_tasks,
        in_progress_tasks: count_status(TaskStatus::InProgress),
        blocked_tasks: count_status(TaskStatus::Blocked),
        todo_tasks: count_status(TaskStatus::Todo),
        completion_rate,
        total_estimated_hours,
        completed_hours,
        hours_completion_rate,
    }
}

fn group_by_status(tasks: Vec<Task>) -> TaskBreakdown {
    let mut breakdown = TaskBreakdown {
        completed: Vec::new(),
        in_progress: Vec::new(),
        in_review: Vec::new(),
        blocked: Vec::new(),
        todo: Vec::new(),
    };
    for task in tasks {
        match task.status {
            TaskStatus::Done => breakdown.completed.push(task),
            TaskStatus::InProgress => breakdown.in_progress.push(task),
            TaskStatus::InReview => breakdown.in_review.push(task),
            TaskStatus::Blocked => breakdown.blocked.push(task),
            TaskStatus::Todo => breakdown.todo.push(task),
        }
    }
    breakdown
}

fn display_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "unknown".to_string(), |d| d.to_string())
}

fn task_bullet(task: &Task) -> String {
    format!(
        "- {} (Priority: {}, {}h)",
        task.title,
        task.priority.as_str(),
        task.estimate_hours.unwrap_or(0.0)
    )
}

fn push_task_list(out: &mut String, heading: &str, tasks: &[Task], limit: usize, empty: &str) {
    let _ = writeln!(out, "{heading}:");
    if tasks.is_empty() {
        let _ = writeln!(out, "{empty}");
    } else {
        for task in tasks.iter().take(limit) {
            let _ = writeln!(out, "{}", task_bullet(task));
        }
    }
    out.push('\n');
}

fn push_required_sections(out: &mut String, scope: &str) {
    let _ = writeln!(
        out,
        "Please generate a comprehensive {scope} summary document that includes:"
    );
    let sections = [
        "Executive Summary (2-3 sentences)",
        "Key Accomplishments (bullet points)",
        "Technical Analysis (what was built or improved)",
        "Blockers & Risks",
        "Insights",
        "Recommendations",
        "Next Steps",
    ];
    for (index, section) in sections.iter().enumerate() {
        let _ = writeln!(out, "{}. {section}", index + 1);
    }
    out.push('\n');
    let _ = writeln!(out, "Format the response in Markdown for easy readability.");
}

/// Deterministic prompt text for the external summarizer; no model call
/// happens here.
fn sprint_prompt(
    name: &str,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    metrics: &SprintMetrics,
    breakdown: &TaskBreakdown,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "You are a technical project manager creating a sprint retrospective document."
    );
    out.push('\n');
    let _ = writeln!(out, "Sprint: {name}");
    let _ = writeln!(
        out,
        "Duration: {} to {}",
        display_date(start_date),
        display_date(end_date)
    );
    let _ = writeln!(out, "Total Tasks: {}", metrics.total_tasks);
    let _ = writeln!(out, "Completed Tasks: {}", metrics.completed_tasks);
    let _ = writeln!(out, "Completion Rate: {}%", metrics.completion_rate);
    let _ = writeln!(
        out,
        "Estimated Hours: {} total, {} completed",
        metrics.total_estimated_hours, metrics.completed_hours
    );
    out.push('\n');

    push_task_list(
        &mut out,
        "Completed Work",
        &breakdown.completed,
        PROMPT_COMPLETED_LIMIT,
        "No tasks completed",
    );
    push_task_list(
        &mut out,
        "Blocked Items",
        &breakdown.blocked,
        PROMPT_BLOCKED_LIMIT,
        "No blocked tasks",
    );
    push_required_sections(&mut out, "sprint");
    out
}

fn project_prompt(
    project_name: &str,
    reports: &[SprintReport],
    overall: &OverallMetrics,
    notes: &[Note],
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "You are a technical project manager creating a project status report."
    );
    out.push('\n');
    let _ = writeln!(out, "Project: {project_name}");
    let _ = writeln!(out, "Sprints: {}", reports.len());
    let _ = writeln!(out, "Total Tasks: {}", overall.total_tasks);
    let _ = writeln!(out, "Completed Tasks: {}", overall.completed_tasks);
    let _ = writeln!(
        out,
        "Overall Completion Rate: {}%",
        overall.overall_completion_rate
    );
    let _ = writeln!(
        out,
        "Average Sprint Velocity: {}%",
        overall.average_sprint_velocity
    );
    out.push('\n');

    let completed: Vec<Task> = reports
        .iter()
        .flat_map(|r| r.tasks.completed.iter().cloned())
        .collect();
    let blocked: Vec<Task> = reports
        .iter()
        .flat_map(|r| r.tasks.blocked.iter().cloned())
        .collect();
    push_task_list(
        &mut out,
        "Completed Work",
        &completed,
        PROMPT_COMPLETED_LIMIT,
        "No tasks completed",
    );
    push_task_list(
        &mut out,
        "Blocked Items",
        &blocked,
        PROMPT_BLOCKED_LIMIT,
        "No blocked tasks",
    );

    let _ = writeln!(out, "Project Notes:");
    if notes.is_empty() {
        let _ = writeln!(out, "No notes recorded");
    } else {
        for note in notes.iter().take(PROMPT_NOTES_LIMIT) {
            let _ = writeln!(out, "- {}", note_preview(&note.content));
        }
    }
    out.push('\n');

    push_required_sections(&mut out, "project");
    out
}

/// Notes embed truncated in the prompt; the structured payload keeps the
/// full text.
fn note_preview(content: &str) -> String {
    if content.chars().count() <= PROMPT_NOTE_PREVIEW_CHARS {
        return content.to_string();
    }
    let truncated: String = content.chars().take(PROMPT_NOTE_PREVIEW_CHARS).collect();
    format!("{truncated}...")
}
