//! Project analytics and reporting engine: turns raw task/sprint/project
//! records into dashboard metrics, burndown projections, risk signals, and
//! structured report payloads.

mod accessors;
mod activity;
mod advice;
mod burndown;
mod critical;
mod dashboard;
mod db;
mod errors;
mod models;
mod report;
mod stats;

pub use accessors::{EntityAccessor, Summarizer};
pub use activity::{format_activity_feed, relative_label};
pub use advice::{recommendations, stress_index};
pub use burndown::sprint_burndown;
pub use critical::{critical_tasks, DEFAULT_CRITICAL_LIMIT};
pub use dashboard::{project_dashboard, project_phase};
pub use db::Database;
pub use errors::{EngineError, EngineResult};
pub use models::{
    ActivityEntry, ActivityRecord, BurndownSeries, CriticalTask, DashboardPayload, Note,
    NoteEntityKind, OverallMetrics, Project, ProjectPhase, ProjectReport, ProjectStats,
    Recommendation, RiskLevel, Sprint, SprintInfo, SprintMetrics, SprintReport, StressIndex,
    SummarizedSprint, Task, TaskBreakdown, TaskPriority, TaskStatus,
};
pub use report::{project_report, sprint_report, summarize_sprint};
pub use stats::project_stats;
