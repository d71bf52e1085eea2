use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    InReview,
    Blocked,
    Done,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "TODO",
            Self::InProgress => "IN_PROGRESS",
            Self::InReview => "IN_REVIEW",
            Self::Blocked => "BLOCKED",
            Self::Done => "DONE",
        }
    }

    /// Case-sensitive token parse; unknown tokens are rejected, not coerced.
    pub fn parse_token(token: &str) -> Option<Self> {
        match token {
            "TODO" => Some(Self::Todo),
            "IN_PROGRESS" => Some(Self::InProgress),
            "IN_REVIEW" => Some(Self::InReview),
            "BLOCKED" => Some(Self::Blocked),
            "DONE" => Some(Self::Done),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    pub fn parse_token(token: &str) -> Option<Self> {
        match token {
            "LOW" => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            _ => None,
        }
    }

    /// Short code surfaced to dashboards: P1 = HIGH, P2 = MEDIUM, P3 = LOW.
    pub fn short_code(self) -> &'static str {
        match self {
            Self::High => "P1",
            Self::Medium => "P2",
            Self::Low => "P3",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteEntityKind {
    Task,
    Project,
    Sprint,
}

impl NoteEntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Project => "project",
            Self::Sprint => "sprint",
        }
    }

    pub fn parse_token(token: &str) -> Option<Self> {
        match token {
            "task" => Some(Self::Task),
            "project" => Some(Self::Project),
            "sprint" => Some(Self::Sprint),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sprint {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub velocity: Option<f64>,
    /// Free-form (future/active/completed by convention); tolerated as-is.
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    /// None marks a backlog task; excluded from sprint-scoped statistics.
    pub sprint_id: Option<i64>,
    pub title: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub estimate_hours: Option<f64>,
    pub due_date: Option<NaiveDate>,
    pub assigned_id: Option<i64>,
    pub created_by: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub content: String,
    pub entity_type: NoteEntityKind,
    pub entity_id: i64,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub detail: String,
    pub occurred_at: DateTime<Utc>,
}

// ─── Dashboard payloads ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub velocity: String,
    pub ai_risk_index: u32,
    pub tasks_remaining: u32,
    pub budget_forecast: String,
    pub unassigned_critical: u32,
    pub total_tasks: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalTask {
    pub id: i64,
    pub title: String,
    pub priority: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub time: String,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurndownSeries {
    pub labels: Vec<String>,
    pub ideal: Vec<f64>,
    pub actual: Vec<Option<f64>>,
    pub sprint_name: String,
    pub total_tasks: u32,
    pub completed_tasks: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressIndex {
    pub value: f64,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub text: String,
    pub risk: RiskLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectPhase {
    Planning,
    Active,
    Completed,
}

impl ProjectPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Planning => "PLANNING",
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardPayload {
    pub project: Project,
    pub status: ProjectPhase,
    pub stats: ProjectStats,
    pub critical_tasks: Vec<CriticalTask>,
    pub activities: Vec<ActivityEntry>,
    pub recommendations: Vec<Recommendation>,
    pub stress_index: f64,
    pub stress_detail: String,
}

// ─── Report payloads ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SprintInfo {
    pub sprint_id: i64,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub velocity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintMetrics {
    pub total_tasks: u32,
    pub completed_tasks: u32,
    pub in_progress_tasks: u32,
    pub blocked_tasks: u32,
    pub todo_tasks: u32,
    pub completion_rate: f64,
    pub total_estimated_hours: f64,
    pub completed_hours: f64,
    pub hours_completion_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskBreakdown {
    pub completed: Vec<Task>,
    pub in_progress: Vec<Task>,
    pub in_review: Vec<Task>,
    pub blocked: Vec<Task>,
    pub todo: Vec<Task>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SprintReport {
    pub sprint_info: SprintInfo,
    pub metrics: SprintMetrics,
    pub tasks: TaskBreakdown,
    pub generated_at: DateTime<Utc>,
    pub ai_summary_prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallMetrics {
    pub total_tasks: u32,
    pub completed_tasks: u32,
    pub overall_completion_rate: f64,
    pub average_sprint_velocity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectReport {
    pub project_id: i64,
    pub project_name: String,
    pub total_sprints: u32,
    pub sprints: Vec<SprintReport>,
    pub notes: Vec<Note>,
    pub overall_metrics: OverallMetrics,
    pub generated_at: DateTime<Utc>,
    pub ai_summary_prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizedSprint {
    pub report: SprintReport,
    pub summary: String,
}
