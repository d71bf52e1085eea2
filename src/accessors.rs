use crate::errors::EngineResult;
use crate::models::{ActivityRecord, Note, Project, Sprint, Task};

/// Read-only boundary over the entity store. The engine never talks to
/// storage directly; every component takes this trait plus plain ids.
///
/// A missing project/sprint surfaces as `Ok(None)` here; components turn
/// that into `EngineError::NotFound`. Accessor failures propagate unchanged.
pub trait EntityAccessor {
    fn get_project(&self, project_id: i64) -> EngineResult<Option<Project>>;
    fn get_sprint(&self, sprint_id: i64) -> EngineResult<Option<Sprint>>;
    fn get_sprints_for_project(&self, project_id: i64) -> EngineResult<Vec<Sprint>>;
    fn get_tasks_for_sprint(&self, sprint_id: i64) -> EngineResult<Vec<Task>>;
    /// Union of tasks across the project's sprints. Backlog tasks
    /// (no sprint assignment) are excluded.
    fn get_tasks_for_project(&self, project_id: i64) -> EngineResult<Vec<Task>>;
    fn get_notes_for_project(&self, project_id: i64) -> EngineResult<Vec<Note>>;
    fn get_recent_activity(&self, project_id: i64, limit: u32) -> EngineResult<Vec<ActivityRecord>>;
}

/// External summarization collaborator. The engine builds the prompt and
/// passes the response through verbatim; failures are request-level errors,
/// never retried here.
pub trait Summarizer {
    fn summarize(&self, prompt: &str) -> EngineResult<String>;
}
