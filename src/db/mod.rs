use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use crate::accessors::EntityAccessor;
use crate::errors::{EngineError, EngineResult};
use crate::models::{
    ActivityRecord, Note, NoteEntityKind, Project, Sprint, Task, TaskPriority, TaskStatus,
};

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// SQLite-backed `EntityAccessor`. The engine only ever sees the trait;
/// this adapter exists for integration tests and embedders without their
/// own store.
#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn new(path: &Path) -> EngineResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| EngineError::Io(err.to_string()))?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> EngineResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> EngineResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| EngineError::Internal("database mutex poisoned".to_string()))
    }

    pub fn insert_project(&self, project: &Project) -> EngineResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO projects (id, name, description, start_date, end_date, budget)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                project.id,
                project.name,
                project.description,
                project.start_date.map(|d| d.to_string()),
                project.end_date.map(|d| d.to_string()),
                project.budget,
            ],
        )?;
        Ok(())
    }

    pub fn insert_sprint(&self, sprint: &Sprint) -> EngineResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO sprints (id, project_id, name, start_date, end_date, velocity, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                sprint.id,
                sprint.project_id,
                sprint.name,
                sprint.start_date.map(|d| d.to_string()),
                sprint.end_date.map(|d| d.to_string()),
                sprint.velocity,
                sprint.status,
            ],
        )?;
        Ok(())
    }

    pub fn insert_task(&self, task: &Task) -> EngineResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO tasks (id, sprint_id, title, status, priority, estimate_hours, due_date, assigned_id, created_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                task.id,
                task.sprint_id,
                task.title,
                task.status.as_str(),
                task.priority.as_str(),
                task.estimate_hours,
                task.due_date.map(|d| d.to_string()),
                task.assigned_id,
                task.created_by,
            ],
        )?;
        Ok(())
    }

    pub fn insert_note(&self, note: &Note) -> EngineResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO notes (id, content, entity_type, entity_id, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                note.id,
                note.content,
                note.entity_type.as_str(),
                note.entity_id,
                note.created_by,
                note.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn insert_activity(&self, project_id: i64, record: &ActivityRecord) -> EngineResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO user_activity (project_id, detail, occurred_at) VALUES (?1, ?2, ?3)",
            params![project_id, record.detail, record.occurred_at.to_rfc3339()],
        )?;
        Ok(())
    }
}

impl EntityAccessor for Database {
    fn get_project(&self, project_id: i64) -> EngineResult<Option<Project>> {
        let conn = self.lock()?;
        let project = conn
            .query_row(
                "SELECT id, name, description, start_date, end_date, budget
                 FROM projects WHERE id = ?1",
                [project_id],
                parse_project_row,
            )
            .optional()?;
        Ok(project)
    }

    fn get_sprint(&self, sprint_id: i64) -> EngineResult<Option<Sprint>> {
        let conn = self.lock()?;
        let sprint = conn
            .query_row(
                "SELECT id, project_id, name, start_date, end_date, velocity, status
                 FROM sprints WHERE id = ?1",
                [sprint_id],
                parse_sprint_row,
            )
            .optional()?;
        Ok(sprint)
    }

    fn get_sprints_for_project(&self, project_id: i64) -> EngineResult<Vec<Sprint>> {
        let conn = self.lock()?;
        let mut statement = conn.prepare(
            "SELECT id, project_id, name, start_date, end_date, velocity, status
             FROM sprints WHERE project_id = ?1 ORDER BY id",
        )?;
        let rows = statement.query_map([project_id], parse_sprint_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn get_tasks_for_sprint(&self, sprint_id: i64) -> EngineResult<Vec<Task>> {
        let conn = self.lock()?;
        let mut statement = conn.prepare(
            "SELECT id, sprint_id, title, status, priority, estimate_hours, due_date, assigned_id, created_by
             FROM tasks WHERE sprint_id = ?1 ORDER BY id",
        )?;
        let rows = statement.query_map([sprint_id], parse_task_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn get_tasks_for_project(&self, project_id: i64) -> EngineResult<Vec<Task>> {
        let conn = self.lock()?;
        // Inner join keeps backlog tasks (NULL sprint_id) out of scope.
        let mut statement = conn.prepare(
            "SELECT t.id, t.sprint_id, t.title, t.status, t.priority, t.estimate_hours, t.due_date, t.assigned_id, t.created_by
             FROM tasks t JOIN sprints s ON t.sprint_id = s.id
             WHERE s.project_id = ?1 ORDER BY t.id",
        )?;
        let rows = statement.query_map([project_id], parse_task_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn get_notes_for_project(&self, project_id: i64) -> EngineResult<Vec<Note>> {
        let conn = self.lock()?;
        let mut statement = conn.prepare(
            "SELECT id, content, entity_type, entity_id, created_by, created_at
             FROM notes WHERE entity_type = 'project' AND entity_id = ?1
             ORDER BY created_at DESC",
        )?;
        let rows = statement.query_map([project_id], parse_note_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn get_recent_activity(
        &self,
        project_id: i64,
        limit: u32,
    ) -> EngineResult<Vec<ActivityRecord>> {
        let conn = self.lock()?;
        let mut statement = conn.prepare(
            "SELECT detail, occurred_at FROM user_activity
             WHERE project_id = ?1 ORDER BY occurred_at DESC LIMIT ?2",
        )?;
        let rows = statement.query_map(params![project_id, limit], |row| {
            Ok(ActivityRecord {
                detail: row.get(0)?,
                occurred_at: parse_time(&row.get::<_, String>(1)?)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

fn parse_project_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        start_date: parse_opt_date(row.get::<_, Option<String>>(3)?)?,
        end_date: parse_opt_date(row.get::<_, Option<String>>(4)?)?,
        budget: row.get(5)?,
    })
}

fn parse_sprint_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Sprint> {
    Ok(Sprint {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        start_date: parse_opt_date(row.get::<_, Option<String>>(3)?)?,
        end_date: parse_opt_date(row.get::<_, Option<String>>(4)?)?,
        velocity: row.get(5)?,
        status: row.get(6)?,
    })
}

fn parse_task_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        sprint_id: row.get(1)?,
        title: row.get(2)?,
        status: parse_status(&row.get::<_, String>(3)?)?,
        priority: parse_priority(&row.get::<_, String>(4)?)?,
        estimate_hours: row.get(5)?,
        due_date: parse_opt_date(row.get::<_, Option<String>>(6)?)?,
        assigned_id: row.get(7)?,
        created_by: row.get(8)?,
    })
}

fn parse_note_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get(0)?,
        content: row.get(1)?,
        entity_type: parse_entity_kind(&row.get::<_, String>(2)?)?,
        entity_id: row.get(3)?,
        created_by: row.get(4)?,
        created_at: parse_time(&row.get::<_, String>(5)?)?,
    })
}

fn conversion_failure(message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            message,
        )),
    )
}

fn parse_status(raw: &str) -> rusqlite::Result<TaskStatus> {
    TaskStatus::parse_token(raw)
        .ok_or_else(|| conversion_failure(format!("Unknown task status '{raw}'")))
}

fn parse_priority(raw: &str) -> rusqlite::Result<TaskPriority> {
    TaskPriority::parse_token(raw)
        .ok_or_else(|| conversion_failure(format!("Unknown task priority '{raw}'")))
}

fn parse_entity_kind(raw: &str) -> rusqlite::Result<NoteEntityKind> {
    NoteEntityKind::parse_token(raw)
        .ok_or_else(|| conversion_failure(format!("Unknown note entity type '{raw}'")))
}

fn parse_opt_date(raw: Option<String>) -> rusqlite::Result<Option<NaiveDate>> {
    raw.map(|value| {
        value
            .parse::<NaiveDate>()
            .map_err(|error| conversion_failure(error.to_string()))
    })
    .transpose()
}

fn parse_time(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|error| conversion_failure(error.to_string()))
}
