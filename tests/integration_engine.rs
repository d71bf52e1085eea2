use chrono::{Duration, Utc};
use projectpulse::{
    critical_tasks, project_dashboard, project_report, sprint_burndown, summarize_sprint,
    ActivityRecord, Database, EngineError, EngineResult, Note, NoteEntityKind, Project,
    ProjectPhase, RiskLevel, Sprint, Summarizer, Task, TaskPriority, TaskStatus,
};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

struct CannedSummarizer;

impl Summarizer for CannedSummarizer {
    fn summarize(&self, prompt: &str) -> EngineResult<String> {
        assert!(prompt.contains("Sprint: Sprint 1"));
        Ok("Sprint went fine.".to_string())
    }
}

fn task(id: i64, sprint_id: Option<i64>, status: TaskStatus, priority: TaskPriority) -> Task {
    Task {
        id,
        sprint_id,
        title: format!("Task {id}"),
        status,
        priority,
        estimate_hours: Some(3.0),
        due_date: None,
        assigned_id: None,
        created_by: 1,
    }
}

fn seed(db: &Database) {
    let today = Utc::now().date_naive();
    db.insert_project(&Project {
        id: 1,
        name: "Atlas".to_string(),
        description: None,
        start_date: Some(today - Duration::days(10)),
        end_date: None,
        budget: Some(50_000.0),
    })
    .expect("insert project");
    db.insert_sprint(&Sprint {
        id: 1,
        project_id: 1,
        name: "Sprint 1".to_string(),
        start_date: Some(today - Duration::days(2)),
        end_date: Some(today + Duration::days(2)),
        velocity: None,
        status: "active".to_string(),
    })
    .expect("insert sprint");

    for id in 1..=6 {
        db.insert_task(&task(id, Some(1), TaskStatus::Done, TaskPriority::Medium))
            .expect("insert task");
    }
    db.insert_task(&task(7, Some(1), TaskStatus::Todo, TaskPriority::High))
        .expect("insert task");
    db.insert_task(&task(8, Some(1), TaskStatus::Blocked, TaskPriority::High))
        .expect("insert task");
    db.insert_task(&task(9, Some(1), TaskStatus::InProgress, TaskPriority::Low))
        .expect("insert task");
    db.insert_task(&task(10, Some(1), TaskStatus::InReview, TaskPriority::Low))
        .expect("insert task");
    // Backlog task stays out of every sprint-scoped number.
    db.insert_task(&task(11, None, TaskStatus::Todo, TaskPriority::High))
        .expect("insert backlog task");

    db.insert_note(&Note {
        id: 1,
        content: "Kickoff complete; schema migration pending.".to_string(),
        entity_type: NoteEntityKind::Project,
        entity_id: 1,
        created_by: 1,
        created_at: Utc::now(),
    })
    .expect("insert note");
    db.insert_activity(
        1,
        &ActivityRecord {
            detail: "moved Task 7 to sprint".to_string(),
            occurred_at: Utc::now() - Duration::hours(3),
        },
    )
    .expect("insert activity");
}

#[test]
fn dashboard_end_to_end_over_sqlite() {
    init_logging();
    let db = Database::open_in_memory().expect("open db");
    seed(&db);
    let now = Utc::now();

    let dashboard = project_dashboard(&db, 1, now).expect("dashboard");
    assert_eq!(dashboard.status, ProjectPhase::Active);
    assert_eq!(dashboard.stats.total_tasks, 10);
    assert_eq!(dashboard.stats.velocity, "60.0%");
    assert_eq!(dashboard.stats.unassigned_critical, 2);
    assert_eq!(dashboard.stats.ai_risk_index, 70);
    assert_eq!(dashboard.stats.budget_forecast, "$50,000");
    assert_eq!(dashboard.stress_index, 0.4);
    assert_eq!(dashboard.activities.len(), 1);
    assert_eq!(dashboard.activities[0].time, "3 hours ago");
    assert!(dashboard
        .recommendations
        .iter()
        .any(|r| r.risk == RiskLevel::High));

    // The payload serializes with the documented field names.
    let json = serde_json::to_value(&dashboard).expect("serialize");
    assert_eq!(json["stats"]["aiRiskIndex"], 70);
    assert_eq!(json["stressIndex"], 0.4);
    assert!(json["criticalTasks"].is_array());
}

#[test]
fn critical_selection_end_to_end() {
    let db = Database::open_in_memory().expect("open db");
    seed(&db);
    let selected = critical_tasks(&db, 1, None).expect("selection");
    // Tasks 8 and 7 (HIGH, unassigned, not done), newest first.
    let ids: Vec<i64> = selected.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![8, 7]);
    assert!(selected.iter().all(|t| t.priority == "P1"));
}

#[test]
fn burndown_end_to_end() {
    let db = Database::open_in_memory().expect("open db");
    seed(&db);
    let today = Utc::now().date_naive();

    let series = sprint_burndown(&db, 1, today).expect("series");
    assert_eq!(series.labels.len(), 5);
    assert_eq!(series.ideal.len(), 5);
    assert_eq!(series.total_tasks, 10);
    assert_eq!(series.completed_tasks, 6);
    // Today is day 3 of 5: three snapshots, two nulls.
    assert_eq!(
        series.actual,
        vec![Some(4.0), Some(4.0), Some(4.0), None, None]
    );
    assert_eq!(series.ideal[0], 8.0);
    assert_eq!(series.ideal[4], 0.0);
}

#[test]
fn project_report_and_summary_end_to_end() {
    let db = Database::open_in_memory().expect("open db");
    seed(&db);
    let now = Utc::now();

    let report = project_report(&db, 1, now).expect("report");
    assert_eq!(report.project_name, "Atlas");
    assert_eq!(report.total_sprints, 1);
    assert_eq!(report.overall_metrics.total_tasks, 10);
    assert_eq!(report.overall_metrics.overall_completion_rate, 60.0);
    assert_eq!(report.overall_metrics.average_sprint_velocity, 60.0);
    assert_eq!(report.sprints[0].metrics.blocked_tasks, 1);
    assert_eq!(report.notes.len(), 1);
    assert!(report.ai_summary_prompt.contains("Project: Atlas"));
    assert!(report
        .ai_summary_prompt
        .contains("Kickoff complete; schema migration pending."));

    let summarized = summarize_sprint(&db, &CannedSummarizer, 1, now).expect("summary");
    assert_eq!(summarized.summary, "Sprint went fine.");
    assert_eq!(summarized.report.metrics.completion_rate, 60.0);
}

#[test]
fn missing_ids_surface_not_found() {
    let db = Database::open_in_memory().expect("open db");
    seed(&db);
    let now = Utc::now();

    assert!(matches!(
        project_dashboard(&db, 99, now),
        Err(EngineError::NotFound(_))
    ));
    assert!(matches!(
        sprint_burndown(&db, 99, now.date_naive()),
        Err(EngineError::NotFound(_))
    ));
    assert!(matches!(
        project_report(&db, 99, now),
        Err(EngineError::NotFound(_))
    ));
}

#[test]
fn file_backed_database_persists_between_opens() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("analytics.sqlite3");
    {
        let db = Database::new(&path).expect("create db");
        seed(&db);
    }
    let db = Database::new(&path).expect("reopen db");
    let dashboard = project_dashboard(&db, 1, Utc::now()).expect("dashboard");
    assert_eq!(dashboard.stats.total_tasks, 10);
}
