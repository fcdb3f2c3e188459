//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use engine::{Engine, NotificationKind, Notifier};
use migration::MigratorTrait;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

/// Captures every trigger so tests can assert on kinds and recipients.
/// With `fail` set, every call errors to exercise the fire-and-forget
/// contract.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<(String, NotificationKind, serde_json::Value)>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn events(&self) -> Vec<(String, NotificationKind, serde_json::Value)> {
        self.events.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.events()
            .into_iter()
            .map(|(_, kind, _)| kind)
            .collect()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        user_id: &str,
        kind: NotificationKind,
        payload: serde_json::Value,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.events
            .lock()
            .unwrap()
            .push((user_id.to_string(), kind, payload));
        if self.fail {
            return Err("notifier down".into());
        }
        Ok(())
    }
}

/// Fresh in-memory database with migrations applied and the users alice,
/// bob and carol seeded.
pub async fn engine_with_db() -> (Engine, Arc<RecordingNotifier>, DatabaseConnection) {
    engine_with_notifier(RecordingNotifier::default()).await
}

pub async fn engine_with_notifier(
    notifier: RecordingNotifier,
) -> (Engine, Arc<RecordingNotifier>, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();

    let backend = db.get_database_backend();
    for (id, username) in [("alice", "Alice"), ("bob", "Bob"), ("carol", "Carol")] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (id, username) VALUES (?, ?)",
            vec![id.into(), username.into()],
        ))
        .await
        .unwrap();
    }

    let notifier = Arc::new(notifier);
    let engine = Engine::builder()
        .database(db.clone())
        .notifier(notifier.clone())
        .build();
    (engine, notifier, db)
}

/// Row count of a table, for zero-side-effect assertions.
pub async fn count_rows(db: &DatabaseConnection, table: &str) -> i64 {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_string(
            backend,
            format!("SELECT COUNT(*) AS n FROM {table}"),
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "n").unwrap()
}
