use std::sync::Arc;

use sea_orm::{ConnectionTrait, DatabaseConnection, prelude::*};

use crate::{EngineError, NotificationKind, Notifier, ResultEngine, TracingNotifier, users};

mod analytics;
mod bills;
mod budgets;
mod categories;
mod expenses;
mod goals;

pub use analytics::{BillProgress, CategorySpending, DashboardSummary};
pub use bills::BillDetails;

/// Run a block inside a DB transaction, committing on success and rolling
/// back on error (the transaction rolls back on drop, including on early
/// `?` returns inside the block).
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result: $crate::ResultEngine<_> = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// A notification trigger collected during a transaction, dispatched only
/// after the transaction committed.
#[derive(Clone, Debug)]
pub(crate) struct PendingNotification {
    pub(crate) user_id: String,
    pub(crate) kind: NotificationKind,
    pub(crate) payload: serde_json::Value,
}

/// The settlement and allocation engine.
///
/// All operations are methods on this struct; each takes the authenticated
/// caller's `user_id` and trusts it.
pub struct Engine {
    database: DatabaseConnection,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").finish_non_exhaustive()
    }
}

impl Engine {
    /// Return a builder for `Engine`.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Fire-and-forget dispatch of collected triggers. Failures are logged
    /// and swallowed; the committed ledger mutation is never affected.
    pub(crate) async fn dispatch_notifications(&self, pending: Vec<PendingNotification>) {
        for notification in pending {
            if let Err(err) = self
                .notifier
                .notify(
                    &notification.user_id,
                    notification.kind,
                    notification.payload,
                )
                .await
            {
                tracing::warn!(
                    user_id = %notification.user_id,
                    kind = notification.kind.as_str(),
                    "notification trigger failed: {err}"
                );
            }
        }
    }

    /// Look up a user row, mapping a miss to `NotFound`.
    pub(crate) async fn resolve_user<C: ConnectionTrait>(
        conn: &C,
        user_id: &str,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(conn)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("user {user_id}")))
    }
}

/// The builder for `Engine`.
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    notifier: Option<Arc<dyn Notifier>>,
}

impl EngineBuilder {
    /// Pass the required database.
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override the notification collaborator (defaults to
    /// [`TracingNotifier`]).
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> EngineBuilder {
        self.notifier = Some(notifier);
        self
    }

    /// Construct `Engine`.
    pub fn build(self) -> Engine {
        Engine {
            database: self.database,
            notifier: self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier)),
        }
    }
}
