//! Notification trigger contract.
//!
//! The engine only *triggers* notifications; delivery belongs to a
//! collaborator behind the [`Notifier`] trait. Triggers are fire-and-forget:
//! the ops layer dispatches them after the database transaction committed,
//! logs failures and never propagates them, so a broken notifier can never
//! roll back or block a ledger mutation.
//!
//! Thresholds are re-evaluated on every apply, not edge-triggered; crossing
//! the same budget threshold twice notifies twice.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The kinds of notification the engine can trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Every participant of a bill has paid.
    BillPaid,
    /// At least one, but not all, participants of a bill have paid.
    BillPartiallyPaid,
    /// A budget reached 85% of its total.
    BudgetAlert,
    /// A budget reached or passed 100% of its total.
    BudgetExceeded,
    /// A savings goal reached its target.
    SavingsGoalAchieved,
    /// A savings goal crossed a 25/50/75% milestone.
    SavingsGoalMilestone,
    /// A participant was asked to settle their share.
    PaymentRequest,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BillPaid => "bill_paid",
            Self::BillPartiallyPaid => "bill_partially_paid",
            Self::BudgetAlert => "budget_alert",
            Self::BudgetExceeded => "budget_exceeded",
            Self::SavingsGoalAchieved => "savings_goal_achieved",
            Self::SavingsGoalMilestone => "savings_goal_milestone",
            Self::PaymentRequest => "payment_request",
        }
    }
}

/// Delivery collaborator for notification triggers.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        user_id: &str,
        kind: NotificationKind,
        payload: serde_json::Value,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Default [`Notifier`] that logs every trigger through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(
        &self,
        user_id: &str,
        kind: NotificationKind,
        payload: serde_json::Value,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::info!(user_id, kind = kind.as_str(), %payload, "notification trigger");
        Ok(())
    }
}
