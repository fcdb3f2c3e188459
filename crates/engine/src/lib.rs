//! Ledger-linking and settlement core of a shared personal-finance tracker.
//!
//! The engine owns two tightly related state machines:
//!
//! - **Bill settlement**: a bill's total is split across participants by a
//!   [`SplitType`] policy; participants mark their share paid and the bill's
//!   status advances monotonically from pending to completed.
//! - **Expense allocation**: an expense is distributed across budgets and
//!   savings goals by a [`DistributionType`] policy; every applied share is
//!   recorded in a link row whose stored amount is reversed exactly when the
//!   link is removed or the expense deleted.
//!
//! Every multi-step write runs inside one database transaction: validation
//! and lookups happen before the first write, so an error anywhere leaves
//! zero side effects. Notification triggers are collected during the
//! transaction and dispatched fire-and-forget after commit.

pub use bill_participants::BillParticipant;
pub use bills::{Bill, BillStatus};
pub use budgets::Budget;
pub use commands::{
    BucketTarget, CreateBillCmd, CreateExpenseCmd, DistributionSpec, ParticipantShare,
    UpdateBillCmd, UpdateExpenseCmd,
};
pub use error::EngineError;
pub use expenses::Expense;
pub use money::MoneyCents;
pub use notify::{NotificationKind, Notifier, TracingNotifier};
pub use ops::{
    BillDetails, BillProgress, CategorySpending, DashboardSummary, Engine, EngineBuilder,
};
pub use savings_goals::{GoalStatus, SavingsGoal};
pub use split::{DistributionType, SplitType};

mod bill_participants;
mod bills;
mod budgets;
mod categories;
mod commands;
mod error;
mod expense_budget_links;
mod expense_goal_links;
mod expenses;
mod money;
mod notify;
mod ops;
mod savings_goals;
mod split;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
