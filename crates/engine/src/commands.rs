//! Command structs for engine operations.
//!
//! These types group parameters for write operations (bill creation/update,
//! expense creation/update), keeping call sites readable and avoiding long
//! argument lists.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{DistributionType, SplitType};

/// One named participant of a bill being created.
///
/// `percentage_bp` (basis points, `6000` = 60%) is consulted for
/// [`SplitType::Percentage`], `amount_minor` for [`SplitType::Manual`].
#[derive(Clone, Debug)]
pub struct ParticipantShare {
    pub user_id: String,
    pub percentage_bp: Option<i64>,
    pub amount_minor: Option<i64>,
}

impl ParticipantShare {
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            percentage_bp: None,
            amount_minor: None,
        }
    }

    #[must_use]
    pub fn percentage_bp(mut self, bp: i64) -> Self {
        self.percentage_bp = Some(bp);
        self
    }

    #[must_use]
    pub fn amount_minor(mut self, amount_minor: i64) -> Self {
        self.amount_minor = Some(amount_minor);
        self
    }
}

/// Create a bill with its participants.
#[derive(Clone, Debug)]
pub struct CreateBillCmd {
    pub name: String,
    pub total_minor: i64,
    pub split_type: SplitType,
    pub due_date: DateTime<Utc>,
    pub category_id: Uuid,
    pub note: Option<String>,
    pub participants: Vec<ParticipantShare>,
}

impl CreateBillCmd {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        total_minor: i64,
        split_type: SplitType,
        due_date: DateTime<Utc>,
        category_id: Uuid,
    ) -> Self {
        Self {
            name: name.into(),
            total_minor,
            split_type,
            due_date,
            category_id,
            note: None,
            participants: Vec::new(),
        }
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn participant(mut self, participant: ParticipantShare) -> Self {
        self.participants.push(participant);
        self
    }
}

/// Patch a bill's basic fields and, optionally, replace its participants.
///
/// Replacing participants does **not** recompute dues: retained users keep
/// their owed amount and paid state, newly added users start at zero owed.
#[derive(Clone, Debug, Default)]
pub struct UpdateBillCmd {
    pub name: Option<String>,
    pub total_minor: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,
    pub category_id: Option<Uuid>,
    pub note: Option<String>,
    pub participants: Option<Vec<String>>,
}

impl UpdateBillCmd {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn total_minor(mut self, total_minor: i64) -> Self {
        self.total_minor = Some(total_minor);
        self
    }

    #[must_use]
    pub fn due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn participants(mut self, user_ids: Vec<String>) -> Self {
        self.participants = Some(user_ids);
        self
    }
}

/// One targeted bucket of an expense distribution.
///
/// `amount_minor` is required per bucket only for
/// [`DistributionType::Manual`] with more than one bucket selected.
#[derive(Clone, Debug)]
pub struct BucketTarget {
    pub id: Uuid,
    pub amount_minor: Option<i64>,
}

impl BucketTarget {
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            amount_minor: None,
        }
    }

    #[must_use]
    pub fn amount_minor(mut self, amount_minor: i64) -> Self {
        self.amount_minor = Some(amount_minor);
        self
    }
}

/// A distribution policy plus the buckets it targets.
#[derive(Clone, Debug)]
pub struct DistributionSpec {
    pub distribution: DistributionType,
    pub targets: Vec<BucketTarget>,
}

impl DistributionSpec {
    #[must_use]
    pub fn new(distribution: DistributionType) -> Self {
        Self {
            distribution,
            targets: Vec::new(),
        }
    }

    #[must_use]
    pub fn target(mut self, target: BucketTarget) -> Self {
        self.targets.push(target);
        self
    }
}

/// Create an expense and allocate it across buckets.
#[derive(Clone, Debug)]
pub struct CreateExpenseCmd {
    pub amount_minor: i64,
    pub description: String,
    pub category_id: Option<Uuid>,
    pub occurred_at: DateTime<Utc>,
    pub budgets: Option<DistributionSpec>,
    pub savings_goals: Option<DistributionSpec>,
}

impl CreateExpenseCmd {
    #[must_use]
    pub fn new(
        amount_minor: i64,
        description: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            amount_minor,
            description: description.into(),
            category_id: None,
            occurred_at,
            budgets: None,
            savings_goals: None,
        }
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn budgets(mut self, spec: DistributionSpec) -> Self {
        self.budgets = Some(spec);
        self
    }

    #[must_use]
    pub fn savings_goals(mut self, spec: DistributionSpec) -> Self {
        self.savings_goals = Some(spec);
        self
    }
}

/// Patch an expense's scalar fields and/or add new bucket links.
///
/// Linking is idempotent against resubmission: targets that already carry a
/// link for this expense are skipped, only novel targets are applied.
#[derive(Clone, Debug, Default)]
pub struct UpdateExpenseCmd {
    pub amount_minor: Option<i64>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub budgets: Option<DistributionSpec>,
    pub savings_goals: Option<DistributionSpec>,
}

impl UpdateExpenseCmd {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn amount_minor(mut self, amount_minor: i64) -> Self {
        self.amount_minor = Some(amount_minor);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    #[must_use]
    pub fn budgets(mut self, spec: DistributionSpec) -> Self {
        self.budgets = Some(spec);
        self
    }

    #[must_use]
    pub fn savings_goals(mut self, spec: DistributionSpec) -> Self {
        self.savings_goals = Some(spec);
        self
    }
}
