//! Budget buckets.
//!
//! A budget is a passive accumulator: `spent_minor` moves only through
//! [`Budget::apply`] and [`Budget::reverse`], called by the allocation ops
//! inside the operation's transaction. Reversal clamps at zero, so the sum
//! of reversals can never drive the accumulator negative even when joint
//! claims (`equal_split`) pushed it past the expense total.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub name: String,
    pub owner: String,
    pub category_id: Option<Uuid>,
    pub total_minor: i64,
    pub spent_minor: i64,
    pub created_at: DateTime<Utc>,
}

impl Budget {
    pub fn new(
        name: String,
        owner: String,
        category_id: Option<Uuid>,
        total_minor: i64,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if total_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "total_minor must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            owner,
            category_id,
            total_minor,
            spent_minor: 0,
            created_at,
        })
    }

    /// Debits the budget with an allocated share.
    pub fn apply(&mut self, amount_minor: i64) {
        self.spent_minor += amount_minor;
    }

    /// Reverses a previously applied share, clamping at zero.
    pub fn reverse(&mut self, amount_minor: i64) {
        self.spent_minor = (self.spent_minor - amount_minor).max(0);
    }

    /// Spent fraction in basis points (10_000 = 100%).
    pub fn percent_spent_bp(&self) -> i64 {
        self.spent_minor * 10_000 / self.total_minor
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub owner: String,
    pub category_id: Option<String>,
    pub total_minor: i64,
    pub spent_minor: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::expense_budget_links::Entity")]
    Links,
}

impl Related<super::expense_budget_links::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Links.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Budget> for ActiveModel {
    fn from(budget: &Budget) -> Self {
        Self {
            id: ActiveValue::Set(budget.id.to_string()),
            name: ActiveValue::Set(budget.name.clone()),
            owner: ActiveValue::Set(budget.owner.clone()),
            category_id: ActiveValue::Set(budget.category_id.map(|id| id.to_string())),
            total_minor: ActiveValue::Set(budget.total_minor),
            spent_minor: ActiveValue::Set(budget.spent_minor),
            created_at: ActiveValue::Set(budget.created_at),
        }
    }
}

impl TryFrom<Model> for Budget {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("budget".to_string()))?,
            name: model.name,
            owner: model.owner,
            category_id: model
                .category_id
                .as_deref()
                .map(|raw| parse_uuid(raw, "category"))
                .transpose()?,
            total_minor: model.total_minor,
            spent_minor: model.spent_minor,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget(total_minor: i64) -> Budget {
        Budget::new("Groceries".to_string(), "alice".to_string(), None, total_minor, Utc::now())
            .unwrap()
    }

    #[test]
    fn apply_then_reverse_round_trips() {
        let mut b = budget(100_00);
        b.apply(50_00);
        assert_eq!(b.spent_minor, 50_00);
        b.reverse(50_00);
        assert_eq!(b.spent_minor, 0);
    }

    #[test]
    fn reverse_clamps_at_zero() {
        let mut b = budget(100_00);
        b.apply(20_00);
        b.reverse(50_00);
        assert_eq!(b.spent_minor, 0);
    }

    #[test]
    fn percent_spent_in_basis_points() {
        let mut b = budget(200_00);
        b.apply(170_00);
        assert_eq!(b.percent_spent_bp(), 8500);
        b.apply(30_00);
        assert_eq!(b.percent_spent_bp(), 10_000);
    }

    #[test]
    fn rejects_non_positive_total() {
        assert!(
            Budget::new("x".to_string(), "alice".to_string(), None, 0, Utc::now()).is_err()
        );
    }
}
