//! Savings-goal buckets.
//!
//! A goal accumulates toward `target_minor`. Unlike a bill's status, a
//! goal's status may regress: adding funds flips it to `completed` at the
//! target, withdrawing below the target flips it back to `active`.
//!
//! From the expense perspective the verbs are inverted: linking an expense
//! *applies* a withdrawal ([`SavingsGoal::withdraw`]), unlinking *reverses*
//! it by adding the stored amount back ([`SavingsGoal::add`]).

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Active,
    Completed,
}

impl GoalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

impl TryFrom<&str> for GoalStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            other => Err(EngineError::Validation(format!(
                "invalid goal status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub id: Uuid,
    pub name: String,
    pub owner: String,
    pub target_minor: i64,
    pub current_minor: i64,
    pub status: GoalStatus,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl SavingsGoal {
    pub fn new(
        name: String,
        owner: String,
        target_minor: i64,
        deadline: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if target_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "target_minor must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            owner,
            target_minor,
            current_minor: 0,
            status: GoalStatus::Active,
            deadline,
            created_at,
        })
    }

    /// Adds funds; flips to `completed` on reaching the target.
    pub fn add(&mut self, amount_minor: i64) {
        self.current_minor += amount_minor;
        if self.current_minor >= self.target_minor {
            self.status = GoalStatus::Completed;
        }
    }

    /// Withdraws funds, clamping at zero; a completed goal falling below
    /// target regresses to `active`.
    pub fn withdraw(&mut self, amount_minor: i64) {
        self.current_minor = (self.current_minor - amount_minor).max(0);
        if self.status == GoalStatus::Completed && self.current_minor < self.target_minor {
            self.status = GoalStatus::Active;
        }
    }

    /// Funded fraction in basis points (10_000 = 100%).
    pub fn percent_funded_bp(&self) -> i64 {
        self.current_minor * 10_000 / self.target_minor
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "savings_goals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub owner: String,
    pub target_minor: i64,
    pub current_minor: i64,
    pub status: String,
    pub deadline: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::expense_goal_links::Entity")]
    Links,
}

impl Related<super::expense_goal_links::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Links.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&SavingsGoal> for ActiveModel {
    fn from(goal: &SavingsGoal) -> Self {
        Self {
            id: ActiveValue::Set(goal.id.to_string()),
            name: ActiveValue::Set(goal.name.clone()),
            owner: ActiveValue::Set(goal.owner.clone()),
            target_minor: ActiveValue::Set(goal.target_minor),
            current_minor: ActiveValue::Set(goal.current_minor),
            status: ActiveValue::Set(goal.status.as_str().to_string()),
            deadline: ActiveValue::Set(goal.deadline),
            created_at: ActiveValue::Set(goal.created_at),
        }
    }
}

impl TryFrom<Model> for SavingsGoal {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("savings goal".to_string()))?,
            name: model.name,
            owner: model.owner,
            target_minor: model.target_minor,
            current_minor: model.current_minor,
            status: GoalStatus::try_from(model.status.as_str())?,
            deadline: model.deadline,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(target_minor: i64) -> SavingsGoal {
        SavingsGoal::new("Vacation".to_string(), "alice".to_string(), target_minor, None, Utc::now())
            .unwrap()
    }

    #[test]
    fn add_flips_to_completed_at_target() {
        let mut g = goal(100_00);
        g.add(100_00);
        assert_eq!(g.status, GoalStatus::Completed);
        assert_eq!(g.current_minor, 100_00);
    }

    #[test]
    fn withdraw_below_target_regresses_to_active() {
        let mut g = goal(100_00);
        g.add(100_00);
        g.withdraw(30_00);
        assert_eq!(g.current_minor, 70_00);
        assert_eq!(g.status, GoalStatus::Active);
    }

    #[test]
    fn withdraw_clamps_at_zero() {
        let mut g = goal(100_00);
        g.add(20_00);
        g.withdraw(50_00);
        assert_eq!(g.current_minor, 0);
    }

    #[test]
    fn overfunded_goal_stays_completed_until_below_target() {
        let mut g = goal(100_00);
        g.add(150_00);
        g.withdraw(40_00);
        assert_eq!(g.status, GoalStatus::Completed);
        g.withdraw(20_00);
        assert_eq!(g.status, GoalStatus::Active);
    }
}
