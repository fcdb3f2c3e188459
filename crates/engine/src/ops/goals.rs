//! Savings-goal operations.
//!
//! Besides creation and reads, goals expose two direct ledger moves:
//! `add_to_savings_goal` and `withdraw_from_savings_goal`. Adding re-evaluates
//! the milestone/achievement thresholds on every call.

use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, QueryFilter, TransactionTrait, prelude::*};
use serde_json::json;
use uuid::Uuid;

use crate::{
    EngineError, GoalStatus, NotificationKind, ResultEngine, SavingsGoal, savings_goals,
    util::normalize_required_name,
};

use super::{Engine, PendingNotification, with_tx};

impl Engine {
    /// Creates a savings goal for a user.
    pub async fn new_savings_goal(
        &self,
        name: &str,
        target_minor: i64,
        deadline: Option<DateTime<Utc>>,
        owner_id: &str,
    ) -> ResultEngine<SavingsGoal> {
        let name = normalize_required_name(name, "savings goal")?;

        with_tx!(self, |tx| {
            Self::resolve_user(&tx, owner_id).await?;

            let duplicate = savings_goals::Entity::find()
                .filter(savings_goals::Column::Owner.eq(owner_id))
                .filter(savings_goals::Column::Name.eq(name.clone()))
                .one(&tx)
                .await?;
            if duplicate.is_some() {
                return Err(EngineError::ExistingKey(name));
            }

            let goal = SavingsGoal::new(
                name,
                owner_id.to_string(),
                target_minor,
                deadline,
                Utc::now(),
            )?;
            savings_goals::ActiveModel::from(&goal).insert(&tx).await?;
            Ok(goal)
        })
    }

    /// Adds funds to a goal; flips it to completed at the target and
    /// triggers achievement/milestone notifications.
    pub async fn add_to_savings_goal(
        &self,
        goal_id: Uuid,
        amount_minor: i64,
        user_id: &str,
    ) -> ResultEngine<SavingsGoal> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }

        let (goal, pending) = with_tx!(self, |tx| {
            let mut goal = Self::find_savings_goal(&tx, goal_id).await?;
            if goal.owner != user_id {
                return Err(EngineError::NotFound(format!("savings goal {goal_id}")));
            }

            goal.add(amount_minor);
            Self::persist_goal_amounts(&tx, &goal).await?;

            let pending = goal_threshold_notification(&goal);
            Ok((goal, pending))
        })?;

        self.dispatch_notifications(pending).await;
        Ok(goal)
    }

    /// Withdraws funds from a goal, clamping at zero; a completed goal
    /// falling below target regresses to active.
    pub async fn withdraw_from_savings_goal(
        &self,
        goal_id: Uuid,
        amount_minor: i64,
        user_id: &str,
    ) -> ResultEngine<SavingsGoal> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }

        with_tx!(self, |tx| {
            let mut goal = Self::find_savings_goal(&tx, goal_id).await?;
            if goal.owner != user_id {
                return Err(EngineError::NotFound(format!("savings goal {goal_id}")));
            }

            goal.withdraw(amount_minor);
            Self::persist_goal_amounts(&tx, &goal).await?;
            Ok(goal)
        })
    }

    /// Returns a savings goal, visible to its owner only.
    pub async fn savings_goal(&self, goal_id: Uuid, user_id: &str) -> ResultEngine<SavingsGoal> {
        let goal = Self::find_savings_goal(&self.database, goal_id).await?;
        if goal.owner != user_id {
            return Err(EngineError::NotFound(format!("savings goal {goal_id}")));
        }
        Ok(goal)
    }

    /// Lists a user's savings goals.
    pub async fn savings_goals_for_user(&self, user_id: &str) -> ResultEngine<Vec<SavingsGoal>> {
        savings_goals::Entity::find()
            .filter(savings_goals::Column::Owner.eq(user_id))
            .all(&self.database)
            .await?
            .into_iter()
            .map(SavingsGoal::try_from)
            .collect()
    }

    pub(super) async fn find_savings_goal<C: ConnectionTrait>(
        conn: &C,
        goal_id: Uuid,
    ) -> ResultEngine<SavingsGoal> {
        savings_goals::Entity::find_by_id(goal_id.to_string())
            .one(conn)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("savings goal {goal_id}")))?
            .try_into()
    }
}

/// Re-evaluated on every add: achievement at the target, else the highest
/// crossed 25/50/75 milestone.
fn goal_threshold_notification(goal: &SavingsGoal) -> Vec<PendingNotification> {
    let percent_bp = goal.percent_funded_bp();
    let payload = |milestone: Option<i64>| {
        json!({
            "goal_id": goal.id,
            "goal_name": goal.name,
            "current_minor": goal.current_minor,
            "target_minor": goal.target_minor,
            "milestone_percent": milestone,
        })
    };

    if goal.status == GoalStatus::Completed && percent_bp >= 10_000 {
        vec![PendingNotification {
            user_id: goal.owner.clone(),
            kind: NotificationKind::SavingsGoalAchieved,
            payload: payload(None),
        }]
    } else if percent_bp >= 7_500 {
        vec![PendingNotification {
            user_id: goal.owner.clone(),
            kind: NotificationKind::SavingsGoalMilestone,
            payload: payload(Some(75)),
        }]
    } else if percent_bp >= 5_000 {
        vec![PendingNotification {
            user_id: goal.owner.clone(),
            kind: NotificationKind::SavingsGoalMilestone,
            payload: payload(Some(50)),
        }]
    } else if percent_bp >= 2_500 {
        vec![PendingNotification {
            user_id: goal.owner.clone(),
            kind: NotificationKind::SavingsGoalMilestone,
            payload: payload(Some(25)),
        }]
    } else {
        Vec::new()
    }
}
