//! Expense allocation operations.
//!
//! Creating an expense applies a share to every targeted bucket and writes
//! one link row per application; the stored link amount is the exact value
//! reversed on unlink or delete. All validation and bucket lookups run
//! before the first write, so a missing bucket in the middle of a
//! multi-bucket request aborts with zero side effects.

use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    Budget, CreateExpenseCmd, DistributionType, EngineError, Expense, NotificationKind,
    ResultEngine, SavingsGoal, UpdateExpenseCmd, commands::DistributionSpec,
    expense_budget_links, expense_goal_links, expenses, split,
    util::normalize_required_name,
};

use super::{Engine, PendingNotification, with_tx};

/// A resolved bucket paired with the share it is about to receive.
struct BudgetApply {
    budget: Budget,
    share_minor: i64,
}

struct GoalApply {
    goal: SavingsGoal,
    share_minor: i64,
}

impl Engine {
    /// Persists an expense and applies its budget/goal distributions.
    pub async fn create_expense(
        &self,
        cmd: CreateExpenseCmd,
        user_id: &str,
    ) -> ResultEngine<Expense> {
        let description = normalize_required_name(&cmd.description, "expense")?;

        let (expense, pending) = with_tx!(self, |tx| {
            Self::resolve_user(&tx, user_id).await?;
            if let Some(category_id) = cmd.category_id {
                Self::resolve_category(&tx, category_id).await?;
            }

            let expense = Expense::new(
                cmd.amount_minor,
                description,
                cmd.category_id,
                cmd.occurred_at,
                user_id.to_string(),
                Utc::now(),
            )?;

            let budget_plan = Self::plan_budget_distribution(
                &tx,
                cmd.budgets.as_ref(),
                expense.amount_minor,
                user_id,
            )
            .await?;
            let goal_plan = Self::plan_goal_distribution(
                &tx,
                cmd.savings_goals.as_ref(),
                expense.amount_minor,
                user_id,
            )
            .await?;

            expenses::ActiveModel::from(&expense).insert(&tx).await?;

            let mut pending = Vec::new();
            for apply in budget_plan {
                Self::apply_budget_link(&tx, expense.id, apply, &mut pending).await?;
            }
            for apply in goal_plan {
                Self::apply_goal_link(&tx, expense.id, apply).await?;
            }

            Ok((expense, pending))
        })?;

        self.dispatch_notifications(pending).await;
        Ok(expense)
    }

    /// Patches scalar fields and applies links for targets not already
    /// present; resubmitted targets are skipped. Owner-only.
    pub async fn update_expense(
        &self,
        expense_id: Uuid,
        cmd: UpdateExpenseCmd,
        user_id: &str,
    ) -> ResultEngine<Expense> {
        let (expense, pending) = with_tx!(self, |tx| {
            let model = Self::find_expense(&tx, expense_id).await?;
            if model.created_by != user_id {
                return Err(EngineError::Forbidden(
                    "only the expense owner can update it".to_string(),
                ));
            }

            let mut active = expenses::ActiveModel {
                id: ActiveValue::Set(model.id.clone()),
                ..Default::default()
            };
            let mut dirty = false;
            if let Some(amount_minor) = cmd.amount_minor {
                if amount_minor <= 0 {
                    return Err(EngineError::InvalidAmount(
                        "amount_minor must be > 0".to_string(),
                    ));
                }
                active.amount_minor = ActiveValue::Set(amount_minor);
                dirty = true;
            }
            if let Some(description) = cmd.description.as_deref() {
                active.description =
                    ActiveValue::Set(normalize_required_name(description, "expense")?);
                dirty = true;
            }
            if let Some(category_id) = cmd.category_id {
                Self::resolve_category(&tx, category_id).await?;
                active.category_id = ActiveValue::Set(Some(category_id.to_string()));
                dirty = true;
            }
            if let Some(occurred_at) = cmd.occurred_at {
                active.occurred_at = ActiveValue::Set(occurred_at);
                dirty = true;
            }
            if dirty {
                active.update(&tx).await?;
            }

            let amount_minor = cmd.amount_minor.unwrap_or(model.amount_minor);
            let mut pending = Vec::new();

            if let Some(spec) = cmd.budgets.as_ref() {
                let linked: Vec<String> = expense_budget_links::Entity::find()
                    .filter(expense_budget_links::Column::ExpenseId.eq(model.id.clone()))
                    .all(&tx)
                    .await?
                    .into_iter()
                    .map(|link| link.budget_id)
                    .collect();
                let plan =
                    Self::plan_budget_distribution(&tx, Some(spec), amount_minor, user_id).await?;
                for apply in plan {
                    if linked.contains(&apply.budget.id.to_string()) {
                        continue;
                    }
                    Self::apply_budget_link(&tx, expense_id, apply, &mut pending).await?;
                }
            }
            if let Some(spec) = cmd.savings_goals.as_ref() {
                let linked: Vec<String> = expense_goal_links::Entity::find()
                    .filter(expense_goal_links::Column::ExpenseId.eq(model.id.clone()))
                    .all(&tx)
                    .await?
                    .into_iter()
                    .map(|link| link.savings_goal_id)
                    .collect();
                let plan =
                    Self::plan_goal_distribution(&tx, Some(spec), amount_minor, user_id).await?;
                for apply in plan {
                    if linked.contains(&apply.goal.id.to_string()) {
                        continue;
                    }
                    Self::apply_goal_link(&tx, expense_id, apply).await?;
                }
            }

            let expense = Expense::try_from(Self::find_expense(&tx, expense_id).await?)?;
            Ok((expense, pending))
        })?;

        self.dispatch_notifications(pending).await;
        Ok(expense)
    }

    /// Reverses every link of the expense against its bucket, removes the
    /// link rows and deletes the expense. Owner-only.
    pub async fn delete_expense(&self, expense_id: Uuid, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |tx| {
            let model = Self::find_expense(&tx, expense_id).await?;
            if model.created_by != user_id {
                return Err(EngineError::Forbidden(
                    "only the expense owner can delete it".to_string(),
                ));
            }

            let budget_links = expense_budget_links::Entity::find()
                .filter(expense_budget_links::Column::ExpenseId.eq(model.id.clone()))
                .all(&tx)
                .await?;
            let goal_links = expense_goal_links::Entity::find()
                .filter(expense_goal_links::Column::ExpenseId.eq(model.id.clone()))
                .all(&tx)
                .await?;

            for link in budget_links {
                Self::reverse_budget_link(&tx, &link).await?;
            }
            for link in goal_links {
                Self::reverse_goal_link(&tx, &link).await?;
            }

            expenses::Entity::delete_by_id(model.id).exec(&tx).await?;
            Ok(())
        })
    }

    /// Reverses and removes only the named links; the expense and its
    /// remaining links are untouched. This is the partial-reversal
    /// primitive — deleting an expense is equivalent to unlinking every
    /// link first. Owner-only.
    pub async fn unlink_expense(
        &self,
        expense_id: Uuid,
        user_id: &str,
        budget_ids: &[Uuid],
        savings_goal_ids: &[Uuid],
    ) -> ResultEngine<()> {
        with_tx!(self, |tx| {
            let model = Self::find_expense(&tx, expense_id).await?;
            if model.created_by != user_id {
                return Err(EngineError::Forbidden(
                    "only the expense owner can unlink it".to_string(),
                ));
            }

            // Resolve every named link before reversing anything.
            let mut budget_links = Vec::with_capacity(budget_ids.len());
            for budget_id in budget_ids {
                let link = expense_budget_links::Entity::find()
                    .filter(expense_budget_links::Column::ExpenseId.eq(model.id.clone()))
                    .filter(expense_budget_links::Column::BudgetId.eq(budget_id.to_string()))
                    .one(&tx)
                    .await?
                    .ok_or_else(|| {
                        EngineError::NotFound(format!("link to budget {budget_id}"))
                    })?;
                budget_links.push(link);
            }
            let mut goal_links = Vec::with_capacity(savings_goal_ids.len());
            for goal_id in savings_goal_ids {
                let link = expense_goal_links::Entity::find()
                    .filter(expense_goal_links::Column::ExpenseId.eq(model.id.clone()))
                    .filter(expense_goal_links::Column::SavingsGoalId.eq(goal_id.to_string()))
                    .one(&tx)
                    .await?
                    .ok_or_else(|| {
                        EngineError::NotFound(format!("link to savings goal {goal_id}"))
                    })?;
                goal_links.push(link);
            }

            for link in budget_links {
                Self::reverse_budget_link(&tx, &link).await?;
            }
            for link in goal_links {
                Self::reverse_goal_link(&tx, &link).await?;
            }
            Ok(())
        })
    }

    /// Returns an expense by id, visible to its owner only.
    pub async fn expense(&self, expense_id: Uuid, user_id: &str) -> ResultEngine<Expense> {
        let model = Self::find_expense(&self.database, expense_id).await?;
        if model.created_by != user_id {
            return Err(EngineError::NotFound(format!("expense {expense_id}")));
        }
        Expense::try_from(model)
    }

    async fn find_expense<C: ConnectionTrait>(
        conn: &C,
        expense_id: Uuid,
    ) -> ResultEngine<expenses::Model> {
        expenses::Entity::find_by_id(expense_id.to_string())
            .one(conn)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("expense {expense_id}")))
    }

    /// Resolves a budget distribution spec into (bucket, share) pairs.
    /// Pure validation + lookups; applies nothing.
    async fn plan_budget_distribution(
        tx: &DatabaseTransaction,
        spec: Option<&DistributionSpec>,
        amount_minor: i64,
        user_id: &str,
    ) -> ResultEngine<Vec<BudgetApply>> {
        let Some(spec) = spec else {
            return Ok(Vec::new());
        };
        if spec.distribution == DistributionType::None || spec.targets.is_empty() {
            return Ok(Vec::new());
        }

        Self::reject_duplicate_targets(spec, "budget")?;
        let mut buckets = Vec::with_capacity(spec.targets.len());
        for target in &spec.targets {
            let budget = Self::find_budget(tx, target.id).await?;
            // Buckets of other users are hidden, not forbidden.
            if budget.owner != user_id {
                return Err(EngineError::NotFound(format!("budget {}", target.id)));
            }
            buckets.push(budget);
        }

        let manual_minor = Self::manual_amounts(spec, "budget")?;
        let shares = split::distribution_shares(
            spec.distribution,
            amount_minor,
            spec.targets.len(),
            &manual_minor,
        )?;

        Ok(buckets
            .into_iter()
            .zip(shares)
            .map(|(budget, share_minor)| BudgetApply {
                budget,
                share_minor,
            })
            .collect())
    }

    async fn plan_goal_distribution(
        tx: &DatabaseTransaction,
        spec: Option<&DistributionSpec>,
        amount_minor: i64,
        user_id: &str,
    ) -> ResultEngine<Vec<GoalApply>> {
        let Some(spec) = spec else {
            return Ok(Vec::new());
        };
        if spec.distribution == DistributionType::None || spec.targets.is_empty() {
            return Ok(Vec::new());
        }

        Self::reject_duplicate_targets(spec, "savings goal")?;
        let mut buckets = Vec::with_capacity(spec.targets.len());
        for target in &spec.targets {
            let goal = Self::find_savings_goal(tx, target.id).await?;
            if goal.owner != user_id {
                return Err(EngineError::NotFound(format!("savings goal {}", target.id)));
            }
            buckets.push(goal);
        }

        let manual_minor = Self::manual_amounts(spec, "savings goal")?;
        let shares = split::distribution_shares(
            spec.distribution,
            amount_minor,
            spec.targets.len(),
            &manual_minor,
        )?;

        Ok(buckets
            .into_iter()
            .zip(shares)
            .map(|(goal, share_minor)| GoalApply { goal, share_minor })
            .collect())
    }

    fn reject_duplicate_targets(spec: &DistributionSpec, label: &str) -> ResultEngine<()> {
        let mut seen = std::collections::HashSet::new();
        for target in &spec.targets {
            if !seen.insert(target.id) {
                return Err(EngineError::Validation(format!(
                    "duplicate {label} target: {}",
                    target.id
                )));
            }
        }
        Ok(())
    }

    /// Extracts per-bucket manual amounts. Only required for `manual` with
    /// more than one bucket; a single bucket gets the full amount anyway.
    fn manual_amounts(spec: &DistributionSpec, label: &str) -> ResultEngine<Vec<i64>> {
        if spec.distribution != DistributionType::Manual || spec.targets.len() < 2 {
            return Ok(Vec::new());
        }
        spec.targets
            .iter()
            .map(|target| {
                target.amount_minor.ok_or_else(|| {
                    EngineError::Validation(format!(
                        "missing manual amount for {label} {}",
                        target.id
                    ))
                })
            })
            .collect()
    }

    /// Inserts the link row, debits the budget and re-evaluates its
    /// thresholds.
    async fn apply_budget_link(
        tx: &DatabaseTransaction,
        expense_id: Uuid,
        mut apply: BudgetApply,
        pending: &mut Vec<PendingNotification>,
    ) -> ResultEngine<()> {
        let link = expense_budget_links::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            expense_id: ActiveValue::Set(expense_id.to_string()),
            budget_id: ActiveValue::Set(apply.budget.id.to_string()),
            amount_minor: ActiveValue::Set(apply.share_minor),
        };
        link.insert(tx).await?;

        apply.budget.apply(apply.share_minor);
        let active = crate::budgets::ActiveModel {
            id: ActiveValue::Set(apply.budget.id.to_string()),
            spent_minor: ActiveValue::Set(apply.budget.spent_minor),
            ..Default::default()
        };
        active.update(tx).await?;

        // Thresholds are re-evaluated on every apply; repeated crossings
        // notify repeatedly.
        let percent_bp = apply.budget.percent_spent_bp();
        let kind = if percent_bp >= 10_000 {
            Some(NotificationKind::BudgetExceeded)
        } else if percent_bp >= 8_500 {
            Some(NotificationKind::BudgetAlert)
        } else {
            None
        };
        if let Some(kind) = kind {
            pending.push(PendingNotification {
                user_id: apply.budget.owner.clone(),
                kind,
                payload: json!({
                    "budget_id": apply.budget.id,
                    "budget_name": apply.budget.name,
                    "spent_minor": apply.budget.spent_minor,
                    "total_minor": apply.budget.total_minor,
                    "percent_bp": percent_bp,
                }),
            });
        }
        Ok(())
    }

    /// Inserts the link row and applies the withdrawal to the goal.
    async fn apply_goal_link(
        tx: &DatabaseTransaction,
        expense_id: Uuid,
        mut apply: GoalApply,
    ) -> ResultEngine<()> {
        let link = expense_goal_links::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            expense_id: ActiveValue::Set(expense_id.to_string()),
            savings_goal_id: ActiveValue::Set(apply.goal.id.to_string()),
            amount_minor: ActiveValue::Set(apply.share_minor),
        };
        link.insert(tx).await?;

        apply.goal.withdraw(apply.share_minor);
        Self::persist_goal_amounts(tx, &apply.goal).await
    }

    /// Credits the stored link amount back to the budget and removes the
    /// link row.
    async fn reverse_budget_link(
        tx: &DatabaseTransaction,
        link: &expense_budget_links::Model,
    ) -> ResultEngine<()> {
        let budget_id = crate::util::parse_uuid(&link.budget_id, "budget")?;
        let mut budget = Self::find_budget(tx, budget_id).await?;
        budget.reverse(link.amount_minor);

        let active = crate::budgets::ActiveModel {
            id: ActiveValue::Set(budget.id.to_string()),
            spent_minor: ActiveValue::Set(budget.spent_minor),
            ..Default::default()
        };
        active.update(tx).await?;

        expense_budget_links::Entity::delete_by_id(link.id.clone())
            .exec(tx)
            .await?;
        Ok(())
    }

    /// Adds the stored link amount back to the goal (possibly flipping it
    /// to completed) and removes the link row.
    async fn reverse_goal_link(
        tx: &DatabaseTransaction,
        link: &expense_goal_links::Model,
    ) -> ResultEngine<()> {
        let goal_id = crate::util::parse_uuid(&link.savings_goal_id, "savings goal")?;
        let mut goal = Self::find_savings_goal(tx, goal_id).await?;
        goal.add(link.amount_minor);
        Self::persist_goal_amounts(tx, &goal).await?;

        expense_goal_links::Entity::delete_by_id(link.id.clone())
            .exec(tx)
            .await?;
        Ok(())
    }

    pub(super) async fn persist_goal_amounts(
        tx: &DatabaseTransaction,
        goal: &SavingsGoal,
    ) -> ResultEngine<()> {
        let active = crate::savings_goals::ActiveModel {
            id: ActiveValue::Set(goal.id.to_string()),
            current_minor: ActiveValue::Set(goal.current_minor),
            status: ActiveValue::Set(goal.status.as_str().to_string()),
            ..Default::default()
        };
        active.update(tx).await?;
        Ok(())
    }
}
