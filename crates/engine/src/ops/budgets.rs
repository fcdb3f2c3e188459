//! Budget bucket operations.
//!
//! Budgets are passive accumulators; everything that moves `spent_minor`
//! lives in the expense ops. This module only creates and reads them.

use chrono::Utc;
use sea_orm::{ConnectionTrait, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{Budget, EngineError, ResultEngine, budgets, util::normalize_required_name};

use super::{Engine, with_tx};

impl Engine {
    /// Creates a budget bucket for a user.
    pub async fn new_budget(
        &self,
        name: &str,
        total_minor: i64,
        category_id: Option<Uuid>,
        owner_id: &str,
    ) -> ResultEngine<Budget> {
        let name = normalize_required_name(name, "budget")?;

        with_tx!(self, |tx| {
            Self::resolve_user(&tx, owner_id).await?;
            if let Some(category_id) = category_id {
                Self::resolve_category(&tx, category_id).await?;
            }

            let duplicate = budgets::Entity::find()
                .filter(budgets::Column::Owner.eq(owner_id))
                .filter(budgets::Column::Name.eq(name.clone()))
                .one(&tx)
                .await?;
            if duplicate.is_some() {
                return Err(EngineError::ExistingKey(name));
            }

            let budget = Budget::new(
                name,
                owner_id.to_string(),
                category_id,
                total_minor,
                Utc::now(),
            )?;
            budgets::ActiveModel::from(&budget).insert(&tx).await?;
            Ok(budget)
        })
    }

    /// Returns a budget, visible to its owner only.
    pub async fn budget(&self, budget_id: Uuid, user_id: &str) -> ResultEngine<Budget> {
        let budget = Self::find_budget(&self.database, budget_id).await?;
        if budget.owner != user_id {
            return Err(EngineError::NotFound(format!("budget {budget_id}")));
        }
        Ok(budget)
    }

    /// Lists a user's budgets.
    pub async fn budgets_for_user(&self, user_id: &str) -> ResultEngine<Vec<Budget>> {
        budgets::Entity::find()
            .filter(budgets::Column::Owner.eq(user_id))
            .all(&self.database)
            .await?
            .into_iter()
            .map(Budget::try_from)
            .collect()
    }

    pub(super) async fn find_budget<C: ConnectionTrait>(
        conn: &C,
        budget_id: Uuid,
    ) -> ResultEngine<Budget> {
        budgets::Entity::find_by_id(budget_id.to_string())
            .one(conn)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("budget {budget_id}")))?
            .try_into()
    }
}
