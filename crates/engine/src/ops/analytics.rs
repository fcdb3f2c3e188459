//! Read-only derived views.
//!
//! Nothing in this module mutates state; every view is recomputed from the
//! persisted rows on each call.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use sea_orm::{QueryFilter, Statement, prelude::*};
use uuid::Uuid;

use crate::{BillStatus, EngineError, ResultEngine, categories, expenses};

use super::Engine;

/// Settlement progress of one bill.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BillProgress {
    pub paid: usize,
    pub total: usize,
    pub percent: f64,
}

/// Aggregate view over a user's bills.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DashboardSummary {
    /// Unpaid owed amounts on the user's own participant rows.
    pub you_owe_minor: i64,
    /// Unpaid owed amounts across all participants of bills the user
    /// created.
    pub owed_to_you_minor: i64,
    /// Bills (created or participated in) whose status is not completed.
    pub active_bills: usize,
    /// Bills (created or participated in) due in the current calendar
    /// month.
    pub bills_this_month: usize,
}

/// Total spending attributed to one category over a window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategorySpending {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub total_minor: i64,
}

impl Engine {
    /// Paid-participant progress of a bill, in percent.
    pub async fn bill_progress(&self, bill_id: Uuid, user_id: &str) -> ResultEngine<BillProgress> {
        let details = self.bill(bill_id, user_id).await?;
        let total = details.participants.len();
        let paid = details.participants.iter().filter(|p| p.is_paid).count();
        let percent = if total == 0 {
            0.0
        } else {
            paid as f64 / total as f64 * 100.0
        };
        Ok(BillProgress {
            paid,
            total,
            percent,
        })
    }

    /// Summary over the user's bills for a dashboard header.
    pub async fn dashboard_summary(&self, user_id: &str) -> ResultEngine<DashboardSummary> {
        let backend = self.database.get_database_backend();

        let you_owe_minor: i64 = {
            let stmt = Statement::from_sql_and_values(
                backend,
                "SELECT COALESCE(SUM(amount_owed_minor), 0) AS sum \
                 FROM bill_participants \
                 WHERE user_id = ? AND is_paid = ?",
                vec![user_id.into(), false.into()],
            );
            let row = self.database.query_one(stmt).await?;
            row.and_then(|r| r.try_get("", "sum").ok()).unwrap_or(0)
        };

        let owed_to_you_minor: i64 = {
            let stmt = Statement::from_sql_and_values(
                backend,
                "SELECT COALESCE(SUM(p.amount_owed_minor), 0) AS sum \
                 FROM bill_participants p \
                 INNER JOIN bills b ON b.id = p.bill_id \
                 WHERE b.created_by = ? AND p.is_paid = ?",
                vec![user_id.into(), false.into()],
            );
            let row = self.database.query_one(stmt).await?;
            row.and_then(|r| r.try_get("", "sum").ok()).unwrap_or(0)
        };

        let now = Utc::now();
        let bills = self.bills_for_user(user_id).await?;
        let active_bills = bills
            .iter()
            .filter(|details| details.bill.status != BillStatus::Completed)
            .count();
        let bills_this_month = bills
            .iter()
            .filter(|details| {
                details.bill.due_date.year() == now.year()
                    && details.bill.due_date.month() == now.month()
            })
            .count();

        Ok(DashboardSummary {
            you_owe_minor,
            owed_to_you_minor,
            active_bills,
            bills_this_month,
        })
    }

    /// Per-category spending totals over `[from, to)`, largest first.
    /// Expenses without a category are reported under `None`.
    pub async fn category_breakdown(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ResultEngine<Vec<CategorySpending>> {
        if from >= to {
            return Err(EngineError::Validation(
                "invalid range: from must be < to".to_string(),
            ));
        }

        let expense_models = expenses::Entity::find()
            .filter(expenses::Column::CreatedBy.eq(user_id))
            .filter(expenses::Column::OccurredAt.gte(from))
            .filter(expenses::Column::OccurredAt.lt(to))
            .all(&self.database)
            .await?;

        let mut totals: BTreeMap<Option<String>, i64> = BTreeMap::new();
        for model in &expense_models {
            *totals.entry(model.category_id.clone()).or_insert(0) += model.amount_minor;
        }

        let category_ids: Vec<String> = totals.keys().flatten().cloned().collect();
        let names: BTreeMap<String, String> = categories::Entity::find()
            .filter(categories::Column::Id.is_in(category_ids))
            .all(&self.database)
            .await?
            .into_iter()
            .map(|model| (model.id, model.name))
            .collect();

        let mut breakdown = Vec::with_capacity(totals.len());
        for (category_id, total_minor) in totals {
            let (id, name) = match category_id {
                Some(raw) => (
                    Some(crate::util::parse_uuid(&raw, "category")?),
                    names.get(&raw).cloned(),
                ),
                None => (None, None),
            };
            breakdown.push(CategorySpending {
                category_id: id,
                name,
                total_minor,
            });
        }
        breakdown.sort_by(|a, b| b.total_minor.cmp(&a.total_minor));
        Ok(breakdown)
    }
}
