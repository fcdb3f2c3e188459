//! Expense events.
//!
//! An `Expense` is the header row of an allocation: its links (one per
//! bucket it was distributed to) carry the amounts that were applied and
//! that must be reversed on unlink or delete.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub amount_minor: i64,
    pub description: String,
    pub category_id: Option<Uuid>,
    pub occurred_at: DateTime<Utc>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    pub fn new(
        amount_minor: i64,
        description: String,
        category_id: Option<Uuid>,
        occurred_at: DateTime<Utc>,
        created_by: String,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            amount_minor,
            description,
            category_id,
            occurred_at,
            created_by,
            created_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub amount_minor: i64,
    pub description: String,
    pub category_id: Option<String>,
    pub occurred_at: DateTimeUtc,
    pub created_by: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::expense_budget_links::Entity")]
    BudgetLinks,
    #[sea_orm(has_many = "super::expense_goal_links::Entity")]
    GoalLinks,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Categories,
}

impl Related<super::expense_budget_links::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetLinks.def()
    }
}

impl Related<super::expense_goal_links::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GoalLinks.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Expense> for ActiveModel {
    fn from(expense: &Expense) -> Self {
        Self {
            id: ActiveValue::Set(expense.id.to_string()),
            amount_minor: ActiveValue::Set(expense.amount_minor),
            description: ActiveValue::Set(expense.description.clone()),
            category_id: ActiveValue::Set(expense.category_id.map(|id| id.to_string())),
            occurred_at: ActiveValue::Set(expense.occurred_at),
            created_by: ActiveValue::Set(expense.created_by.clone()),
            created_at: ActiveValue::Set(expense.created_at),
        }
    }
}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("expense".to_string()))?,
            amount_minor: model.amount_minor,
            description: model.description,
            category_id: model
                .category_id
                .as_deref()
                .map(|raw| parse_uuid(raw, "category"))
                .transpose()?,
            occurred_at: model.occurred_at,
            created_by: model.created_by,
            created_at: model.created_at,
        })
    }
}
