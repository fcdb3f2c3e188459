//! Bill participants.
//!
//! One row per `(bill, user)` pair, created atomically with the bill and
//! owned by it (cascade-deleted). `amount_owed_minor` is fixed at creation
//! by the split policy; `is_paid`/`paid_at` carry the settlement state.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillParticipant {
    pub id: Uuid,
    pub bill_id: Uuid,
    pub user_id: String,
    pub amount_owed_minor: i64,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
}

impl BillParticipant {
    pub fn new(bill_id: Uuid, user_id: String, amount_owed_minor: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            bill_id,
            user_id,
            amount_owed_minor,
            is_paid: false,
            paid_at: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bill_participants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub bill_id: String,
    pub user_id: String,
    pub amount_owed_minor: i64,
    pub is_paid: bool,
    pub paid_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bills::Entity",
        from = "Column::BillId",
        to = "super::bills::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Bills,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Users,
}

impl Related<super::bills::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bills.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&BillParticipant> for ActiveModel {
    fn from(participant: &BillParticipant) -> Self {
        Self {
            id: ActiveValue::Set(participant.id.to_string()),
            bill_id: ActiveValue::Set(participant.bill_id.to_string()),
            user_id: ActiveValue::Set(participant.user_id.clone()),
            amount_owed_minor: ActiveValue::Set(participant.amount_owed_minor),
            is_paid: ActiveValue::Set(participant.is_paid),
            paid_at: ActiveValue::Set(participant.paid_at),
        }
    }
}

impl TryFrom<Model> for BillParticipant {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("participant".to_string()))?,
            bill_id: Uuid::parse_str(&model.bill_id)
                .map_err(|_| EngineError::NotFound("bill".to_string()))?,
            user_id: model.user_id,
            amount_owed_minor: model.amount_owed_minor,
            is_paid: model.is_paid,
            paid_at: model.paid_at,
        })
    }
}
