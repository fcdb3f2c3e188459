//! Shared bills.
//!
//! A `Bill` is a shared expense whose total is split across participants by
//! a [`SplitType`] policy. Its `status` is derived from the participants'
//! payment state and only moves forward (pending → partial → completed):
//! no unpay operation exists.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, SplitType, util::parse_uuid};

/// Settlement state of a bill, derived from its participants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    Pending,
    Partial,
    Completed,
}

impl BillStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Partial => "partial",
            Self::Completed => "completed",
        }
    }

    /// Derives the status from paid/total participant counts.
    pub fn derive(paid: usize, total: usize) -> Self {
        if total > 0 && paid == total {
            Self::Completed
        } else if paid > 0 {
            Self::Partial
        } else {
            Self::Pending
        }
    }
}

impl TryFrom<&str> for BillStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "partial" => Ok(Self::Partial),
            "completed" => Ok(Self::Completed),
            other => Err(EngineError::Validation(format!(
                "invalid bill status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    pub id: Uuid,
    pub name: String,
    pub total_minor: i64,
    pub split_type: SplitType,
    pub due_date: DateTime<Utc>,
    pub status: BillStatus,
    pub created_by: String,
    pub category_id: Uuid,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Bill {
    pub fn new(
        name: String,
        total_minor: i64,
        split_type: SplitType,
        due_date: DateTime<Utc>,
        created_by: String,
        category_id: Uuid,
        note: Option<String>,
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
            total_minor,
            split_type,
            due_date,
            status: BillStatus::Pending,
            created_by,
            category_id,
            note,
            created_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bills")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub total_minor: i64,
    pub split_type: String,
    pub due_date: DateTimeUtc,
    pub status: String,
    pub created_by: String,
    pub category_id: String,
    pub note: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bill_participants::Entity")]
    Participants,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Categories,
}

impl Related<super::bill_participants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participants.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Bill> for ActiveModel {
    fn from(bill: &Bill) -> Self {
        Self {
            id: ActiveValue::Set(bill.id.to_string()),
            name: ActiveValue::Set(bill.name.clone()),
            total_minor: ActiveValue::Set(bill.total_minor),
            split_type: ActiveValue::Set(bill.split_type.as_str().to_string()),
            due_date: ActiveValue::Set(bill.due_date),
            status: ActiveValue::Set(bill.status.as_str().to_string()),
            created_by: ActiveValue::Set(bill.created_by.clone()),
            category_id: ActiveValue::Set(bill.category_id.to_string()),
            note: ActiveValue::Set(bill.note.clone()),
            created_at: ActiveValue::Set(bill.created_at),
        }
    }
}

impl TryFrom<Model> for Bill {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("bill".to_string()))?,
            name: model.name,
            total_minor: model.total_minor,
            split_type: SplitType::try_from(model.split_type.as_str())?,
            due_date: model.due_date,
            status: BillStatus::try_from(model.status.as_str())?,
            created_by: model.created_by,
            category_id: parse_uuid(&model.category_id, "category")?,
            note: model.note,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_derivation() {
        assert_eq!(BillStatus::derive(0, 3), BillStatus::Pending);
        assert_eq!(BillStatus::derive(1, 3), BillStatus::Partial);
        assert_eq!(BillStatus::derive(3, 3), BillStatus::Completed);
    }

    #[test]
    fn status_ordering_is_monotonic() {
        assert!(BillStatus::Pending < BillStatus::Partial);
        assert!(BillStatus::Partial < BillStatus::Completed);
    }

    #[test]
    fn rejects_non_positive_total() {
        let err = Bill::new(
            "Rent".to_string(),
            0,
            SplitType::Equal,
            Utc::now(),
            "alice".to_string(),
            Uuid::new_v4(),
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }
}
