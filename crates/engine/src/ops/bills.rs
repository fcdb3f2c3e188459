//! Bill settlement operations.
//!
//! Creation computes every participant's owed share through the split
//! policy and persists bill + participants atomically. Payment marking is
//! the only way the derived status advances; there is no unpay, so the
//! status sequence is monotonic.

use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, TransactionTrait, prelude::*,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    Bill, BillParticipant, BillStatus, CreateBillCmd, EngineError, NotificationKind,
    ResultEngine, SplitType, UpdateBillCmd, bill_participants, bills, categories,
    commands::ParticipantShare,
    split::{self, BillShareInputs},
    util::{normalize_optional_text, normalize_required_name},
};

use super::{Engine, PendingNotification, with_tx};

/// A bill together with its participant rows.
#[derive(Clone, Debug)]
pub struct BillDetails {
    pub bill: Bill,
    pub participants: Vec<BillParticipant>,
}

impl Engine {
    /// Creates a bill and one participant row per resolved user.
    ///
    /// The creator is always a participant: when not named in the command,
    /// they are appended and absorb the remainder share of the split
    /// policy. All lookups and validation run before the first write.
    pub async fn create_bill(
        &self,
        cmd: CreateBillCmd,
        creator_id: &str,
    ) -> ResultEngine<BillDetails> {
        let name = normalize_required_name(&cmd.name, "bill")?;
        let note = normalize_optional_text(cmd.note.as_deref());

        with_tx!(self, |tx| {
            Self::resolve_user(&tx, creator_id).await?;
            Self::resolve_category(&tx, cmd.category_id).await?;

            let mut seen = std::collections::HashSet::new();
            for share in &cmd.participants {
                if !seen.insert(share.user_id.as_str()) {
                    return Err(EngineError::Validation(format!(
                        "duplicate participant: {}",
                        share.user_id
                    )));
                }
                Self::resolve_user(&tx, &share.user_id).await?;
            }

            let creator_appended = !cmd
                .participants
                .iter()
                .any(|share| share.user_id == creator_id);
            let participant_count = cmd.participants.len() + usize::from(creator_appended);

            let (percentages_bp, amounts_minor) =
                named_share_inputs(cmd.split_type, &cmd.participants)?;
            let shares = split::bill_shares(
                cmd.split_type,
                &BillShareInputs {
                    total_minor: cmd.total_minor,
                    participant_count,
                    percentages_bp: &percentages_bp,
                    amounts_minor: &amounts_minor,
                    creator_appended,
                },
            )?;

            let bill = Bill::new(
                name,
                cmd.total_minor,
                cmd.split_type,
                cmd.due_date,
                creator_id.to_string(),
                cmd.category_id,
                note,
                Utc::now(),
            )?;
            bills::ActiveModel::from(&bill).insert(&tx).await?;

            let mut user_ids: Vec<String> = cmd
                .participants
                .iter()
                .map(|share| share.user_id.clone())
                .collect();
            if creator_appended {
                user_ids.push(creator_id.to_string());
            }

            let mut participants = Vec::with_capacity(user_ids.len());
            for (user_id, owed_minor) in user_ids.into_iter().zip(shares) {
                let participant = BillParticipant::new(bill.id, user_id, owed_minor);
                bill_participants::ActiveModel::from(&participant)
                    .insert(&tx)
                    .await?;
                participants.push(participant);
            }

            Ok(BillDetails { bill, participants })
        })
    }

    /// Marks one participant's share as paid and recomputes the bill
    /// status from all participant rows (the just-written one included).
    pub async fn mark_payment_paid(
        &self,
        bill_id: Uuid,
        participant_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<BillDetails> {
        let (details, pending) = with_tx!(self, |tx| {
            let bill_model = Self::find_bill(&tx, bill_id).await?;

            let participant_model = bill_participants::Entity::find_by_id(
                participant_id.to_string(),
            )
            .one(&tx)
            .await?
            .filter(|model| model.bill_id == bill_model.id)
            .ok_or_else(|| EngineError::NotFound(format!("participant {participant_id}")))?;

            if participant_model.is_paid {
                return Err(EngineError::Validation(
                    "participant already marked as paid".to_string(),
                ));
            }

            let active = bill_participants::ActiveModel {
                id: ActiveValue::Set(participant_model.id.clone()),
                is_paid: ActiveValue::Set(true),
                paid_at: ActiveValue::Set(Some(Utc::now())),
                ..Default::default()
            };
            active.update(&tx).await?;

            let participants = Self::bill_participant_rows(&tx, bill_id).await?;
            let paid = participants.iter().filter(|p| p.is_paid).count();
            let status = BillStatus::derive(paid, participants.len());

            let mut bill = Bill::try_from(bill_model)?;
            if bill.status != status {
                let active = bills::ActiveModel {
                    id: ActiveValue::Set(bill.id.to_string()),
                    status: ActiveValue::Set(status.as_str().to_string()),
                    ..Default::default()
                };
                active.update(&tx).await?;
                bill.status = status;
            }

            let payload = json!({
                "bill_id": bill.id,
                "bill_name": bill.name,
                "paid_by": participant_model.user_id,
                "marked_by": user_id,
            });
            let pending = match status {
                BillStatus::Completed => vec![PendingNotification {
                    user_id: bill.created_by.clone(),
                    kind: NotificationKind::BillPaid,
                    payload,
                }],
                BillStatus::Partial => vec![PendingNotification {
                    user_id: bill.created_by.clone(),
                    kind: NotificationKind::BillPartiallyPaid,
                    payload,
                }],
                BillStatus::Pending => Vec::new(),
            };

            Ok((BillDetails { bill, participants }, pending))
        })?;

        self.dispatch_notifications(pending).await;
        Ok(details)
    }

    /// Patches a bill's basic fields; optionally replaces the participant
    /// set without recomputing dues. Creator-only.
    pub async fn update_bill(
        &self,
        bill_id: Uuid,
        cmd: UpdateBillCmd,
        user_id: &str,
    ) -> ResultEngine<BillDetails> {
        with_tx!(self, |tx| {
            let bill_model = Self::find_bill(&tx, bill_id).await?;
            if bill_model.created_by != user_id {
                return Err(EngineError::Forbidden(
                    "only the bill creator can update it".to_string(),
                ));
            }

            let mut active = bills::ActiveModel {
                id: ActiveValue::Set(bill_model.id.clone()),
                ..Default::default()
            };
            let mut dirty = false;
            if let Some(name) = cmd.name.as_deref() {
                active.name = ActiveValue::Set(normalize_required_name(name, "bill")?);
                dirty = true;
            }
            if let Some(total_minor) = cmd.total_minor {
                if total_minor <= 0 {
                    return Err(EngineError::InvalidAmount(
                        "total_minor must be > 0".to_string(),
                    ));
                }
                active.total_minor = ActiveValue::Set(total_minor);
                dirty = true;
            }
            if let Some(due_date) = cmd.due_date {
                active.due_date = ActiveValue::Set(due_date);
                dirty = true;
            }
            if let Some(category_id) = cmd.category_id {
                Self::resolve_category(&tx, category_id).await?;
                active.category_id = ActiveValue::Set(category_id.to_string());
                dirty = true;
            }
            if let Some(note) = cmd.note.as_deref() {
                active.note = ActiveValue::Set(normalize_optional_text(Some(note)));
                dirty = true;
            }
            if dirty {
                active.update(&tx).await?;
            }

            if let Some(user_ids) = &cmd.participants {
                Self::replace_participants(&tx, bill_id, user_ids).await?;
            }

            let bill = Bill::try_from(Self::find_bill(&tx, bill_id).await?)?;
            let participants = Self::bill_participant_rows(&tx, bill_id).await?;
            Ok(BillDetails { bill, participants })
        })
    }

    /// Sets the bill status directly. Creator-only.
    pub async fn update_bill_status(
        &self,
        bill_id: Uuid,
        status: BillStatus,
        user_id: &str,
    ) -> ResultEngine<Bill> {
        with_tx!(self, |tx| {
            let bill_model = Self::find_bill(&tx, bill_id).await?;
            if bill_model.created_by != user_id {
                return Err(EngineError::Forbidden(
                    "only the bill creator can change its status".to_string(),
                ));
            }

            let active = bills::ActiveModel {
                id: ActiveValue::Set(bill_model.id.clone()),
                status: ActiveValue::Set(status.as_str().to_string()),
                ..Default::default()
            };
            active.update(&tx).await?;

            let mut bill = Bill::try_from(bill_model)?;
            bill.status = status;
            Ok(bill)
        })
    }

    /// Deletes a bill and its participant rows. Creator-only.
    pub async fn delete_bill(&self, bill_id: Uuid, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |tx| {
            let bill_model = Self::find_bill(&tx, bill_id).await?;
            if bill_model.created_by != user_id {
                return Err(EngineError::Forbidden(
                    "only the bill creator can delete it".to_string(),
                ));
            }

            // Participants are owned by the bill; delete them explicitly
            // rather than relying on the FK cascade alone.
            bill_participants::Entity::delete_many()
                .filter(bill_participants::Column::BillId.eq(bill_id.to_string()))
                .exec(&tx)
                .await?;
            bills::Entity::delete_by_id(bill_model.id).exec(&tx).await?;
            Ok(())
        })
    }

    /// Asks the named participants to settle their share. A read/trigger
    /// operation: no ledger state changes.
    pub async fn request_payment(
        &self,
        bill_id: Uuid,
        target_user_ids: &[String],
        requester_id: &str,
        message: Option<&str>,
    ) -> ResultEngine<()> {
        let bill_model = Self::find_bill(&self.database, bill_id).await?;
        let participants = Self::bill_participant_rows(&self.database, bill_id).await?;

        let mut pending = Vec::with_capacity(target_user_ids.len());
        for target in target_user_ids {
            let participant = participants
                .iter()
                .find(|p| &p.user_id == target)
                .ok_or_else(|| {
                    EngineError::Forbidden(format!(
                        "user {target} is not a participant of this bill"
                    ))
                })?;
            pending.push(PendingNotification {
                user_id: target.clone(),
                kind: NotificationKind::PaymentRequest,
                payload: json!({
                    "bill_id": bill_model.id,
                    "bill_name": bill_model.name,
                    "amount_owed_minor": participant.amount_owed_minor,
                    "requested_by": requester_id,
                    "message": message,
                }),
            });
        }

        self.dispatch_notifications(pending).await;
        Ok(())
    }

    /// Returns a bill with its participants. Visible to the creator and
    /// the participants; hidden (`NotFound`) from everyone else.
    pub async fn bill(&self, bill_id: Uuid, user_id: &str) -> ResultEngine<BillDetails> {
        let bill_model = Self::find_bill(&self.database, bill_id).await?;
        let participants = Self::bill_participant_rows(&self.database, bill_id).await?;

        let visible = bill_model.created_by == user_id
            || participants.iter().any(|p| p.user_id == user_id);
        if !visible {
            return Err(EngineError::NotFound(format!("bill {bill_id}")));
        }

        Ok(BillDetails {
            bill: Bill::try_from(bill_model)?,
            participants,
        })
    }

    /// Lists the bills a user created or participates in.
    pub async fn bills_for_user(&self, user_id: &str) -> ResultEngine<Vec<BillDetails>> {
        let participating: Vec<String> = bill_participants::Entity::find()
            .filter(bill_participants::Column::UserId.eq(user_id))
            .all(&self.database)
            .await?
            .into_iter()
            .map(|model| model.bill_id)
            .collect();

        let bill_models = bills::Entity::find()
            .filter(
                bills::Column::CreatedBy
                    .eq(user_id)
                    .or(bills::Column::Id.is_in(participating)),
            )
            .all(&self.database)
            .await?;

        let mut details = Vec::with_capacity(bill_models.len());
        for bill_model in bill_models {
            let bill = Bill::try_from(bill_model)?;
            let participants = Self::bill_participant_rows(&self.database, bill.id).await?;
            details.push(BillDetails { bill, participants });
        }
        Ok(details)
    }

    pub(super) async fn find_bill<C: ConnectionTrait>(
        conn: &C,
        bill_id: Uuid,
    ) -> ResultEngine<bills::Model> {
        bills::Entity::find_by_id(bill_id.to_string())
            .one(conn)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("bill {bill_id}")))
    }

    pub(super) async fn resolve_category<C: ConnectionTrait>(
        conn: &C,
        category_id: Uuid,
    ) -> ResultEngine<categories::Model> {
        categories::Entity::find_by_id(category_id.to_string())
            .one(conn)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("category {category_id}")))
    }

    async fn bill_participant_rows<C: ConnectionTrait>(
        conn: &C,
        bill_id: Uuid,
    ) -> ResultEngine<Vec<BillParticipant>> {
        bill_participants::Entity::find()
            .filter(bill_participants::Column::BillId.eq(bill_id.to_string()))
            .all(conn)
            .await?
            .into_iter()
            .map(BillParticipant::try_from)
            .collect()
    }

    async fn replace_participants(
        tx: &sea_orm::DatabaseTransaction,
        bill_id: Uuid,
        user_ids: &[String],
    ) -> ResultEngine<()> {
        let mut seen = std::collections::HashSet::new();
        for user_id in user_ids {
            if !seen.insert(user_id.as_str()) {
                return Err(EngineError::Validation(format!(
                    "duplicate participant: {user_id}"
                )));
            }
            Self::resolve_user(tx, user_id).await?;
        }

        let existing = bill_participants::Entity::find()
            .filter(bill_participants::Column::BillId.eq(bill_id.to_string()))
            .all(tx)
            .await?;

        // Retained users keep their row (owed amount and paid state);
        // dues are not recomputed on replacement.
        for model in &existing {
            if !user_ids.contains(&model.user_id) {
                bill_participants::Entity::delete_by_id(model.id.clone())
                    .exec(tx)
                    .await?;
            }
        }
        for user_id in user_ids {
            if !existing.iter().any(|model| &model.user_id == user_id) {
                let participant = BillParticipant::new(bill_id, user_id.clone(), 0);
                bill_participants::ActiveModel::from(&participant)
                    .insert(tx)
                    .await?;
            }
        }
        Ok(())
    }
}

/// Extracts the per-named-participant inputs the split policy needs,
/// rejecting missing values for the chosen policy.
fn named_share_inputs(
    split_type: SplitType,
    participants: &[ParticipantShare],
) -> ResultEngine<(Vec<i64>, Vec<i64>)> {
    let mut percentages_bp = Vec::new();
    let mut amounts_minor = Vec::new();

    match split_type {
        SplitType::Equal => {}
        SplitType::Percentage => {
            for share in participants {
                let bp = share.percentage_bp.ok_or_else(|| {
                    EngineError::Validation(format!(
                        "missing percentage for participant {}",
                        share.user_id
                    ))
                })?;
                percentages_bp.push(bp);
            }
        }
        SplitType::Manual => {
            for share in participants {
                let amount_minor = share.amount_minor.ok_or_else(|| {
                    EngineError::Validation(format!(
                        "missing amount for participant {}",
                        share.user_id
                    ))
                })?;
                amounts_minor.push(amount_minor);
            }
        }
    }

    Ok((percentages_bp, amounts_minor))
}
