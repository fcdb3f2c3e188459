//! Category registry operations.

use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, categories,
    util::{normalize_category_key, normalize_required_name},
};

use super::{Engine, with_tx};

impl Engine {
    /// Registers a category, rejecting names that normalize to an existing
    /// key.
    pub async fn new_category(&self, name: &str) -> ResultEngine<Uuid> {
        let display = normalize_required_name(name, "category")?;
        let normalized = normalize_category_key(&display);

        with_tx!(self, |tx| {
            let duplicate = categories::Entity::find()
                .filter(categories::Column::NameNorm.eq(normalized.clone()))
                .one(&tx)
                .await?;
            if duplicate.is_some() {
                return Err(EngineError::ExistingKey(display));
            }

            let id = Uuid::new_v4();
            let active = categories::ActiveModel {
                id: ActiveValue::Set(id.to_string()),
                name: ActiveValue::Set(display),
                name_norm: ActiveValue::Set(normalized),
            };
            active.insert(&tx).await?;
            Ok(id)
        })
    }

    /// Lists all categories as `(id, name)` pairs.
    pub async fn categories(&self) -> ResultEngine<Vec<(Uuid, String)>> {
        categories::Entity::find()
            .all(&self.database)
            .await?
            .into_iter()
            .map(|model| {
                let id = crate::util::parse_uuid(&model.id, "category")?;
                Ok((id, model.name))
            })
            .collect()
    }
}
