use std::sync::Arc;

use chrono::Utc;
use crates::domain::{
    repositories::commerces::CommerceRepository,
    value_objects::{
        boosts::Locale,
        commerces::{CommerceDeletionSummary, CommerceDto, CommerceForm},
    },
};
use tracing::{error, info};
use uuid::Uuid;

use crate::usecases::content::{ContentError, UseCaseResult};

pub struct CommerceUseCase<C>
where
    C: CommerceRepository + Send + Sync + 'static,
{
    commerce_repo: Arc<C>,
}

impl<C> CommerceUseCase<C>
where
    C: CommerceRepository + Send + Sync + 'static,
{
    pub fn new(commerce_repo: Arc<C>) -> Self {
        Self { commerce_repo }
    }

    pub async fn list(&self, user_id: Uuid, locale: Locale) -> UseCaseResult<Vec<CommerceDto>> {
        let commerces = self
            .commerce_repo
            .list_by_user(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "commerces: failed to list");
                ContentError::Internal(err)
            })?;

        let now = Utc::now();
        Ok(commerces
            .into_iter()
            .map(|commerce| CommerceDto::from_entity(commerce, locale, now))
            .collect())
    }

    pub async fn get(
        &self,
        user_id: Uuid,
        commerce_id: Uuid,
        locale: Locale,
    ) -> UseCaseResult<CommerceDto> {
        let commerce = self
            .commerce_repo
            .find_by_id(user_id, commerce_id)
            .await
            .map_err(|err| {
                error!(%user_id, %commerce_id, db_error = ?err, "commerces: failed to load");
                ContentError::Internal(err)
            })?
            .ok_or(ContentError::NotFound("commerce"))?;

        Ok(CommerceDto::from_entity(commerce, locale, Utc::now()))
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        form: CommerceForm,
        locale: Locale,
    ) -> UseCaseResult<CommerceDto> {
        form.validate()?;

        let commerce = self
            .commerce_repo
            .create(form.into_insert(user_id))
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "commerces: failed to create");
                ContentError::Internal(err)
            })?;

        info!(%user_id, commerce_id = %commerce.id, "commerces: created");
        Ok(CommerceDto::from_entity(commerce, locale, Utc::now()))
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        commerce_id: Uuid,
        form: CommerceForm,
        locale: Locale,
    ) -> UseCaseResult<CommerceDto> {
        form.validate()?;

        let now = Utc::now();
        let commerce = self
            .commerce_repo
            .update(user_id, commerce_id, form.into_update(now))
            .await
            .map_err(|err| {
                error!(%user_id, %commerce_id, db_error = ?err, "commerces: failed to update");
                ContentError::Internal(err)
            })?
            .ok_or(ContentError::NotFound("commerce"))?;

        info!(%user_id, %commerce_id, "commerces: updated");
        Ok(CommerceDto::from_entity(commerce, locale, now))
    }

    /// Deletes the commerce and re-homes or removes the offers and events that depend on it.
    pub async fn delete(
        &self,
        user_id: Uuid,
        commerce_id: Uuid,
    ) -> UseCaseResult<CommerceDeletionSummary> {
        let summary = self
            .commerce_repo
            .delete_cascade(user_id, commerce_id)
            .await
            .map_err(|err| {
                error!(%user_id, %commerce_id, db_error = ?err, "commerces: cascade delete failed");
                ContentError::Internal(err)
            })?
            .ok_or(ContentError::NotFound("commerce"))?;

        info!(
            %user_id,
            %commerce_id,
            reassigned_offers = summary.reassigned_offers,
            deleted_offers = summary.deleted_offers,
            reassigned_events = summary.reassigned_events,
            deleted_events = summary.deleted_events,
            "commerces: deleted"
        );
        Ok(summary)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, Utc};
    use crates::domain::entities::commerces::CommerceEntity;
    use uuid::Uuid;

    pub fn commerce(user_id: Uuid, boosted_at: Option<DateTime<Utc>>) -> CommerceEntity {
        let now = Utc::now();
        CommerceEntity {
            id: Uuid::new_v4(),
            user_id,
            name: "Café Gosholo".to_string(),
            description: None,
            address: "123 rue Saint-Denis, Montréal".to_string(),
            postal_code: Some("H2X 1K1".to_string()),
            latitude: Some(45.5),
            longitude: Some(-73.56),
            category: "restaurant".to_string(),
            email: None,
            phone: None,
            website: None,
            image_url: None,
            boosted: boosted_at.is_some(),
            boost_type: boosted_at.map(|_| "en_vedette".to_string()),
            boosted_at,
            created_at: now,
            updated_at: now,
        }
    }
}
