use std::{collections::HashMap, sync::Arc};

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use crates::{
    domain::{
        entities::transactions::InsertBoostTransactionEntity,
        repositories::{boosts::BoostRepository, subscriptions::SubscriptionRepository},
        value_objects::{
            boosts::{
                ApplyBoostOutcome, BoostAppliedDto, BoostCheckoutRequest, BoostCredits,
                BoostTarget, boost_expires_at,
            },
            enums::{boost_types::BoostType, entity_types::EntityType},
            subscriptions::CheckoutUrlDto,
            transactions::PaymentDetails,
        },
    },
    payments::stripe_client::CheckoutMode,
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    config::config_model::StripePrices,
    usecases::stripe_gateway::{StripeGateway, metadata_uuid, resolve_customer_id},
};

pub const PURPOSE_BOOST: &str = "boost";

#[derive(Debug, Error)]
pub enum BoostError {
    #[error("no {0} credit left, purchase one to boost")]
    InsufficientCredits(BoostType),
    #[error("already boosted")]
    AlreadyBoosted,
    #[error("boost target not found")]
    NotFound,
    #[error("invalid boost payment: {0}")]
    InvalidPayment(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl BoostError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BoostError::InsufficientCredits(_) => StatusCode::PAYMENT_REQUIRED,
            BoostError::AlreadyBoosted => StatusCode::CONFLICT,
            BoostError::NotFound => StatusCode::NOT_FOUND,
            BoostError::InvalidPayment(_) => StatusCode::BAD_REQUEST,
            BoostError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, BoostError>;

/// What a confirmed boost payment ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoostPaymentOutcome {
    /// Credit added and spent on the entity that started the purchase.
    Applied(BoostAppliedDto),
    /// Credit added and left available.
    Credited,
    /// This payment intent was processed before.
    Duplicate,
}

pub struct BoostUseCase<B, S, G>
where
    B: BoostRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    G: StripeGateway + 'static,
{
    boost_repo: Arc<B>,
    subscription_repo: Arc<S>,
    stripe_client: Arc<G>,
    prices: StripePrices,
}

impl<B, S, G> BoostUseCase<B, S, G>
where
    B: BoostRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    G: StripeGateway + 'static,
{
    pub fn new(
        boost_repo: Arc<B>,
        subscription_repo: Arc<S>,
        stripe_client: Arc<G>,
        prices: StripePrices,
    ) -> Self {
        Self {
            boost_repo,
            subscription_repo,
            stripe_client,
            prices,
        }
    }

    pub async fn get_credits(&self, user_id: Uuid) -> UseCaseResult<BoostCredits> {
        self.boost_repo.find_credits(user_id).await.map_err(|err| {
            error!(%user_id, db_error = ?err, "boosts: failed to load credits");
            BoostError::Internal(err)
        })
    }

    pub async fn apply_boost(
        &self,
        user_id: Uuid,
        target: BoostTarget,
        boost_type: BoostType,
    ) -> UseCaseResult<BoostAppliedDto> {
        self.apply_boost_at(user_id, target, boost_type, Utc::now())
            .await
    }

    pub async fn apply_boost_at(
        &self,
        user_id: Uuid,
        target: BoostTarget,
        boost_type: BoostType,
        now: DateTime<Utc>,
    ) -> UseCaseResult<BoostAppliedDto> {
        info!(
            %user_id,
            entity_type = %target.entity_type(),
            entity_id = %target.entity_id(),
            %boost_type,
            "boosts: apply requested"
        );

        let credits = self.get_credits(user_id).await?;
        if credits.available(boost_type) <= 0 {
            warn!(%user_id, %boost_type, "boosts: no credit left");
            return Err(BoostError::InsufficientCredits(boost_type));
        }

        let state = self
            .boost_repo
            .find_boost_state(user_id, target)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "boosts: failed to load boost state");
                BoostError::Internal(err)
            })?
            .ok_or(BoostError::NotFound)?;

        if state.is_currently_boosted_at(now) {
            warn!(
                %user_id,
                entity_id = %target.entity_id(),
                "boosts: target already boosted"
            );
            return Err(BoostError::AlreadyBoosted);
        }

        let outcome = self
            .boost_repo
            .apply_boost(user_id, target, boost_type, now)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "boosts: apply transaction failed");
                BoostError::Internal(err)
            })?;

        match outcome {
            ApplyBoostOutcome::Applied {
                boosted_at,
                remaining_credits,
            } => {
                info!(
                    %user_id,
                    entity_id = %target.entity_id(),
                    %boost_type,
                    remaining_credits,
                    "boosts: boost applied"
                );
                Ok(BoostAppliedDto {
                    entity_type: target.entity_type(),
                    entity_id: target.entity_id(),
                    boost_type,
                    boosted_at,
                    boost_expires_at: boost_expires_at(boosted_at),
                    remaining_credits,
                })
            }
            ApplyBoostOutcome::InsufficientCredits => {
                Err(BoostError::InsufficientCredits(boost_type))
            }
            ApplyBoostOutcome::AlreadyBoosted => Err(BoostError::AlreadyBoosted),
            ApplyBoostOutcome::NotFound => Err(BoostError::NotFound),
        }
    }

    /// Clears the boost. The spent credit is not refunded.
    pub async fn remove_boost(&self, user_id: Uuid, target: BoostTarget) -> UseCaseResult<()> {
        let removed = self
            .boost_repo
            .remove_boost(user_id, target)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "boosts: failed to remove boost");
                BoostError::Internal(err)
            })?;

        if !removed {
            return Err(BoostError::NotFound);
        }

        info!(
            %user_id,
            entity_type = %target.entity_type(),
            entity_id = %target.entity_id(),
            "boosts: boost removed"
        );
        Ok(())
    }

    pub async fn create_checkout(
        &self,
        user_id: Uuid,
        email: Option<String>,
        request: BoostCheckoutRequest,
    ) -> UseCaseResult<CheckoutUrlDto> {
        let target = request.target();
        let boost_type = request.boost_type;

        self.boost_repo
            .find_boost_state(user_id, target)
            .await
            .map_err(BoostError::Internal)?
            .ok_or(BoostError::NotFound)?;

        let customer_id = resolve_customer_id(
            self.subscription_repo.as_ref(),
            self.stripe_client.as_ref(),
            user_id,
            email.as_deref(),
        )
        .await?;

        let metadata = HashMap::from([
            ("purpose".to_string(), PURPOSE_BOOST.to_string()),
            ("user_id".to_string(), user_id.to_string()),
            ("boost_type".to_string(), boost_type.to_string()),
            ("entity_type".to_string(), target.entity_type().to_string()),
            ("entity_id".to_string(), target.entity_id().to_string()),
        ]);

        let price_id = self.prices.boost_price(boost_type);
        let url = self
            .stripe_client
            .create_checkout_session(price_id, CheckoutMode::Payment, customer_id, metadata)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    %boost_type,
                    price_id,
                    error = ?err,
                    "boosts: stripe checkout session creation failed"
                );
                BoostError::Internal(err)
            })?;

        info!(%user_id, %boost_type, "boosts: checkout session created");
        Ok(CheckoutUrlDto { url })
    }

    /// Records a paid boost, credits it, then spends it on the entity named in the
    /// checkout metadata. A failed auto-apply keeps the credit.
    pub async fn handle_boost_payment(
        &self,
        metadata: &HashMap<String, String>,
        payment: PaymentDetails,
    ) -> UseCaseResult<BoostPaymentOutcome> {
        let user_id = metadata_uuid(metadata, "user_id")
            .ok_or_else(|| BoostError::InvalidPayment("missing user_id".to_string()))?;
        let boost_type = metadata
            .get("boost_type")
            .and_then(|value| BoostType::from_str(value))
            .ok_or_else(|| BoostError::InvalidPayment("missing boost_type".to_string()))?;

        let payment_intent_id = payment.payment_intent_id.clone();
        let recorded = self
            .boost_repo
            .record_boost_purchase(InsertBoostTransactionEntity {
                user_id,
                boost_type: boost_type.to_string(),
                amount_minor: payment.amount_minor,
                currency: payment.currency,
                card_brand: payment.card_brand,
                card_last4: payment.card_last4,
                stripe_payment_intent_id: payment.payment_intent_id,
            })
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    %payment_intent_id,
                    db_error = ?err,
                    "boosts: failed to record boost purchase"
                );
                BoostError::Internal(err)
            })?;

        if !recorded {
            info!(%user_id, %payment_intent_id, "boosts: payment already processed");
            return Ok(BoostPaymentOutcome::Duplicate);
        }
        info!(%user_id, %boost_type, %payment_intent_id, "boosts: credit purchased");

        let target = metadata
            .get("entity_type")
            .and_then(|value| EntityType::from_str(value))
            .zip(metadata_uuid(metadata, "entity_id"))
            .map(|(entity_type, entity_id)| BoostTarget::new(entity_type, entity_id));

        let Some(target) = target else {
            return Ok(BoostPaymentOutcome::Credited);
        };

        match self.apply_boost(user_id, target, boost_type).await {
            Ok(applied) => Ok(BoostPaymentOutcome::Applied(applied)),
            Err(err) => {
                warn!(
                    %user_id,
                    entity_id = %target.entity_id(),
                    error = %err,
                    "boosts: auto-apply after purchase failed, credit kept"
                );
                Ok(BoostPaymentOutcome::Credited)
            }
        }
    }
}
