use std::{collections::HashMap, sync::Arc};

use axum::http::StatusCode;
use chrono::{DateTime, TimeZone, Utc};
use crates::{
    domain::{
        entities::transactions::InsertSubscriptionTransactionEntity,
        repositories::{
            boosts::BoostRepository,
            dashboard::DashboardRepository,
            subscriptions::{SubscriptionActivation, SubscriptionRepository},
            transactions::TransactionRepository,
        },
        value_objects::{
            enums::{plan_types::PlanType, subscription_statuses::SubscriptionStatus},
            plans::ContentGate,
            subscriptions::{CheckoutUrlDto, CurrentSubscriptionDto, ReceiptDto},
            transactions::{
                BoostTransactionDto, PaymentDetails, SubscriptionTransactionDto,
                TransactionDetailsDto,
            },
        },
    },
    payments::stripe_client::{CheckoutMode, StripeClient, StripeCheckoutSession, StripeEvent},
};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::usecases::{
    boosts::{BoostError, BoostPaymentOutcome, BoostUseCase, PURPOSE_BOOST},
    plan_resolver::PlanResolver,
    stripe_gateway::{StripeGateway, metadata_uuid, resolve_customer_id},
};

pub const PURPOSE_SUBSCRIPTION: &str = "subscription";

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("already subscribed to the pro plan")]
    AlreadySubscribed,
    #[error("no billing account on file")]
    NoCustomer,
    #[error("transaction not found")]
    TransactionNotFound,
    #[error("invalid webhook payload: {0}")]
    InvalidWebhook(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl SubscriptionError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SubscriptionError::AlreadySubscribed => StatusCode::CONFLICT,
            SubscriptionError::NoCustomer | SubscriptionError::TransactionNotFound => {
                StatusCode::NOT_FOUND
            }
            SubscriptionError::InvalidWebhook(_) => StatusCode::BAD_REQUEST,
            SubscriptionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, SubscriptionError>;

/// What a verified webhook event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Boost(BoostPaymentOutcome),
    SubscriptionActivated,
    CreditsGranted,
    SubscriptionEnded(Uuid),
    /// Payment already processed.
    Duplicate,
    Ignored,
}

pub struct SubscriptionUseCase<S, T, D, B, G>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    D: DashboardRepository + Send + Sync + 'static,
    B: BoostRepository + Send + Sync + 'static,
    G: StripeGateway + 'static,
{
    subscription_repo: Arc<S>,
    transaction_repo: Arc<T>,
    plan_resolver: Arc<PlanResolver<S, D>>,
    boost_usecase: Arc<BoostUseCase<B, S, G>>,
    stripe_client: Arc<G>,
    pro_price_id: String,
}

impl<S, T, D, B, G> SubscriptionUseCase<S, T, D, B, G>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    D: DashboardRepository + Send + Sync + 'static,
    B: BoostRepository + Send + Sync + 'static,
    G: StripeGateway + 'static,
{
    pub fn new(
        subscription_repo: Arc<S>,
        transaction_repo: Arc<T>,
        plan_resolver: Arc<PlanResolver<S, D>>,
        boost_usecase: Arc<BoostUseCase<B, S, G>>,
        stripe_client: Arc<G>,
        pro_price_id: String,
    ) -> Self {
        Self {
            subscription_repo,
            transaction_repo,
            plan_resolver,
            boost_usecase,
            stripe_client,
            pro_price_id,
        }
    }

    pub async fn get_current_subscription(
        &self,
        user_id: Uuid,
    ) -> UseCaseResult<CurrentSubscriptionDto> {
        let plan_type = self.plan_resolver.resolve_plan_type(user_id).await?;
        let subscription = self
            .subscription_repo
            .find_current_subscription(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "subscriptions: failed to load subscription");
                SubscriptionError::Internal(err)
            })?;

        Ok(CurrentSubscriptionDto {
            plan_type,
            status: subscription.as_ref().map(|row| row.status()),
            current_period_end: subscription.and_then(|row| row.current_period_end),
        })
    }

    pub async fn get_content_limit(&self, user_id: Uuid) -> UseCaseResult<ContentGate> {
        self.plan_resolver
            .content_gate(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "subscriptions: failed to compute content gate");
                SubscriptionError::Internal(err)
            })
    }

    pub async fn create_subscription_checkout(
        &self,
        user_id: Uuid,
        email: Option<String>,
    ) -> UseCaseResult<CheckoutUrlDto> {
        if self.plan_resolver.resolve_plan_type(user_id).await? == PlanType::Pro {
            warn!(%user_id, "subscriptions: checkout refused, already pro");
            return Err(SubscriptionError::AlreadySubscribed);
        }

        let customer_id = resolve_customer_id(
            self.subscription_repo.as_ref(),
            self.stripe_client.as_ref(),
            user_id,
            email.as_deref(),
        )
        .await?;

        let metadata = HashMap::from([
            ("purpose".to_string(), PURPOSE_SUBSCRIPTION.to_string()),
            ("user_id".to_string(), user_id.to_string()),
            ("plan_type".to_string(), PlanType::Pro.to_string()),
        ]);

        let url = self
            .stripe_client
            .create_checkout_session(
                &self.pro_price_id,
                CheckoutMode::Subscription,
                customer_id,
                metadata,
            )
            .await
            .map_err(|err| {
                error!(%user_id, error = ?err, "subscriptions: stripe checkout session creation failed");
                SubscriptionError::Internal(err)
            })?;

        info!(%user_id, "subscriptions: checkout session created");
        Ok(CheckoutUrlDto { url })
    }

    pub async fn create_portal_session(&self, user_id: Uuid) -> UseCaseResult<CheckoutUrlDto> {
        let customer_id = self
            .subscription_repo
            .find_profile(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "subscriptions: failed to load profile");
                SubscriptionError::Internal(err)
            })?
            .and_then(|profile| profile.stripe_customer_id)
            .ok_or(SubscriptionError::NoCustomer)?;

        let url = self
            .stripe_client
            .create_portal_session(&customer_id)
            .await
            .map_err(|err| {
                error!(%user_id, error = ?err, "subscriptions: stripe portal session failed");
                SubscriptionError::Internal(err)
            })?;

        Ok(CheckoutUrlDto { url })
    }

    /// Stripe's hosted receipt when available, else the stored transaction. The payment must
    /// belong to the caller either way.
    pub async fn get_receipt(
        &self,
        user_id: Uuid,
        payment_intent_id: &str,
    ) -> UseCaseResult<ReceiptDto> {
        let stored = self.find_stored_transaction(user_id, payment_intent_id).await?;

        if payment_intent_id.starts_with("pi_") {
            match self
                .stripe_client
                .retrieve_payment_intent(payment_intent_id)
                .await
            {
                Ok(intent) => {
                    if let Some(receipt_url) = intent.receipt_url() {
                        return Ok(ReceiptDto::Hosted { receipt_url });
                    }
                }
                Err(err) => {
                    warn!(
                        %user_id,
                        payment_intent_id,
                        error = ?err,
                        "subscriptions: receipt lookup failed, using stored details"
                    );
                }
            }
        }

        Ok(ReceiptDto::Stored {
            transaction_details: stored,
        })
    }

    async fn find_stored_transaction(
        &self,
        user_id: Uuid,
        payment_intent_id: &str,
    ) -> UseCaseResult<TransactionDetailsDto> {
        if let Some(transaction) = self
            .transaction_repo
            .find_boost_transaction(user_id, payment_intent_id)
            .await?
        {
            return Ok(transaction.into());
        }

        self.transaction_repo
            .find_subscription_transaction(user_id, payment_intent_id)
            .await?
            .map(TransactionDetailsDto::from)
            .ok_or(SubscriptionError::TransactionNotFound)
    }

    pub async fn list_boost_transactions(
        &self,
        user_id: Uuid,
    ) -> UseCaseResult<Vec<BoostTransactionDto>> {
        let transactions = self
            .transaction_repo
            .list_boost_transactions(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "transactions: failed to list boost payments");
                SubscriptionError::Internal(err)
            })?;

        Ok(transactions.into_iter().map(Into::into).collect())
    }

    pub async fn list_subscription_transactions(
        &self,
        user_id: Uuid,
    ) -> UseCaseResult<Vec<SubscriptionTransactionDto>> {
        let transactions = self
            .transaction_repo
            .list_subscription_transactions(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "transactions: failed to list subscription payments");
                SubscriptionError::Internal(err)
            })?;

        Ok(transactions.into_iter().map(Into::into).collect())
    }

    pub async fn handle_stripe_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> UseCaseResult<WebhookOutcome> {
        let event = self
            .stripe_client
            .verify_webhook_signature(payload, signature)
            .map_err(|err| {
                warn!(error = %err, "subscriptions: stripe webhook verification failed");
                SubscriptionError::InvalidWebhook("signature verification failed".into())
            })?;

        info!(
            event_id = event.id.as_deref().unwrap_or_default(),
            event_type = %event.type_,
            "subscriptions: stripe webhook verified"
        );

        let outcome = match event.type_.as_str() {
            "checkout.session.completed" => self.handle_checkout_completed(&event).await?,
            "invoice.paid" => self.handle_invoice_paid(&event).await?,
            "customer.subscription.deleted" => self.handle_subscription_deleted(&event).await?,
            _ => {
                debug!(event_type = %event.type_, "subscriptions: unhandled stripe event type");
                WebhookOutcome::Ignored
            }
        };

        info!(?outcome, "subscriptions: stripe webhook processed");
        Ok(outcome)
    }

    async fn handle_checkout_completed(&self, event: &StripeEvent) -> UseCaseResult<WebhookOutcome> {
        let session = StripeClient::extract_checkout_session(event).ok_or_else(|| {
            SubscriptionError::InvalidWebhook("missing checkout session".to_string())
        })?;
        let metadata = session.metadata.clone().unwrap_or_default();

        match metadata.get("purpose").map(String::as_str) {
            Some(PURPOSE_BOOST) => {
                let payment = self.session_payment(&session).await?;
                let outcome = self
                    .boost_usecase
                    .handle_boost_payment(&metadata, payment)
                    .await
                    .map_err(|err| match err {
                        BoostError::Internal(err) => SubscriptionError::Internal(err),
                        other => SubscriptionError::InvalidWebhook(other.to_string()),
                    })?;
                Ok(WebhookOutcome::Boost(outcome))
            }
            Some(PURPOSE_SUBSCRIPTION) => self.activate_from_checkout(&session, &metadata).await,
            _ => {
                debug!(
                    session_id = session.id.as_deref().unwrap_or_default(),
                    "subscriptions: checkout without a known purpose"
                );
                Ok(WebhookOutcome::Ignored)
            }
        }
    }

    async fn activate_from_checkout(
        &self,
        session: &StripeCheckoutSession,
        metadata: &HashMap<String, String>,
    ) -> UseCaseResult<WebhookOutcome> {
        let user_id = metadata_uuid(metadata, "user_id")
            .ok_or_else(|| SubscriptionError::InvalidWebhook("missing user_id".to_string()))?;

        if let Some(customer_id) = session.customer.as_deref() {
            self.subscription_repo
                .save_stripe_customer_id(user_id, customer_id)
                .await
                .map_err(|err| {
                    error!(%user_id, db_error = ?err, "subscriptions: failed to store customer id");
                    SubscriptionError::Internal(err)
                })?;
        }

        let current_period_end = match session.subscription.as_deref() {
            Some(subscription_id) => self.period_end(subscription_id).await?,
            None => None,
        };
        let payment = self.session_payment(session).await?;

        self.activate(
            user_id,
            session.subscription.clone(),
            current_period_end,
            payment,
            WebhookOutcome::SubscriptionActivated,
        )
        .await
    }

    /// Only renewals grant here; the first invoice is covered by checkout completion.
    async fn handle_invoice_paid(&self, event: &StripeEvent) -> UseCaseResult<WebhookOutcome> {
        let invoice = StripeClient::extract_invoice(event)
            .ok_or_else(|| SubscriptionError::InvalidWebhook("missing invoice".to_string()))?;

        if !invoice.is_renewal() {
            debug!(
                billing_reason = invoice.billing_reason.as_deref().unwrap_or_default(),
                "subscriptions: invoice is not a renewal, skipping"
            );
            return Ok(WebhookOutcome::Ignored);
        }

        let subscription_id = invoice.subscription_id().ok_or_else(|| {
            SubscriptionError::InvalidWebhook("invoice missing subscription id".to_string())
        })?;

        let Some(subscription) = self
            .subscription_repo
            .find_by_provider_subscription_id(&subscription_id)
            .await?
        else {
            warn!(%subscription_id, "subscriptions: renewal for unknown subscription");
            return Ok(WebhookOutcome::Ignored);
        };

        let payment = match invoice.payment_intent.as_deref() {
            Some(payment_intent_id) => self.payment_intent_details(payment_intent_id).await?,
            None => PaymentDetails {
                payment_intent_id: invoice.id.clone().ok_or_else(|| {
                    SubscriptionError::InvalidWebhook("invoice missing id".to_string())
                })?,
                amount_minor: invoice.amount_paid.unwrap_or_default(),
                currency: invoice.currency.clone().unwrap_or_else(|| "cad".to_string()),
                card_brand: None,
                card_last4: None,
            },
        };
        let current_period_end = self.period_end(&subscription_id).await?;

        self.activate(
            subscription.user_id,
            Some(subscription_id),
            current_period_end,
            payment,
            WebhookOutcome::CreditsGranted,
        )
        .await
    }

    async fn handle_subscription_deleted(
        &self,
        event: &StripeEvent,
    ) -> UseCaseResult<WebhookOutcome> {
        let subscription_id = StripeClient::extract_subscription(event)
            .and_then(|subscription| subscription.id)
            .ok_or_else(|| {
                SubscriptionError::InvalidWebhook("missing subscription id".to_string())
            })?;

        let ended = self
            .subscription_repo
            .end_subscription(&subscription_id, SubscriptionStatus::Canceled)
            .await
            .map_err(|err| {
                error!(%subscription_id, db_error = ?err, "subscriptions: failed to end subscription");
                SubscriptionError::Internal(err)
            })?;

        match ended {
            Some(user_id) => {
                info!(%user_id, %subscription_id, "subscriptions: downgraded to free");
                Ok(WebhookOutcome::SubscriptionEnded(user_id))
            }
            None => {
                warn!(%subscription_id, "subscriptions: deletion for unknown subscription");
                Ok(WebhookOutcome::Ignored)
            }
        }
    }

    async fn activate(
        &self,
        user_id: Uuid,
        provider_subscription_id: Option<String>,
        current_period_end: Option<DateTime<Utc>>,
        payment: PaymentDetails,
        applied: WebhookOutcome,
    ) -> UseCaseResult<WebhookOutcome> {
        let plan_type = PlanType::Pro;
        let limits = plan_type.limits();
        let payment_intent_id = payment.payment_intent_id.clone();

        let activated = self
            .subscription_repo
            .activate_subscription(SubscriptionActivation {
                user_id,
                plan_type,
                provider_subscription_id,
                current_period_end,
                payment: Some(InsertSubscriptionTransactionEntity {
                    user_id,
                    plan_type: plan_type.to_string(),
                    amount_minor: payment.amount_minor,
                    currency: payment.currency,
                    card_brand: payment.card_brand,
                    card_last4: payment.card_last4,
                    stripe_payment_intent_id: payment.payment_intent_id,
                }),
                grant_en_vedette: limits.monthly_en_vedette,
                grant_visibilite: limits.monthly_visibilite,
            })
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    %payment_intent_id,
                    db_error = ?err,
                    "subscriptions: activation transaction failed"
                );
                SubscriptionError::Internal(err)
            })?;

        if !activated {
            info!(%user_id, %payment_intent_id, "subscriptions: payment already processed");
            return Ok(WebhookOutcome::Duplicate);
        }

        info!(
            %user_id,
            %payment_intent_id,
            grant_en_vedette = limits.monthly_en_vedette,
            grant_visibilite = limits.monthly_visibilite,
            "subscriptions: pro plan active, credits granted"
        );
        Ok(applied)
    }

    async fn session_payment(&self, session: &StripeCheckoutSession) -> UseCaseResult<PaymentDetails> {
        if let Some(payment_intent_id) = session.payment_intent.as_deref() {
            return self.payment_intent_details(payment_intent_id).await;
        }

        let reference = session.payment_reference().ok_or_else(|| {
            SubscriptionError::InvalidWebhook("checkout session has no payment reference".into())
        })?;
        Ok(PaymentDetails {
            payment_intent_id: reference,
            amount_minor: session.amount_total.unwrap_or_default(),
            currency: session.currency.clone().unwrap_or_else(|| "cad".to_string()),
            card_brand: None,
            card_last4: None,
        })
    }

    async fn payment_intent_details(&self, payment_intent_id: &str) -> UseCaseResult<PaymentDetails> {
        let intent = self
            .stripe_client
            .retrieve_payment_intent(payment_intent_id)
            .await
            .map_err(|err| {
                error!(payment_intent_id, error = ?err, "subscriptions: failed to retrieve payment intent");
                SubscriptionError::Internal(err)
            })?;
        Ok(intent.payment_details())
    }

    async fn period_end(&self, subscription_id: &str) -> UseCaseResult<Option<DateTime<Utc>>> {
        let subscription = self
            .stripe_client
            .retrieve_subscription(subscription_id)
            .await
            .map_err(|err| {
                error!(subscription_id, error = ?err, "subscriptions: failed to retrieve subscription");
                SubscriptionError::Internal(err)
            })?;

        Ok(subscription.period_end().and_then(ts_to_datetime))
    }
}

fn ts_to_datetime(ts: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(ts, 0).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::config_model::StripePrices,
        usecases::{
            plan_resolver::test_support::{profile, subscription},
            stripe_gateway::MockStripeGateway,
        },
    };
    use chrono::Duration;
    use crates::{
        domain::{
            entities::transactions::BoostTransactionEntity,
            repositories::{
                boosts::MockBoostRepository, dashboard::MockDashboardRepository,
                subscriptions::MockSubscriptionRepository,
                transactions::MockTransactionRepository,
            },
            value_objects::boosts::{ApplyBoostOutcome, BoostCredits, BoostState},
        },
        payments::stripe_client::{StripePaymentIntent, StripeSubscription},
    };
    use serde_json::json;

    type TestUseCase = SubscriptionUseCase<
        MockSubscriptionRepository,
        MockTransactionRepository,
        MockDashboardRepository,
        MockBoostRepository,
        MockStripeGateway,
    >;

    struct Mocks {
        subscription_repo: MockSubscriptionRepository,
        transaction_repo: MockTransactionRepository,
        boost_repo: MockBoostRepository,
        stripe: MockStripeGateway,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                subscription_repo: MockSubscriptionRepository::new(),
                transaction_repo: MockTransactionRepository::new(),
                boost_repo: MockBoostRepository::new(),
                stripe: MockStripeGateway::new(),
            }
        }

        fn build(self) -> TestUseCase {
            let subscription_repo = Arc::new(self.subscription_repo);
            let stripe = Arc::new(self.stripe);
            let plan_resolver = PlanResolver::new(
                Arc::clone(&subscription_repo),
                Arc::new(MockDashboardRepository::new()),
            );
            let boost_usecase = BoostUseCase::new(
                Arc::new(self.boost_repo),
                Arc::clone(&subscription_repo),
                Arc::clone(&stripe),
                StripePrices {
                    pro: "price_pro".to_string(),
                    boost_en_vedette: "price_vedette".to_string(),
                    boost_visibilite: "price_visibilite".to_string(),
                },
            );
            SubscriptionUseCase::new(
                subscription_repo,
                Arc::new(self.transaction_repo),
                Arc::new(plan_resolver),
                Arc::new(boost_usecase),
                stripe,
                "price_pro".to_string(),
            )
        }
    }

    fn event(type_: &str, object: serde_json::Value) -> StripeEvent {
        serde_json::from_value(json!({
            "id": "evt_1",
            "type": type_,
            "data": { "object": object }
        }))
        .unwrap()
    }

    fn verified(stripe: &mut MockStripeGateway, type_: &'static str, object: serde_json::Value) {
        stripe
            .expect_verify_webhook_signature()
            .returning(move |_, _| Ok(event(type_, object.clone())));
    }

    fn payment_intent(id: &str, receipt_url: Option<&str>) -> StripePaymentIntent {
        serde_json::from_value(json!({
            "id": id,
            "amount": 999,
            "amount_received": 999,
            "currency": "cad",
            "latest_charge": {
                "receipt_url": receipt_url,
                "payment_method_details": { "card": { "brand": "visa", "last4": "4242" } }
            }
        }))
        .unwrap()
    }

    fn stripe_subscription(period_end: i64) -> StripeSubscription {
        serde_json::from_value(json!({
            "id": "sub_123",
            "status": "active",
            "current_period_end": period_end
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn checkout_refused_when_already_pro() {
        let mut mocks = Mocks::new();
        mocks
            .subscription_repo
            .expect_find_current_subscription()
            .returning(|user_id| Ok(Some(subscription(user_id, "pro", "active"))));
        mocks.stripe.expect_create_checkout_session().never();

        let err = mocks
            .build()
            .create_subscription_checkout(Uuid::new_v4(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, SubscriptionError::AlreadySubscribed));
    }

    #[tokio::test]
    async fn checkout_uses_pro_price_and_subscription_purpose() {
        let user_id = Uuid::new_v4();
        let mut mocks = Mocks::new();
        mocks
            .subscription_repo
            .expect_find_current_subscription()
            .returning(|_| Ok(None));
        mocks
            .subscription_repo
            .expect_find_profile()
            .returning(|user_id| Ok(Some(profile(user_id, false, Some("cus_1")))));
        mocks
            .stripe
            .expect_create_checkout_session()
            .withf(move |price_id, mode, customer_id, metadata| {
                price_id.to_string() == "price_pro"
                    && *mode == CheckoutMode::Subscription
                    && customer_id.as_deref() == Some("cus_1")
                    && metadata.get("purpose").map(String::as_str) == Some(PURPOSE_SUBSCRIPTION)
                    && metadata.get("user_id") == Some(&user_id.to_string())
            })
            .returning(|_, _, _, _| Ok("https://checkout.stripe.com/c/pay".to_string()));

        let dto = mocks
            .build()
            .create_subscription_checkout(user_id, Some("partner@example.com".to_string()))
            .await
            .unwrap();

        assert_eq!(dto.url, "https://checkout.stripe.com/c/pay");
    }

    #[tokio::test]
    async fn portal_requires_a_customer() {
        let mut mocks = Mocks::new();
        mocks
            .subscription_repo
            .expect_find_profile()
            .returning(|user_id| Ok(Some(profile(user_id, false, None))));

        let err = mocks
            .build()
            .create_portal_session(Uuid::new_v4())
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_signature_is_bad_request() {
        let mut mocks = Mocks::new();
        mocks
            .stripe
            .expect_verify_webhook_signature()
            .returning(|_, _| Err(anyhow::anyhow!("no matching signature")));

        let err = mocks
            .build()
            .handle_stripe_webhook(b"{}", "t=1,v1=bad")
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn subscription_checkout_activates_pro_with_monthly_grant() {
        let user_id = Uuid::new_v4();
        let mut mocks = Mocks::new();
        verified(
            &mut mocks.stripe,
            "checkout.session.completed",
            json!({
                "id": "cs_1",
                "mode": "subscription",
                "subscription": "sub_123",
                "customer": "cus_1",
                "invoice": "in_1",
                "amount_total": 1999,
                "currency": "cad",
                "metadata": { "purpose": "subscription", "user_id": user_id.to_string() }
            }),
        );
        mocks
            .stripe
            .expect_retrieve_subscription()
            .returning(|_| Ok(stripe_subscription(1_750_000_000)));
        mocks
            .subscription_repo
            .expect_save_stripe_customer_id()
            .withf(move |uid, customer| *uid == user_id && customer.to_string() == "cus_1")
            .returning(|_, _| Ok(()));
        mocks
            .subscription_repo
            .expect_activate_subscription()
            .withf(move |activation| {
                activation.user_id == user_id
                    && activation.plan_type == PlanType::Pro
                    && activation.provider_subscription_id.as_deref() == Some("sub_123")
                    && activation.current_period_end.is_some()
                    && activation.grant_en_vedette == 1
                    && activation.grant_visibilite == 1
                    && activation
                        .payment
                        .as_ref()
                        .is_some_and(|payment| payment.stripe_payment_intent_id == "in_1")
            })
            .times(1)
            .returning(|_| Ok(true));

        let outcome = mocks
            .build()
            .handle_stripe_webhook(b"{}", "t=1,v1=sig")
            .await
            .unwrap();

        assert_eq!(outcome, WebhookOutcome::SubscriptionActivated);
    }

    #[tokio::test]
    async fn replayed_subscription_payment_is_duplicate() {
        let user_id = Uuid::new_v4();
        let mut mocks = Mocks::new();
        verified(
            &mut mocks.stripe,
            "checkout.session.completed",
            json!({
                "id": "cs_1",
                "invoice": "in_1",
                "metadata": { "purpose": "subscription", "user_id": user_id.to_string() }
            }),
        );
        mocks
            .subscription_repo
            .expect_activate_subscription()
            .returning(|_| Ok(false));

        let outcome = mocks
            .build()
            .handle_stripe_webhook(b"{}", "sig")
            .await
            .unwrap();

        assert_eq!(outcome, WebhookOutcome::Duplicate);
    }

    #[tokio::test]
    async fn boost_checkout_credits_then_applies() {
        let user_id = Uuid::new_v4();
        let offer_id = Uuid::new_v4();
        let mut mocks = Mocks::new();
        verified(
            &mut mocks.stripe,
            "checkout.session.completed",
            json!({
                "id": "cs_2",
                "mode": "payment",
                "payment_intent": "pi_1",
                "metadata": {
                    "purpose": "boost",
                    "user_id": user_id.to_string(),
                    "boost_type": "en_vedette",
                    "entity_type": "offer",
                    "entity_id": offer_id.to_string()
                }
            }),
        );
        mocks
            .stripe
            .expect_retrieve_payment_intent()
            .withf(|id| id.to_string() == "pi_1")
            .returning(|id| Ok(payment_intent(id, None)));
        mocks
            .boost_repo
            .expect_record_boost_purchase()
            .withf(|transaction| {
                transaction.stripe_payment_intent_id == "pi_1"
                    && transaction.card_last4.as_deref() == Some("4242")
            })
            .returning(|_| Ok(true));
        mocks.boost_repo.expect_find_credits().returning(|_| {
            Ok(BoostCredits {
                available_en_vedette: 1,
                available_visibilite: 0,
            })
        });
        mocks
            .boost_repo
            .expect_find_boost_state()
            .returning(|_, _| Ok(Some(BoostState::default())));
        mocks
            .boost_repo
            .expect_apply_boost()
            .returning(|_, _, _, now| {
                Ok(ApplyBoostOutcome::Applied {
                    boosted_at: now,
                    remaining_credits: 0,
                })
            });

        let outcome = mocks
            .build()
            .handle_stripe_webhook(b"{}", "sig")
            .await
            .unwrap();

        match outcome {
            WebhookOutcome::Boost(BoostPaymentOutcome::Applied(applied)) => {
                assert_eq!(applied.entity_id, offer_id);
                assert_eq!(applied.remaining_credits, 0);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn first_invoice_does_not_grant_twice() {
        let mut mocks = Mocks::new();
        verified(
            &mut mocks.stripe,
            "invoice.paid",
            json!({ "id": "in_1", "subscription": "sub_123", "billing_reason": "subscription_create" }),
        );
        mocks.subscription_repo.expect_activate_subscription().never();

        let outcome = mocks
            .build()
            .handle_stripe_webhook(b"{}", "sig")
            .await
            .unwrap();

        assert_eq!(outcome, WebhookOutcome::Ignored);
    }

    #[tokio::test]
    async fn renewal_invoice_grants_monthly_credits() {
        let user_id = Uuid::new_v4();
        let mut mocks = Mocks::new();
        verified(
            &mut mocks.stripe,
            "invoice.paid",
            json!({
                "id": "in_2",
                "billing_reason": "subscription_cycle",
                "amount_paid": 1999,
                "currency": "cad",
                "parent": { "subscription_details": { "subscription": "sub_123" } }
            }),
        );
        mocks
            .subscription_repo
            .expect_find_by_provider_subscription_id()
            .withf(|id| id.to_string() == "sub_123")
            .returning(move |_| Ok(Some(subscription(user_id, "pro", "active"))));
        mocks
            .stripe
            .expect_retrieve_subscription()
            .returning(|_| Ok(stripe_subscription(1_752_000_000)));
        mocks
            .subscription_repo
            .expect_activate_subscription()
            .withf(move |activation| {
                activation.user_id == user_id
                    && activation
                        .payment
                        .as_ref()
                        .is_some_and(|payment| payment.amount_minor == 1999)
            })
            .returning(|_| Ok(true));

        let outcome = mocks
            .build()
            .handle_stripe_webhook(b"{}", "sig")
            .await
            .unwrap();

        assert_eq!(outcome, WebhookOutcome::CreditsGranted);
    }

    #[tokio::test]
    async fn subscription_deleted_downgrades_user() {
        let user_id = Uuid::new_v4();
        let mut mocks = Mocks::new();
        verified(
            &mut mocks.stripe,
            "customer.subscription.deleted",
            json!({ "id": "sub_123", "status": "canceled" }),
        );
        mocks
            .subscription_repo
            .expect_end_subscription()
            .withf(|id, status| id.to_string() == "sub_123" && *status == SubscriptionStatus::Canceled)
            .returning(move |_, _| Ok(Some(user_id)));

        let outcome = mocks
            .build()
            .handle_stripe_webhook(b"{}", "sig")
            .await
            .unwrap();

        assert_eq!(outcome, WebhookOutcome::SubscriptionEnded(user_id));
    }

    #[tokio::test]
    async fn unknown_event_is_acknowledged() {
        let mut mocks = Mocks::new();
        verified(&mut mocks.stripe, "charge.refunded", json!({ "id": "ch_1" }));

        let outcome = mocks
            .build()
            .handle_stripe_webhook(b"{}", "sig")
            .await
            .unwrap();

        assert_eq!(outcome, WebhookOutcome::Ignored);
    }

    fn boost_transaction(user_id: Uuid, intent: &str) -> BoostTransactionEntity {
        BoostTransactionEntity {
            id: Uuid::new_v4(),
            user_id,
            boost_type: "visibilite".to_string(),
            amount_minor: 499,
            currency: "cad".to_string(),
            card_brand: Some("visa".to_string()),
            card_last4: Some("4242".to_string()),
            stripe_payment_intent_id: intent.to_string(),
            created_at: Utc::now() - Duration::days(1),
        }
    }

    #[tokio::test]
    async fn receipt_prefers_stripe_hosted_url() {
        let user_id = Uuid::new_v4();
        let mut mocks = Mocks::new();
        mocks
            .transaction_repo
            .expect_find_boost_transaction()
            .returning(|user_id, intent| Ok(Some(boost_transaction(user_id, intent))));
        mocks
            .stripe
            .expect_retrieve_payment_intent()
            .returning(|id| Ok(payment_intent(id, Some("https://pay.stripe.com/receipts/1"))));

        let receipt = mocks.build().get_receipt(user_id, "pi_1").await.unwrap();

        assert_eq!(
            receipt,
            ReceiptDto::Hosted {
                receipt_url: "https://pay.stripe.com/receipts/1".to_string()
            }
        );
    }

    #[tokio::test]
    async fn receipt_falls_back_to_stored_details() {
        let user_id = Uuid::new_v4();
        let mut mocks = Mocks::new();
        mocks
            .transaction_repo
            .expect_find_boost_transaction()
            .returning(|user_id, intent| Ok(Some(boost_transaction(user_id, intent))));
        mocks
            .stripe
            .expect_retrieve_payment_intent()
            .returning(|_| Err(anyhow::anyhow!("stripe unavailable")));

        let receipt = mocks.build().get_receipt(user_id, "pi_1").await.unwrap();

        match receipt {
            ReceiptDto::Stored { transaction_details } => {
                assert_eq!(transaction_details.amount_minor, 499);
                assert_eq!(transaction_details.description, "Boost visibilite");
            }
            other => panic!("unexpected receipt: {other:?}"),
        }
    }

    #[tokio::test]
    async fn receipt_for_someone_elses_payment_is_not_found() {
        let mut mocks = Mocks::new();
        mocks
            .transaction_repo
            .expect_find_boost_transaction()
            .returning(|_, _| Ok(None));
        mocks
            .transaction_repo
            .expect_find_subscription_transaction()
            .returning(|_, _| Ok(None));
        mocks.stripe.expect_retrieve_payment_intent().never();

        let err = mocks
            .build()
            .get_receipt(Uuid::new_v4(), "pi_other")
            .await
            .unwrap_err();

        assert!(matches!(err, SubscriptionError::TransactionNotFound));
    }
}
