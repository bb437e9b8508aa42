use std::collections::HashMap;

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use crates::{
    domain::repositories::subscriptions::SubscriptionRepository,
    payments::stripe_client::{
        CheckoutMode, StripeClient, StripeEvent, StripePaymentIntent, StripeSubscription,
    },
};
use tracing::{error, info};
use uuid::Uuid;

/// The slice of Stripe the use cases depend on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StripeGateway: Send + Sync {
    async fn create_customer(&self, email: &str, user_id: Uuid) -> AnyResult<String>;

    async fn create_checkout_session(
        &self,
        price_id: &str,
        mode: CheckoutMode,
        customer_id: Option<String>,
        metadata: HashMap<String, String>,
    ) -> AnyResult<String>;

    async fn create_portal_session(&self, customer_id: &str) -> AnyResult<String>;

    async fn retrieve_payment_intent(&self, payment_intent_id: &str)
    -> AnyResult<StripePaymentIntent>;

    async fn retrieve_subscription(&self, subscription_id: &str) -> AnyResult<StripeSubscription>;

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> AnyResult<StripeEvent>;
}

#[async_trait]
impl StripeGateway for StripeClient {
    async fn create_customer(&self, email: &str, user_id: Uuid) -> AnyResult<String> {
        self.create_customer(email, user_id).await
    }

    async fn create_checkout_session(
        &self,
        price_id: &str,
        mode: CheckoutMode,
        customer_id: Option<String>,
        metadata: HashMap<String, String>,
    ) -> AnyResult<String> {
        self.create_checkout_session(price_id, mode, customer_id, metadata)
            .await
    }

    async fn create_portal_session(&self, customer_id: &str) -> AnyResult<String> {
        self.create_portal_session(customer_id).await
    }

    async fn retrieve_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> AnyResult<StripePaymentIntent> {
        self.retrieve_payment_intent(payment_intent_id).await
    }

    async fn retrieve_subscription(&self, subscription_id: &str) -> AnyResult<StripeSubscription> {
        self.retrieve_subscription(subscription_id).await
    }

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> AnyResult<StripeEvent> {
        self.verify_webhook_signature(payload, signature)
    }
}

/// Stripe customer id for the user: the stored one, or a new one when we know the email.
/// `None` lets Checkout collect the customer itself.
pub async fn resolve_customer_id<S, G>(
    subscription_repo: &S,
    stripe: &G,
    user_id: Uuid,
    email: Option<&str>,
) -> AnyResult<Option<String>>
where
    S: SubscriptionRepository + Send + Sync,
    G: StripeGateway,
{
    let profile = subscription_repo.find_profile(user_id).await?;
    if let Some(customer_id) = profile.and_then(|profile| profile.stripe_customer_id) {
        return Ok(Some(customer_id));
    }

    let Some(email) = email else {
        info!(%user_id, "stripe: no customer on file and no email, checkout will collect it");
        return Ok(None);
    };

    let customer_id = stripe.create_customer(email, user_id).await.map_err(|err| {
        error!(%user_id, error = ?err, "stripe: failed to create customer");
        err
    })?;
    subscription_repo
        .save_stripe_customer_id(user_id, &customer_id)
        .await?;
    info!(%user_id, %customer_id, "stripe: customer created");

    Ok(Some(customer_id))
}

pub fn metadata_uuid(metadata: &HashMap<String, String>, key: &str) -> Option<Uuid> {
    metadata.get(key).and_then(|value| Uuid::parse_str(value).ok())
}
