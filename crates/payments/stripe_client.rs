use std::collections::HashMap;

use anyhow::Result;
use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use sha2::Sha256;
use tracing::error;
use uuid::Uuid;

use crate::domain::value_objects::transactions::PaymentDetails;

type HmacSha256 = Hmac<Sha256>;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Minimal Stripe client built on reqwest.
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    webhook_secret: String,
    success_url: String,
    cancel_url: String,
    portal_return_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutMode {
    Payment,
    Subscription,
}

impl CheckoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutMode::Payment => "payment",
            CheckoutMode::Subscription => "subscription",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEvent {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub type_: String,
    pub created: Option<i64>,
    pub livemode: Option<bool>,
    pub data: StripeEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: Option<String>,
    pub mode: Option<String>,
    pub subscription: Option<String>,
    pub customer: Option<String>,
    pub payment_intent: Option<String>,
    pub invoice: Option<String>,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    pub metadata: Option<HashMap<String, String>>,
}

impl StripeCheckoutSession {
    /// Stable key for recording the payment: the payment intent when Stripe gives one,
    /// otherwise the invoice, otherwise the session itself.
    pub fn payment_reference(&self) -> Option<String> {
        self.payment_intent
            .clone()
            .or_else(|| self.invoice.clone())
            .or_else(|| self.id.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeInvoice {
    pub id: Option<String>,
    pub customer: Option<String>,
    pub subscription: Option<String>,
    pub payment_intent: Option<String>,
    pub billing_reason: Option<String>,
    pub amount_paid: Option<i64>,
    pub currency: Option<String>,
    pub period_end: Option<i64>,
    #[serde(default)]
    pub parent: Option<StripeInvoiceParent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeInvoiceParent {
    pub subscription_details: Option<StripeInvoiceSubscriptionDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeInvoiceSubscriptionDetails {
    pub subscription: Option<String>,
}

impl StripeInvoice {
    /// Subscription id, looking at the newer `parent.subscription_details` shape too.
    pub fn subscription_id(&self) -> Option<String> {
        self.subscription.clone().or_else(|| {
            self.parent
                .as_ref()
                .and_then(|parent| parent.subscription_details.as_ref())
                .and_then(|details| details.subscription.clone())
        })
    }

    pub fn is_renewal(&self) -> bool {
        self.billing_reason.as_deref() == Some("subscription_cycle")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscription {
    pub id: Option<String>,
    pub customer: Option<String>,
    pub status: Option<String>,
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub items: StripeSubscriptionItems,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StripeSubscriptionItems {
    pub data: Vec<StripeSubscriptionItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscriptionItem {
    pub current_period_end: Option<i64>,
}

impl StripeSubscription {
    /// Returns the subscription period end timestamp, falling back to the first item when needed.
    pub fn period_end(&self) -> Option<i64> {
        self.current_period_end.or_else(|| {
            self.items
                .data
                .first()
                .and_then(|item| item.current_period_end)
        })
    }
}

/// Payment intent with `latest_charge` expanded.
#[derive(Debug, Clone, Deserialize)]
pub struct StripePaymentIntent {
    pub id: String,
    pub amount: Option<i64>,
    pub amount_received: Option<i64>,
    pub currency: Option<String>,
    pub latest_charge: Option<StripeCharge>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeCharge {
    pub receipt_url: Option<String>,
    pub payment_method_details: Option<StripePaymentMethodDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripePaymentMethodDetails {
    pub card: Option<StripeCardDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeCardDetails {
    pub brand: Option<String>,
    pub last4: Option<String>,
}

impl StripePaymentIntent {
    pub fn receipt_url(&self) -> Option<String> {
        self.latest_charge
            .as_ref()
            .and_then(|charge| charge.receipt_url.clone())
    }

    fn card(&self) -> Option<&StripeCardDetails> {
        self.latest_charge
            .as_ref()
            .and_then(|charge| charge.payment_method_details.as_ref())
            .and_then(|details| details.card.as_ref())
    }

    pub fn payment_details(&self) -> PaymentDetails {
        PaymentDetails {
            payment_intent_id: self.id.clone(),
            amount_minor: self.amount_received.or(self.amount).unwrap_or_default(),
            currency: self.currency.clone().unwrap_or_else(|| "cad".to_string()),
            card_brand: self.card().and_then(|card| card.brand.clone()),
            card_last4: self.card().and_then(|card| card.last4.clone()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorDetails,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetails {
    #[serde(rename = "type")]
    type_: Option<String>,
    code: Option<String>,
    message: Option<String>,
    param: Option<String>,
}

impl StripeClient {
    pub fn new(
        secret_key: String,
        webhook_secret: String,
        success_url: String,
        cancel_url: String,
        portal_return_url: String,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key,
            webhook_secret,
            success_url,
            cancel_url,
            portal_return_url,
        }
    }

    async fn ensure_success(
        resp: reqwest::Response,
        context: &str,
    ) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let request_id = resp
            .headers()
            .get("request-id")
            .or_else(|| resp.headers().get("stripe-request-id"))
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        let (stripe_error_type, stripe_error_code, stripe_error_param, stripe_error_message) =
            match serde_json::from_str::<StripeErrorEnvelope>(&body) {
                Ok(envelope) => {
                    let details = envelope.error;
                    (details.type_, details.code, details.param, details.message)
                }
                Err(_) => (None, None, None, None),
            };

        error!(
            status = %status,
            stripe_request_id = ?request_id,
            stripe_error_type = ?stripe_error_type,
            stripe_error_code = ?stripe_error_code,
            stripe_error_param = ?stripe_error_param,
            stripe_error_message = ?stripe_error_message,
            context = %context,
            "stripe api request failed"
        );

        anyhow::bail!(
            "Stripe API request failed: {} (status {}, request_id={:?})",
            context,
            status,
            request_id
        );
    }

    /// Creates a Stripe customer for the given email/user.
    pub async fn create_customer(&self, email: &str, user_id: Uuid) -> Result<String> {
        // https://stripe.com/docs/api/customers/create
        let body = [
            ("email", email.to_string()),
            ("metadata[user_id]", user_id.to_string()),
        ];

        let resp = self
            .http
            .post(format!("{STRIPE_API_BASE}/customers"))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create customer").await?;

        #[derive(Deserialize)]
        struct CustomerResp {
            id: String,
        }

        let parsed: CustomerResp = resp.json().await?;
        Ok(parsed.id)
    }

    /// Creates a Checkout Session and returns its URL.
    pub async fn create_checkout_session(
        &self,
        price_id: &str,
        mode: CheckoutMode,
        customer_id: Option<String>,
        metadata: HashMap<String, String>,
    ) -> Result<String> {
        // https://stripe.com/docs/api/checkout/sessions/create
        let mut body: Vec<(String, String)> = vec![
            ("mode".to_string(), mode.as_str().to_string()),
            ("line_items[0][price]".to_string(), price_id.to_string()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("success_url".to_string(), self.success_url.clone()),
            ("cancel_url".to_string(), self.cancel_url.clone()),
        ];

        if let Some(customer) = customer_id {
            body.push(("customer".to_string(), customer));
        }

        for (key, value) in &metadata {
            body.push((format!("metadata[{}]", key), value.clone()));
        }

        // Renewal invoices only see subscription metadata, not the session's.
        if mode == CheckoutMode::Subscription {
            for (key, value) in &metadata {
                body.push((format!("subscription_data[metadata][{}]", key), value.clone()));
            }
        }

        let resp = self
            .http
            .post(format!("{STRIPE_API_BASE}/checkout/sessions"))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create checkout session").await?;

        #[derive(Deserialize)]
        struct CheckoutResp {
            url: Option<String>,
        }

        let parsed: CheckoutResp = resp.json().await?;
        parsed
            .url
            .ok_or_else(|| anyhow::anyhow!("Stripe Checkout session URL is missing"))
    }

    /// Opens a billing portal session for an existing customer and returns its URL.
    pub async fn create_portal_session(&self, customer_id: &str) -> Result<String> {
        // https://stripe.com/docs/api/customer_portal/sessions/create
        let body = [
            ("customer", customer_id.to_string()),
            ("return_url", self.portal_return_url.clone()),
        ];

        let resp = self
            .http
            .post(format!("{STRIPE_API_BASE}/billing_portal/sessions"))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create portal session").await?;

        #[derive(Deserialize)]
        struct PortalResp {
            url: String,
        }

        let parsed: PortalResp = resp.json().await?;
        Ok(parsed.url)
    }

    pub async fn retrieve_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<StripePaymentIntent> {
        // https://stripe.com/docs/api/payment_intents/retrieve
        let resp = self
            .http
            .get(format!(
                "{STRIPE_API_BASE}/payment_intents/{}",
                payment_intent_id
            ))
            .query(&[("expand[]", "latest_charge")])
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "retrieve payment intent").await?;

        let intent: StripePaymentIntent = resp.json().await?;
        Ok(intent)
    }

    pub async fn retrieve_subscription(&self, subscription_id: &str) -> Result<StripeSubscription> {
        // https://stripe.com/docs/api/subscriptions/retrieve
        let resp = self
            .http
            .get(format!(
                "{STRIPE_API_BASE}/subscriptions/{}",
                subscription_id
            ))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "retrieve subscription").await?;

        let subscription: StripeSubscription = resp.json().await?;
        Ok(subscription)
    }

    /// Verifies the webhook signature. https://stripe.com/docs/webhooks/signatures
    pub fn verify_webhook_signature(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent> {
        verify_signature(&self.webhook_secret, payload, signature_header)
    }

    pub fn extract_checkout_session(event: &StripeEvent) -> Option<StripeCheckoutSession> {
        serde_json::from_value(event.data.object.clone()).ok()
    }

    pub fn extract_invoice(event: &StripeEvent) -> Option<StripeInvoice> {
        serde_json::from_value(event.data.object.clone()).ok()
    }

    pub fn extract_subscription(event: &StripeEvent) -> Option<StripeSubscription> {
        serde_json::from_value(event.data.object.clone()).ok()
    }
}

fn verify_signature(secret: &str, payload: &[u8], signature_header: &str) -> Result<StripeEvent> {
    let mut timestamp: Option<&str> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in signature_header.split(',') {
        let part = part.trim();
        if let Some(rest) = part.strip_prefix("t=") {
            timestamp = Some(rest);
        } else if let Some(rest) = part.strip_prefix("v1=") {
            signatures.push(rest);
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| anyhow::anyhow!("missing timestamp in stripe-signature"))?;
    if signatures.is_empty() {
        anyhow::bail!("missing v1 in stripe-signature");
    }

    // Stripe may send several v1 entries while a secret is being rolled.
    let matched = signatures.iter().any(|signature| {
        let Ok(provided) = hex::decode(signature) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.verify_slice(&provided).is_ok()
    });

    if !matched {
        anyhow::bail!("invalid webhook signature");
    }

    let event: StripeEvent = serde_json::from_slice(payload)?;
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";

    fn sign(secret: &str, timestamp: &str, payload: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    fn payload() -> Vec<u8> {
        br#"{"id":"evt_1","type":"checkout.session.completed","data":{"object":{"id":"cs_1","mode":"payment","payment_intent":"pi_1","metadata":{"purpose":"boost"}}}}"#.to_vec()
    }

    #[test]
    fn accepts_valid_signature() {
        let payload = payload();
        let header = format!("t=1700000000,v1={}", sign(SECRET, "1700000000", &payload));

        let event = verify_signature(SECRET, &payload, &header).unwrap();

        assert_eq!(event.type_, "checkout.session.completed");
        let session = StripeClient::extract_checkout_session(&event).unwrap();
        assert_eq!(session.payment_reference().as_deref(), Some("pi_1"));
    }

    #[test]
    fn accepts_any_matching_v1_entry() {
        let payload = payload();
        let header = format!(
            "t=1700000000,v1={},v1={}",
            sign("whsec_old", "1700000000", &payload),
            sign(SECRET, "1700000000", &payload)
        );

        assert!(verify_signature(SECRET, &payload, &header).is_ok());
    }

    #[test]
    fn rejects_wrong_secret_and_tampered_payload() {
        let payload = payload();
        let header = format!("t=1700000000,v1={}", sign("whsec_other", "1700000000", &payload));
        assert!(verify_signature(SECRET, &payload, &header).is_err());

        let header = format!("t=1700000000,v1={}", sign(SECRET, "1700000000", &payload));
        let mut tampered = payload.clone();
        tampered.extend_from_slice(b" ");
        assert!(verify_signature(SECRET, &tampered, &header).is_err());
    }

    #[test]
    fn rejects_malformed_header() {
        let payload = payload();
        assert!(verify_signature(SECRET, &payload, "v1=abcd").is_err());
        assert!(verify_signature(SECRET, &payload, "t=1700000000").is_err());
        assert!(verify_signature(SECRET, &payload, "t=1700000000,v1=not-hex").is_err());
    }

    #[test]
    fn invoice_reads_subscription_from_parent() {
        let invoice: StripeInvoice = serde_json::from_value(serde_json::json!({
            "id": "in_1",
            "billing_reason": "subscription_cycle",
            "parent": { "subscription_details": { "subscription": "sub_1" } }
        }))
        .unwrap();

        assert_eq!(invoice.subscription_id().as_deref(), Some("sub_1"));
        assert!(invoice.is_renewal());
    }

    #[test]
    fn payment_intent_exposes_card_and_receipt() {
        let intent: StripePaymentIntent = serde_json::from_value(serde_json::json!({
            "id": "pi_1",
            "amount": 999,
            "amount_received": 999,
            "currency": "cad",
            "latest_charge": {
                "receipt_url": "https://pay.stripe.com/receipts/r_1",
                "payment_method_details": { "card": { "brand": "visa", "last4": "4242" } }
            }
        }))
        .unwrap();

        let details = intent.payment_details();
        assert_eq!(intent.receipt_url().as_deref(), Some("https://pay.stripe.com/receipts/r_1"));
        assert_eq!(details.amount_minor, 999);
        assert_eq!(details.card_brand.as_deref(), Some("visa"));
        assert_eq!(details.card_last4.as_deref(), Some("4242"));
    }
}
