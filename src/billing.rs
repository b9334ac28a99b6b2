//! # Billing Module
//!
//! Hosted checkout and cancellation through serverless billing functions.
//! A failed billing call is reported as an error and never changes the
//! user's tier. [`SandboxBilling`] exists for demos and tests and must be
//! switched on explicitly with `SANDBOX_MODE`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::KitchenError;
use crate::subscription::SubscriptionTier;

const CHECKOUT_FUNCTION: &str = "functions/v1/create-checkout-session";
const CANCEL_FUNCTION: &str = "functions/v1/cancel-subscription";

/// A checkout session the user completes with the payment provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub session_id: String,
    /// Issued by [`SandboxBilling`]; no payment will happen
    #[serde(default)]
    pub sandbox: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutRequest<'a> {
    price_id: &'a str,
    return_url: &'a str,
}

#[async_trait]
pub trait BillingService: Send + Sync {
    async fn start_checkout(&self, price_id: &str, return_url: &str) -> Result<CheckoutSession, KitchenError>;

    /// Cancel the caller's subscription. Returns the tier the account drops to.
    async fn cancel_subscription(&self, access_token: &str) -> Result<SubscriptionTier, KitchenError>;
}

/// Billing through the hosted serverless functions
#[derive(Clone)]
pub struct HttpBilling {
    functions_url: Option<String>,
    anon_key: Option<String>,
    client: Client,
}

impl HttpBilling {
    pub fn new(functions_url: Option<String>, anon_key: Option<String>) -> Self {
        Self {
            functions_url,
            anon_key,
            client: Client::new(),
        }
    }

    fn endpoint(&self, function: &str) -> Result<String, KitchenError> {
        let base = self
            .functions_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| KitchenError::Configuration("Billing functions URL is missing".to_string()))?;
        Ok(format!("{}/{}", base.trim_end_matches('/'), function))
    }

    fn anon_key(&self) -> Result<&str, KitchenError> {
        self.anon_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| KitchenError::Configuration("Billing anon key is missing".to_string()))
    }
}

/// Error text of a failed billing response
///
/// Prefers the `error` field of a JSON body, then the raw body, then the
/// HTTP status.
pub fn billing_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(message) = json["error"].as_str() {
            return message.to_string();
        }
    }
    if !body.trim().is_empty() {
        return body.trim().to_string();
    }
    format!(
        "Error {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("unknown")
    )
}

/// Session id of a successful checkout response
pub fn parse_checkout_response(body: &str) -> Result<CheckoutSession, KitchenError> {
    let json: Value = serde_json::from_str(body)
        .map_err(|e| KitchenError::Billing(format!("Invalid checkout response: {e}")))?;
    let session_id = json["sessionId"]
        .as_str()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| KitchenError::Billing("No session ID returned from server.".to_string()))?;
    Ok(CheckoutSession {
        session_id: session_id.to_string(),
        sandbox: false,
    })
}

#[async_trait]
impl BillingService for HttpBilling {
    async fn start_checkout(&self, price_id: &str, return_url: &str) -> Result<CheckoutSession, KitchenError> {
        if price_id.trim().is_empty() {
            return Err(KitchenError::Configuration("Price ID is missing".to_string()));
        }
        let url = self.endpoint(CHECKOUT_FUNCTION)?;
        let key = self.anon_key()?;

        let response = self
            .client
            .post(&url)
            .bearer_auth(key)
            .json(&CheckoutRequest { price_id, return_url })
            .send()
            .await
            .map_err(|e| KitchenError::Billing(format!("Checkout request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| KitchenError::Billing(format!("Checkout response unreadable: {e}")))?;

        if !status.is_success() {
            let message = billing_error_message(status, &body);
            error!(status = %status, "Checkout failed: {}", message);
            return Err(KitchenError::Billing(message));
        }

        let session = parse_checkout_response(&body)?;
        info!(session_id = %session.session_id, "Checkout session created");
        Ok(session)
    }

    async fn cancel_subscription(&self, access_token: &str) -> Result<SubscriptionTier, KitchenError> {
        let url = self.endpoint(CANCEL_FUNCTION)?;

        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| KitchenError::Billing(format!("Cancellation request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = billing_error_message(status, &body);
            error!(status = %status, "Cancellation failed: {}", message);
            return Err(KitchenError::Billing(message));
        }

        info!("Subscription cancelled");
        Ok(SubscriptionTier::Free)
    }
}

/// Synthetic billing for demos; never contacts a payment provider
#[derive(Debug, Clone, Copy, Default)]
pub struct SandboxBilling;

#[async_trait]
impl BillingService for SandboxBilling {
    async fn start_checkout(&self, price_id: &str, _return_url: &str) -> Result<CheckoutSession, KitchenError> {
        if price_id.trim().is_empty() {
            return Err(KitchenError::Configuration("Price ID is missing".to_string()));
        }
        let session_id = format!("sandbox_{}", Uuid::new_v4().simple());
        warn!(session_id = %session_id, price_id = %price_id, "Sandbox checkout, no payment taken");
        Ok(CheckoutSession {
            session_id,
            sandbox: true,
        })
    }

    async fn cancel_subscription(&self, _access_token: &str) -> Result<SubscriptionTier, KitchenError> {
        warn!("Sandbox cancellation");
        Ok(SubscriptionTier::Free)
    }
}

/// Sandbox billing when explicitly enabled, hosted billing otherwise
pub fn billing_from_config(config: &AppConfig) -> Box<dyn BillingService> {
    if config.sandbox_mode {
        warn!("SANDBOX_MODE is on; checkouts are simulated");
        Box::new(SandboxBilling)
    } else {
        Box::new(HttpBilling::new(
            config.billing_functions_url.clone(),
            config.billing_anon_key.clone(),
        ))
    }
}
