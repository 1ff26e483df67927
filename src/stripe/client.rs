//! Stripe REST client for checkout sessions.
//!
//! Only two calls matter here: creating a hosted checkout session and
//! retrieving one for manual reconciliation. Both live behind the
//! [`CheckoutProcessor`] trait so handlers receive an injected client and
//! tests substitute fakes.

use serde::Deserialize;

use crate::config::AppConfig;
use crate::error::{ProcessorError, Result};
use crate::stripe::events::CheckoutSession;

/// Stripe API base URL
pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// Inputs for creating a hosted checkout session
#[derive(Debug, Clone)]
pub struct CreateSessionRequest {
    /// Customer email, passed through to the hosted page
    pub customer_email: String,
    /// Line item label shown on the hosted page
    pub product_name: String,
    /// Amount in the smallest currency unit; already validated positive
    pub amount: i64,
}

/// Outbound collaborator boundary for the payment processor
#[async_trait::async_trait]
pub trait CheckoutProcessor: Send + Sync + 'static {
    /// Create a hosted checkout session for a single line item
    async fn create_session(&self, request: CreateSessionRequest) -> Result<CheckoutSession>;

    /// Retrieve the authoritative state of an existing session
    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession>;
}

/// Error envelope returned by the Stripe API
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// [`CheckoutProcessor`] implementation over the Stripe REST API
#[derive(Debug, Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
    currency: String,
    success_url: String,
    cancel_url: String,
}

impl StripeClient {
    /// Build a client from configuration.
    ///
    /// Uses rustls and a request timeout; a hung processor call must not pin
    /// a handler past the configured deadline.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(config.processor_timeout)
            .build()
            .map_err(ProcessorError::Request)?;

        Ok(Self {
            http,
            api_base: DEFAULT_API_BASE.to_string(),
            secret_key: config.stripe_secret_key.clone(),
            currency: config.currency.clone(),
            success_url: config.success_url.clone(),
            cancel_url: config.cancel_url.clone(),
        })
    }

    /// Override the API base URL (stripe-mock, test servers)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    async fn decode_session(response: reqwest::Response) -> Result<CheckoutSession> {
        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ApiErrorEnvelope>().await {
                Ok(envelope) => envelope
                    .error
                    .message
                    .unwrap_or_else(|| "no error message".to_string()),
                Err(_) => "unreadable error response".to_string(),
            };
            return Err(ProcessorError::Api {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let session = response
            .json::<CheckoutSession>()
            .await
            .map_err(|e| ProcessorError::Decode(e.to_string()))?;
        Ok(session)
    }
}

#[async_trait::async_trait]
impl CheckoutProcessor for StripeClient {
    async fn create_session(&self, request: CreateSessionRequest) -> Result<CheckoutSession> {
        let amount = request.amount.to_string();
        let form: &[(&str, &str)] = &[
            ("mode", "payment"),
            ("customer_email", &request.customer_email),
            ("success_url", &self.success_url),
            ("cancel_url", &self.cancel_url),
            ("line_items[0][quantity]", "1"),
            ("line_items[0][price_data][currency]", &self.currency),
            ("line_items[0][price_data][unit_amount]", &amount),
            (
                "line_items[0][price_data][product_data][name]",
                &request.product_name,
            ),
        ];

        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(form)
            .send()
            .await
            .map_err(ProcessorError::Request)?;

        let session = Self::decode_session(response).await?;
        tracing::debug!(session_id = %session.id, "checkout session created");
        Ok(session)
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession> {
        let response = self
            .http
            .get(format!(
                "{}/v1/checkout/sessions/{session_id}",
                self.api_base
            ))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(ProcessorError::Request)?;

        Self::decode_session(response).await
    }
}

/// Processor fake returning a fixed session; used by tests and dry runs
#[derive(Debug, Clone)]
pub struct FixedSessionProcessor {
    session: CheckoutSession,
}

impl FixedSessionProcessor {
    /// Fake a processor that always yields `session`
    pub fn new(session: CheckoutSession) -> Self {
        Self { session }
    }
}

#[async_trait::async_trait]
impl CheckoutProcessor for FixedSessionProcessor {
    async fn create_session(&self, _request: CreateSessionRequest) -> Result<CheckoutSession> {
        Ok(self.session.clone())
    }

    async fn retrieve_session(&self, _session_id: &str) -> Result<CheckoutSession> {
        Ok(self.session.clone())
    }
}
