//! Application configuration loaded from the process environment.
//!
//! Secrets (Stripe API key, webhook signing secret, database URL) are never
//! taken from CLI flags; they come from the environment, with `.env` support
//! for local development.

use std::time::Duration;

use crate::error::{Error, Result};

/// Default ISO 4217 currency code when the initiator omits one
pub const DEFAULT_CURRENCY: &str = "usd";

/// Replay tolerance for webhook signature timestamps
pub const DEFAULT_SIGNATURE_TOLERANCE: Duration = Duration::from_secs(300);

/// Timeout for outbound Stripe API calls
pub const DEFAULT_PROCESSOR_TIMEOUT: Duration = Duration::from_secs(15);

/// Runtime configuration for the gateway
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Stripe secret API key (`sk_...`)
    pub stripe_secret_key: String,

    /// Webhook endpoint signing secret (`whsec_...`)
    pub webhook_secret: String,

    /// Postgres connection string; absent when running with the in-memory store
    pub database_url: Option<String>,

    /// Currency applied to checkout sessions
    pub currency: String,

    /// Redirect target after a completed checkout. Stripe substitutes the
    /// `{CHECKOUT_SESSION_ID}` placeholder before redirecting.
    pub success_url: String,

    /// Redirect target after an abandoned checkout
    pub cancel_url: String,

    /// Tolerance window for webhook signature timestamps
    pub signature_tolerance: Duration,

    /// Timeout for Stripe API requests
    pub processor_timeout: Duration,
}

impl AppConfig {
    /// Load configuration from the environment, reading `.env` if present.
    ///
    /// `STRIPE_SECRET_KEY` and `STRIPE_WEBHOOK_SECRET` are required;
    /// everything else has a default. `DATABASE_URL` is optional so the
    /// binary can run with `--memory-store`, but the Postgres store refuses
    /// to start without it.
    pub fn from_env(base_url: &str) -> Result<Self> {
        dotenvy::dotenv().ok();

        let required = |name: &str| {
            std::env::var(name)
                .map_err(|_| Error::Config(format!("missing environment variable '{name}'")))
        };

        let stripe_secret_key = required("STRIPE_SECRET_KEY")?;
        let webhook_secret = required("STRIPE_WEBHOOK_SECRET")?;
        let database_url = std::env::var("DATABASE_URL").ok();

        let currency = std::env::var("CHECKOUT_CURRENCY")
            .unwrap_or_else(|_| DEFAULT_CURRENCY.to_string())
            .to_ascii_lowercase();
        if currency.len() != 3 {
            return Err(Error::Config(format!(
                "CHECKOUT_CURRENCY must be a three-letter code, got '{currency}'"
            )));
        }

        let success_url = std::env::var("CHECKOUT_SUCCESS_URL").unwrap_or_else(|_| {
            format!("{base_url}/checkout/success?session_id={{CHECKOUT_SESSION_ID}}")
        });
        let cancel_url = std::env::var("CHECKOUT_CANCEL_URL")
            .unwrap_or_else(|_| format!("{base_url}/checkout/cancel"));

        Ok(Self {
            stripe_secret_key,
            webhook_secret,
            database_url,
            currency,
            success_url,
            cancel_url,
            signature_tolerance: DEFAULT_SIGNATURE_TOLERANCE,
            processor_timeout: DEFAULT_PROCESSOR_TIMEOUT,
        })
    }

    /// Fixed configuration for tests; no environment involved.
    pub fn test_config() -> Self {
        Self {
            stripe_secret_key: "sk_test_123".to_string(),
            webhook_secret: "whsec_test123secret456".to_string(),
            database_url: None,
            currency: DEFAULT_CURRENCY.to_string(),
            success_url: "http://localhost:8080/checkout/success?session_id={CHECKOUT_SESSION_ID}"
                .to_string(),
            cancel_url: "http://localhost:8080/checkout/cancel".to_string(),
            signature_tolerance: DEFAULT_SIGNATURE_TOLERANCE,
            processor_timeout: DEFAULT_PROCESSOR_TIMEOUT,
        }
    }
}
