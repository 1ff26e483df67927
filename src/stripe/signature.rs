//! Webhook signature verification.
//!
//! Stripe signs each delivery with HMAC-SHA256 over `"{timestamp}.{body}"`
//! and sends the result in the `Stripe-Signature` header:
//!
//! ```text
//! t=1614556800,v1=5257a869e7ecebeda32affa62cdca3fa51cad7e77a0e56ff536d0ce8e108d8bd
//! ```
//!
//! Verification runs against the exact byte sequence delivered on the wire.
//! Parsing the body before the signature check is a correctness bug: any
//! re-serialization can change the bytes and the signature covers the
//! original ones.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;

use crate::error::SignatureError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the webhook signature
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Verifies `Stripe-Signature` headers against a shared signing secret
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    secret: String,
    tolerance: Duration,
}

/// Parsed form of a `Stripe-Signature` header
#[derive(Debug)]
struct SignatureHeader {
    timestamp: i64,
    /// All `v1` entries; Stripe sends several during secret rotation
    signatures: Vec<String>,
}

impl SignatureVerifier {
    /// Create a verifier with the given signing secret and replay tolerance
    pub fn new(secret: impl Into<String>, tolerance: Duration) -> Self {
        Self {
            secret: secret.into(),
            tolerance,
        }
    }

    /// Verify a raw payload against a signature header.
    ///
    /// Checks, in order: header shape, timestamp freshness, then HMAC match
    /// against every `v1` entry. The HMAC comparison is constant-time via
    /// [`Mac::verify_slice`].
    pub fn verify(&self, payload: &[u8], header: &str) -> Result<(), SignatureError> {
        self.verify_at(payload, header, chrono::Utc::now().timestamp())
    }

    /// Verification with an explicit "now", so tolerance handling is testable
    fn verify_at(&self, payload: &[u8], header: &str, now: i64) -> Result<(), SignatureError> {
        let parsed = parse_header(header)?;

        let age = (now - parsed.timestamp).abs();
        if age > self.tolerance.as_secs() as i64 {
            return Err(SignatureError::StaleTimestamp { age_secs: age });
        }

        for candidate in &parsed.signatures {
            let Ok(decoded) = hex::decode(candidate) else {
                continue;
            };
            let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
                .map_err(|_| SignatureError::MalformedHeader)?;
            mac.update(parsed.timestamp.to_string().as_bytes());
            mac.update(b".");
            mac.update(payload);
            if mac.verify_slice(&decoded).is_ok() {
                return Ok(());
            }
        }

        Err(SignatureError::Mismatch)
    }

    /// Produce a valid header for a payload at the given timestamp.
    ///
    /// Exists for tests and local webhook simulation; the server never signs.
    pub fn sign_header(&self, payload: &[u8], timestamp: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts keys of any size");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        let signature = hex::encode(mac.finalize().into_bytes());
        format!("t={timestamp},v1={signature}")
    }
}

fn parse_header(header: &str) -> Result<SignatureHeader, SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse::<i64>().ok(),
            "v1" => signatures.push(value.to_string()),
            // v0 entries and unknown schemes are ignored
            _ => {}
        }
    }

    match (timestamp, signatures.is_empty()) {
        (Some(timestamp), false) => Ok(SignatureHeader {
            timestamp,
            signatures,
        }),
        _ => Err(SignatureError::MalformedHeader),
    }
}
