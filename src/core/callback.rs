// src/core/callback.rs

//! Callback delivery.
//!
//! Serializes the finished report once and performs one best-effort HTTP
//! POST per registered callback URL. Deliveries are independent: a
//! transport failure on one URL is logged and neither delays nor prevents
//! the remaining attempts, and nothing about the outcome feeds back into
//! the report. No retries, no authentication, no response-body
//! consumption.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::core::models::ReportBody;

/// Bounded connect timeout for callback POSTs.
pub const CALLBACK_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const CALLBACK_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Tally of one delivery round, mostly of interest to logs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub attempted: usize,
    pub succeeded: usize,
}

/// Fire-and-forget webhook sender sharing one HTTP client.
pub struct CallbackDelivery {
    client: reqwest::Client,
}

impl CallbackDelivery {
    pub fn new() -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("vantage-tls-scanner/0.1")
            .connect_timeout(CALLBACK_CONNECT_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    /// Attempts exactly one POST per callback URL, in request order.
    ///
    /// The body is the UTF-8 JSON document; its fixed length sets the
    /// Content-Length header. The scan counts as complete once every
    /// attempt has been made, successful or not.
    pub async fn deliver(&self, callback_urls: &[String], report: &ReportBody) -> DeliveryOutcome {
        let json = match serde_json::to_string(report) {
            Ok(json) => json,
            Err(serialize_error) => {
                error!(error = %serialize_error, report = report.name(), "Could not serialize report; skipping delivery.");
                return DeliveryOutcome::default();
            }
        };
        let mut outcome = DeliveryOutcome::default();
        for callback in callback_urls {
            info!(callback, report = report.name(), "Calling back.");
            outcome.attempted += 1;
            let target = match Url::parse(callback) {
                Ok(target) => target,
                Err(parse_error) => {
                    warn!(callback, error = %parse_error, "Invalid callback URL.");
                    continue;
                }
            };
            let response = self
                .client
                .post(target)
                .header(CONTENT_TYPE, CALLBACK_CONTENT_TYPE)
                .body(json.clone())
                .send()
                .await;
            match response {
                Ok(response) => {
                    debug!(callback, status = %response.status(), "Callback delivered.");
                    outcome.succeeded += 1;
                }
                Err(transport_error) => {
                    warn!(callback, error = %transport_error, "Failed to deliver callback.");
                }
            }
        }
        outcome
    }
}
