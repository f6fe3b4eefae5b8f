// src/core/service.rs

//! The accepted-request boundary.
//!
//! Owns the injected pools, the dispatcher and the delivery client, and
//! carries the one service-level guarantee: every accepted scan request
//! eventually produces exactly one delivery attempt per registered
//! callback URL, whether the scan succeeded or collapsed into an error
//! report.

use std::sync::Arc;

use tracing::info;

use crate::core::callback::{CallbackDelivery, DeliveryOutcome};
use crate::core::dispatcher::{scan_id_for, ScanDispatcher};
use crate::core::models::ScanRequest;
use crate::core::pool::ScanPools;
use crate::core::scanner::probes::ProbeLibrary;

pub struct ScanService {
    dispatcher: ScanDispatcher,
    delivery: CallbackDelivery,
    pools: Arc<ScanPools>,
}

impl ScanService {
    pub fn new(library: Arc<dyn ProbeLibrary>, pools: Arc<ScanPools>) -> reqwest::Result<Self> {
        Ok(Self {
            dispatcher: ScanDispatcher::new(library, Arc::clone(&pools)),
            delivery: CallbackDelivery::new()?,
            pools,
        })
    }

    /// The administrative knobs, exposed for runtime adjustment.
    pub fn pools(&self) -> &Arc<ScanPools> {
        &self.pools
    }

    /// Processes one accepted request end to end: waits for a scan slot,
    /// runs the scan to a report, and makes every delivery attempt.
    pub async fn process(&self, request: ScanRequest) -> DeliveryOutcome {
        let scan_id = scan_id_for(&request.callback_urls);
        let _permit = self.pools.scan_gate().acquire().await;
        info!(
            host = %request.url,
            scan_id,
            scan_type = %request.scan_type,
            callbacks = request.callback_urls.len(),
            "Accepted scan request."
        );
        let report = self.dispatcher.dispatch(&request, &scan_id).await;
        self.delivery.deliver(&request.callback_urls, &report).await
    }
}
