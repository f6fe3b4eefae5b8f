// src/core/dispatcher.rs

//! Scan dispatch.
//!
//! Resolves a scan type to its transport profile, drives the probe
//! schedule and the scoring engine, and guarantees that exactly one
//! report comes out of every invocation: any failure inside a scan is
//! converted to a degraded error report at this boundary instead of
//! propagating.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use strum::IntoEnumIterator;
use tracing::{error, info};

use crate::core::models::{
    CompositeReport, MessageInfo, MultiProtocolReport, ReportBody, ScanRequest, ScanType,
    TranslatableMessage,
};
use crate::core::pool::ScanPools;
use crate::core::scanner::probes::{ProbeConfig, ProbeLibrary};
use crate::core::scanner::run_probe_schedule;
use crate::core::scoring::score_snapshot;

/// Message key tagging whole-scan failures on the wire.
const REPORT_CONSTRUCTION: &str = "REPORT_CONSTRUCTION";

/// Deterministic diagnostic identifier for one scan, derived from the
/// concatenated callback URLs. Used only for log correlation, never for
/// correctness.
pub fn scan_id_for(callback_urls: &[String]) -> String {
    let mut hasher = DefaultHasher::new();
    for url in callback_urls {
        url.hash(&mut hasher);
    }
    format!("{:x}", hasher.finish())
}

/// Drives single and multi-protocol scans against the injected probe
/// library.
#[derive(Clone)]
pub struct ScanDispatcher {
    library: Arc<dyn ProbeLibrary>,
    pools: Arc<ScanPools>,
}

impl ScanDispatcher {
    pub fn new(library: Arc<dyn ProbeLibrary>, pools: Arc<ScanPools>) -> Self {
        Self { library, pools }
    }

    /// Produces the report for one scan request: a single composite report
    /// for concrete scan types, a multi-protocol report for `Mail`.
    pub async fn dispatch(&self, request: &ScanRequest, scan_id: &str) -> ReportBody {
        if request.scan_type == ScanType::Mail {
            ReportBody::Multi(self.mail_scan(request, scan_id).await)
        } else {
            ReportBody::Single(self.scan(request.scan_type, request, scan_id).await)
        }
    }

    /// Runs one concrete scan. This is the catch-all boundary: probe
    /// failures, scoring failures and panics all collapse into a degraded
    /// error report with score 0 and no findings.
    pub async fn scan(
        &self,
        scan_type: ScanType,
        request: &ScanRequest,
        scan_id: &str,
    ) -> CompositeReport {
        let Some(profile) = scan_type.transport_profile() else {
            // Only the composite Mail type lacks a profile; it never
            // reaches this path through `dispatch`.
            return failure_report(scan_type, "no transport profile".to_string());
        };
        info!(
            host = %request.url,
            port = profile.port,
            scan_id,
            %scan_type,
            "Scanning."
        );
        let config = Arc::new(ProbeConfig {
            host: request.url.clone(),
            port: profile.port,
            starttls: profile.starttls,
            danger_level: request.danger_level,
        });
        let library = Arc::clone(&self.library);
        let probe_gate = self.pools.probe_gate_for_scan();
        let scan = tokio::spawn(async move {
            let snapshot = run_probe_schedule(config, library, probe_gate).await;
            score_snapshot(&snapshot, scan_type)
        });
        match scan.await {
            Ok(report) => {
                info!(host = %request.url, scan_id, %scan_type, score = report.score, "Finished scanning.");
                report
            }
            Err(join_error) => {
                error!(host = %request.url, scan_id, %scan_type, error = %join_error, "Scan failed.");
                failure_report(scan_type, join_error.to_string())
            }
        }
    }

    /// Fans out over every concrete mail scan type, each as an independent
    /// scan. The aggregate step is all-or-nothing: if anything escapes the
    /// fan-out or final assembly, the partial results are discarded and a
    /// single error-tagged report is returned in their place.
    async fn mail_scan(&self, request: &ScanRequest, scan_id: &str) -> MultiProtocolReport {
        let dispatcher = self.clone();
        let request = request.clone();
        let scan_id = scan_id.to_string();
        let fan_out = tokio::spawn(async move {
            let mut results = Vec::new();
            for scan_type in ScanType::iter().filter(|ty| ty.is_mail_member()) {
                results.push(dispatcher.scan(scan_type, &request, &scan_id).await);
            }
            MultiProtocolReport {
                name: ScanType::Mail.to_string(),
                has_error: false,
                error_message: None,
                score: 0,
                results,
            }
        });
        match fan_out.await {
            Ok(report) => report,
            Err(join_error) => {
                error!(error = %join_error, "Mail fan-out failed; discarding partial results.");
                MultiProtocolReport {
                    name: ScanType::Mail.to_string(),
                    has_error: true,
                    error_message: Some(TranslatableMessage::new(
                        REPORT_CONSTRUCTION,
                        Some(MessageInfo::Error {
                            error: join_error.to_string(),
                        }),
                    )),
                    score: 0,
                    results: Vec::new(),
                }
            }
        }
    }
}

/// The degraded report emitted when a scan fails past every inner
/// safeguard.
fn failure_report(scan_type: ScanType, error: String) -> CompositeReport {
    CompositeReport::new(
        &scan_type.to_string(),
        true,
        Some(TranslatableMessage::new(
            REPORT_CONSTRUCTION,
            Some(MessageInfo::Error { error }),
        )),
        0,
        Vec::new(),
    )
}
