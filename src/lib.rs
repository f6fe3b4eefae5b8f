// src/lib.rs

//! TLS/STARTTLS posture assessment as a library.
//!
//! Converts raw protocol observations supplied by an external probe
//! library into a normalized, severity-weighted vulnerability report, and
//! delivers that report to caller-registered webhook endpoints. The
//! request-accepting layer (HTTP, queueing) is the embedder's concern:
//! construct a [`core::service::ScanService`] with a probe library and a
//! [`core::pool::ScanPools`] handle, then feed it [`core::models::ScanRequest`]
//! values.

pub mod core;
pub mod logging;

pub use crate::core::models::{
    CompositeReport, Finding, MultiProtocolReport, ReportBody, ScanRequest, ScanType, Severity,
    Snapshot,
};
pub use crate::core::service::ScanService;
