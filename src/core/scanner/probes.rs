// src/core/scanner/probes.rs

//! The probe boundary.
//!
//! Actual wire-level vulnerability detection lives outside this crate; a
//! probe library hands the scheduler a set of [`ScanProbe`]
//! implementations, each of which performs its own blocking network I/O
//! and reports back a partial snapshot with only the fields it observed.

use crate::core::models::{ProbeKind, Snapshot, StarttlsProtocol};

/// Which scheduling phase a probe belongs to. Discovery probes fingerprint
/// capabilities passively; active probes attempt the actual exploits and
/// depend on discovery output, so the scheduler never interleaves the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbePhase {
    Discovery,
    Active,
}

/// Transport and intensity parameters handed to every probe of one scan.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub host: String,
    pub port: u16,
    pub starttls: Option<StarttlsProtocol>,
    /// How aggressively active probes may behave, forwarded verbatim from
    /// the scan request.
    pub danger_level: u8,
}

/// One externally-implemented network probe.
///
/// `run` blocks; the scheduler executes it on the blocking thread pool
/// under the per-scan probe-operation gate. The returned snapshot is a
/// partial observation that gets merged into the scan's snapshot; fields
/// the probe could not determine stay `None` and surface downstream as
/// per-finding errors.
pub trait ScanProbe: Send + Sync {
    fn kind(&self) -> ProbeKind;
    fn phase(&self) -> ProbePhase;
    fn run(&self, config: &ProbeConfig) -> Snapshot;
}

/// The probe set supplied by the external probing library.
pub trait ProbeLibrary: Send + Sync {
    fn probes(&self, config: &ProbeConfig) -> Vec<Box<dyn ScanProbe>>;
}
