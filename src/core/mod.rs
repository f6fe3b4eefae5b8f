// src/core/mod.rs

/// Data structures shared throughout the crate: findings, reports, scan
/// types and the raw observation snapshot.
pub mod models;

/// Static descriptions and remediation guidance for every finding code
/// the scoring engine can emit.
pub mod knowledge_base;

/// Bounded capacity gates for scan and per-scan probe concurrency.
pub mod pool;

/// Probe scheduling: the two network phases plus the derived checks.
pub mod scanner;

/// The result scoring engine: per-category rules and score aggregation.
pub mod scoring;

/// Scan dispatch: transport resolution, fan-out and the catch-all report
/// boundary.
pub mod dispatcher;

/// Best-effort webhook delivery of finished reports.
pub mod callback;

/// The accepted-request boundary tying pools, dispatch and delivery
/// together.
pub mod service;
