// src/core/scanner/mod.rs

//! Probe scheduling.
//!
//! Drives the external probe library through the two network phases and
//! the derived-check pass, producing the raw observation snapshot the
//! scoring engine consumes. Phase ordering is a hard data dependency:
//! active probes consume configuration derived from discovery output, so
//! the discovery phase fully completes before any active probe starts.
//! Within a phase, probes run concurrently under the per-scan
//! probe-operation gate with no ordering guarantee among them.

pub mod derived;
pub mod probes;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::core::models::{ProbeKind, Snapshot};
use crate::core::pool::CapacityGate;

use self::derived::standard_derived_checks;
use self::probes::{ProbeConfig, ProbeLibrary, ProbePhase, ScanProbe};

/// Runs the full probe schedule for one scan and returns the union of all
/// phase outputs.
///
/// A probe that panics loses its observations; its category is still
/// recorded as executed, so the affected findings surface as explicit
/// unknown-observation errors instead of silently disappearing.
pub async fn run_probe_schedule(
    config: Arc<ProbeConfig>,
    library: Arc<dyn ProbeLibrary>,
    probe_gate: Arc<CapacityGate>,
) -> Snapshot {
    let mut snapshot = Snapshot::for_target(&config.host, config.port);
    let (discovery, active): (Vec<_>, Vec<_>) = library
        .probes(&config)
        .into_iter()
        .partition(|probe| probe.phase() == ProbePhase::Discovery);

    info!(
        host = %config.host,
        port = config.port,
        discovery = discovery.len(),
        active = active.len(),
        "Starting probe schedule."
    );
    run_phase(discovery, &config, &probe_gate, &mut snapshot).await;
    run_phase(active, &config, &probe_gate, &mut snapshot).await;

    debug!("Network phases complete, running derived checks.");
    for check in standard_derived_checks() {
        check.analyze(&mut snapshot);
    }
    snapshot
}

/// Executes one phase's probes concurrently and merges their partial
/// snapshots in submission order.
async fn run_phase(
    probes: Vec<Box<dyn ScanProbe>>,
    config: &Arc<ProbeConfig>,
    gate: &Arc<CapacityGate>,
    snapshot: &mut Snapshot,
) {
    let mut handles: Vec<(ProbeKind, JoinHandle<Snapshot>)> = Vec::new();
    for probe in probes {
        let kind = probe.kind();
        let config = Arc::clone(config);
        let gate = Arc::clone(gate);
        let handle = tokio::spawn(async move {
            let _permit = gate.acquire().await;
            debug!(probe = %kind, "Running probe.");
            match tokio::task::spawn_blocking(move || probe.run(&config)).await {
                Ok(delta) => delta,
                Err(join_error) => {
                    error!(probe = %kind, error = %join_error, "Probe panicked; observations lost.");
                    Snapshot::default()
                }
            }
        });
        handles.push((kind, handle));
    }
    for (kind, handle) in handles {
        snapshot.executed_probes.push(kind);
        match handle.await {
            Ok(delta) => snapshot.absorb(delta),
            Err(join_error) => {
                error!(probe = %kind, error = %join_error, "Probe task failed; observations lost.");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records its completion into a shared log, so tests can assert the
    /// phase barrier.
    struct TrackingProbe {
        kind: ProbeKind,
        phase: ProbePhase,
        log: Arc<Mutex<Vec<(ProbePhase, ProbeKind)>>>,
        delta: Snapshot,
    }

    impl ScanProbe for TrackingProbe {
        fn kind(&self) -> ProbeKind {
            self.kind
        }

        fn phase(&self) -> ProbePhase {
            self.phase
        }

        fn run(&self, _config: &ProbeConfig) -> Snapshot {
            let mut log = self.log.lock().unwrap();
            log.push((self.phase, self.kind));
            self.delta.clone()
        }
    }

    struct TrackingLibrary {
        log: Arc<Mutex<Vec<(ProbePhase, ProbeKind)>>>,
    }

    impl ProbeLibrary for TrackingLibrary {
        fn probes(&self, _config: &ProbeConfig) -> Vec<Box<dyn ScanProbe>> {
            let mut alive = Snapshot::default();
            alive.server_alive = Some(true);
            alive.supports_tls = Some(true);
            vec![
                Box::new(TrackingProbe {
                    kind: ProbeKind::ProtocolVersion,
                    phase: ProbePhase::Discovery,
                    log: Arc::clone(&self.log),
                    delta: alive,
                }),
                Box::new(TrackingProbe {
                    kind: ProbeKind::CipherSuite,
                    phase: ProbePhase::Discovery,
                    log: Arc::clone(&self.log),
                    delta: Snapshot::default(),
                }),
                Box::new(TrackingProbe {
                    kind: ProbeKind::Heartbleed,
                    phase: ProbePhase::Active,
                    log: Arc::clone(&self.log),
                    delta: Snapshot::default(),
                }),
                Box::new(TrackingProbe {
                    kind: ProbeKind::Poodle,
                    phase: ProbePhase::Active,
                    log: Arc::clone(&self.log),
                    delta: Snapshot::default(),
                }),
            ]
        }
    }

    fn scan_config() -> Arc<ProbeConfig> {
        Arc::new(ProbeConfig {
            host: "example.com".to_string(),
            port: 443,
            starttls: None,
            danger_level: 1,
        })
    }

    #[tokio::test]
    async fn discovery_completes_before_active_starts() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let library = Arc::new(TrackingLibrary {
            log: Arc::clone(&log),
        });
        let gate = CapacityGate::new(4);
        let snapshot = run_probe_schedule(scan_config(), library, gate).await;

        let order = log.lock().unwrap();
        let first_active = order
            .iter()
            .position(|(phase, _)| *phase == ProbePhase::Active)
            .expect("active probes ran");
        assert!(
            order[..first_active]
                .iter()
                .all(|(phase, _)| *phase == ProbePhase::Discovery),
            "discovery must fully precede active: {order:?}"
        );
        assert_eq!(order.len(), 4);
        assert_eq!(snapshot.server_alive, Some(true));
        assert!(snapshot.ran_probe(ProbeKind::Heartbleed));
    }

    struct PanickingProbe;

    impl ScanProbe for PanickingProbe {
        fn kind(&self) -> ProbeKind {
            ProbeKind::Heartbleed
        }

        fn phase(&self) -> ProbePhase {
            ProbePhase::Active
        }

        fn run(&self, _config: &ProbeConfig) -> Snapshot {
            panic!("probe blew up");
        }
    }

    struct PanickingLibrary;

    impl ProbeLibrary for PanickingLibrary {
        fn probes(&self, _config: &ProbeConfig) -> Vec<Box<dyn ScanProbe>> {
            vec![Box::new(PanickingProbe)]
        }
    }

    #[tokio::test]
    async fn panicking_probe_leaves_category_unknown() {
        let gate = CapacityGate::new(4);
        let snapshot =
            run_probe_schedule(scan_config(), Arc::new(PanickingLibrary), gate).await;
        // The category is recorded as executed, its observation stays
        // unknown, and the schedule still completes.
        assert!(snapshot.ran_probe(ProbeKind::Heartbleed));
        assert_eq!(snapshot.heartbleed_vulnerable, None);
    }
}
