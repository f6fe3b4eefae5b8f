// src/core/pool.rs

//! Bounded capacity gates for scan and probe concurrency.
//!
//! Two knobs bound the service: how many scans run concurrently
//! process-wide, and how many network probe operations a single scan may
//! have in flight. Both are plain handle objects constructed once at
//! startup and injected where needed; sizes are adjustable at runtime,
//! with decreases taking effect only as in-flight work drains.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::Notify;
use tracing::{info, warn};

pub const DEFAULT_CONCURRENT_SCANS: usize = 10;
pub const DEFAULT_PROBE_OPERATIONS_PER_SCAN: usize = 64;

#[derive(Debug)]
struct GateState {
    limit: usize,
    in_flight: usize,
}

/// A bounded admission gate. `acquire` waits until the number of in-flight
/// permits drops below the limit; dropping the returned permit releases
/// the slot.
#[derive(Debug)]
pub struct CapacityGate {
    state: Mutex<GateState>,
    notify: Notify,
}

/// An admission slot held for the duration of one unit of work.
#[derive(Debug)]
pub struct CapacityPermit {
    gate: Arc<CapacityGate>,
}

impl CapacityGate {
    pub fn new(limit: usize) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(GateState {
                limit,
                in_flight: 0,
            }),
            notify: Notify::new(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        // The gate stays usable even if a holder panicked mid-update.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Waits for a free slot and claims it.
    pub async fn acquire(self: &Arc<Self>) -> CapacityPermit {
        loop {
            let notified = self.notify.notified();
            {
                let mut state = self.lock();
                if state.in_flight < state.limit {
                    state.in_flight += 1;
                    return CapacityPermit {
                        gate: Arc::clone(self),
                    };
                }
            }
            notified.await;
        }
    }

    /// Administrative size adjustment. Increases open slots immediately;
    /// decreases leave in-flight work untouched and only bite as permits
    /// are returned.
    pub fn resize(&self, new_limit: usize) {
        let (old_limit, in_flight) = {
            let mut state = self.lock();
            let old = state.limit;
            state.limit = new_limit;
            (old, state.in_flight)
        };
        if new_limit < old_limit && in_flight > new_limit {
            warn!(
                old_limit,
                new_limit,
                in_flight,
                "Capacity decreased below in-flight count; change takes effect as work drains."
            );
        } else {
            info!(old_limit, new_limit, "Capacity limit adjusted.");
        }
        self.notify.notify_waiters();
    }

    pub fn limit(&self) -> usize {
        self.lock().limit
    }

    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }
}

impl Drop for CapacityPermit {
    fn drop(&mut self) {
        {
            let mut state = self.gate.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
        }
        self.gate.notify.notify_one();
    }
}

/// The two pool-size settings of the service, bundled for injection.
///
/// The scan gate is shared process-wide; the probe-operation limit is a
/// per-scan budget, so each scan gets a fresh gate sized from the current
/// setting.
#[derive(Debug)]
pub struct ScanPools {
    scan_gate: Arc<CapacityGate>,
    probe_operations_per_scan: AtomicUsize,
}

impl ScanPools {
    pub fn new(concurrent_scans: usize, probe_operations_per_scan: usize) -> Arc<Self> {
        info!(
            concurrent_scans,
            probe_operations_per_scan, "Initializing scan pools."
        );
        Arc::new(Self {
            scan_gate: CapacityGate::new(concurrent_scans),
            probe_operations_per_scan: AtomicUsize::new(probe_operations_per_scan),
        })
    }

    pub fn with_defaults() -> Arc<Self> {
        Self::new(DEFAULT_CONCURRENT_SCANS, DEFAULT_PROBE_OPERATIONS_PER_SCAN)
    }

    /// The process-wide scan admission gate.
    pub fn scan_gate(&self) -> &Arc<CapacityGate> {
        &self.scan_gate
    }

    /// A fresh probe-operation gate for one scan, sized from the current
    /// per-scan setting.
    pub fn probe_gate_for_scan(&self) -> Arc<CapacityGate> {
        CapacityGate::new(self.probe_operations_per_scan.load(Ordering::Relaxed))
    }

    pub fn set_concurrent_scans(&self, limit: usize) {
        self.scan_gate.resize(limit);
    }

    /// Adjusts the per-scan probe budget; applies to scans started after
    /// the call.
    pub fn set_probe_operations_per_scan(&self, limit: usize) {
        info!(limit, "Adjusting per-scan probe operation budget.");
        self.probe_operations_per_scan.store(limit, Ordering::Relaxed);
    }

    pub fn probe_operations_per_scan(&self) -> usize {
        self.probe_operations_per_scan.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn gate_admits_up_to_limit() {
        let gate = CapacityGate::new(2);
        let first = gate.acquire().await;
        let _second = gate.acquire().await;
        assert_eq!(gate.in_flight(), 2);

        let waiter = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move {
                let _permit = gate.acquire().await;
            })
        };
        // The third acquire must block until a permit is returned.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(first);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should be admitted after release")
            .unwrap();
    }

    #[tokio::test]
    async fn decrease_takes_effect_as_work_drains() {
        let gate = CapacityGate::new(2);
        let first = gate.acquire().await;
        let second = gate.acquire().await;

        gate.resize(1);
        // Both existing permits stay valid.
        assert_eq!(gate.in_flight(), 2);

        drop(first);
        drop(second);
        assert_eq!(gate.in_flight(), 0);

        // Only one slot is available now.
        let _held = gate.acquire().await;
        let waiter = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move {
                let _permit = gate.acquire().await;
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());
        waiter.abort();
    }

    #[tokio::test]
    async fn increase_unblocks_waiters() {
        let gate = CapacityGate::new(1);
        let _held = gate.acquire().await;
        let waiter = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move {
                let _permit = gate.acquire().await;
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        gate.resize(2);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should be admitted after resize")
            .unwrap();
    }

    #[tokio::test]
    async fn probe_budget_applies_to_new_scans_only() {
        let pools = ScanPools::new(4, 8);
        let before = pools.probe_gate_for_scan();
        pools.set_probe_operations_per_scan(2);
        let after = pools.probe_gate_for_scan();
        assert_eq!(before.limit(), 8);
        assert_eq!(after.limit(), 2);
    }
}
