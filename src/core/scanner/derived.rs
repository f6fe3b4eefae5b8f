// src/core/scanner/derived.rs

//! Derived checks: snapshot-only vulnerability recomputation.
//!
//! These run strictly after both network phases and perform no I/O; each
//! one re-reads the negotiated cipher-suite list and writes its verdict
//! back into the snapshot. A check stays silent (field remains unknown)
//! when the cipher-suite probe never ran.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::core::models::{ProbeKind, Snapshot};

/// A check computed purely from already-collected observations.
pub trait DerivedCheck: Send + Sync {
    fn name(&self) -> &'static str;
    fn analyze(&self, snapshot: &mut Snapshot);
}

/// The standard derived checks, in the order they run after the network
/// phases.
pub fn standard_derived_checks() -> Vec<Box<dyn DerivedCheck>> {
    vec![
        Box::new(Sweet32Check),
        Box::new(FreakCheck),
        Box::new(LogjamCheck),
    ]
}

static SWEET32_SUITES: Lazy<Regex> = Lazy::new(|| Regex::new(r"3DES|IDEA").unwrap());
static FREAK_SUITES: Lazy<Regex> = Lazy::new(|| Regex::new(r"RSA_EXPORT").unwrap());
static LOGJAM_SUITES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"DHE?_(RSA|DSS|anon)_EXPORT").unwrap());

fn flag_from_suites(snapshot: &Snapshot, pattern: &Regex) -> Option<bool> {
    if !snapshot.ran_probe(ProbeKind::CipherSuite) {
        return None;
    }
    Some(
        snapshot
            .cipher_suites
            .iter()
            .any(|name| pattern.is_match(name)),
    )
}

/// Sweet32: 64-bit block ciphers (3DES, IDEA) overexposed to birthday
/// attacks on long-lived connections.
pub struct Sweet32Check;

impl DerivedCheck for Sweet32Check {
    fn name(&self) -> &'static str {
        "sweet32"
    }

    fn analyze(&self, snapshot: &mut Snapshot) {
        snapshot.sweet32_vulnerable = flag_from_suites(snapshot, &SWEET32_SUITES);
        if snapshot.sweet32_vulnerable == Some(true) {
            debug!(host = %snapshot.host, "64-bit block ciphers offered, flagging Sweet32.");
        }
    }
}

/// Freak: export-grade RSA suites allow factoring the downgraded key.
pub struct FreakCheck;

impl DerivedCheck for FreakCheck {
    fn name(&self) -> &'static str {
        "freak"
    }

    fn analyze(&self, snapshot: &mut Snapshot) {
        snapshot.freak_vulnerable = flag_from_suites(snapshot, &FREAK_SUITES);
        if snapshot.freak_vulnerable == Some(true) {
            debug!(host = %snapshot.host, "Export RSA suites offered, flagging Freak.");
        }
    }
}

/// Logjam: export-grade Diffie-Hellman suites with breakable group sizes.
pub struct LogjamCheck;

impl DerivedCheck for LogjamCheck {
    fn name(&self) -> &'static str {
        "logjam"
    }

    fn analyze(&self, snapshot: &mut Snapshot) {
        snapshot.logjam_vulnerable = flag_from_suites(snapshot, &LOGJAM_SUITES);
        if snapshot.logjam_vulnerable == Some(true) {
            debug!(host = %snapshot.host, "Export DH suites offered, flagging Logjam.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with_suites(suites: &[&str]) -> Snapshot {
        let mut snapshot = Snapshot::for_target("example.com", 443);
        snapshot.executed_probes.push(ProbeKind::CipherSuite);
        snapshot.cipher_suites = suites.iter().map(|s| s.to_string()).collect();
        snapshot
    }

    #[test]
    fn sweet32_flags_3des_and_idea() {
        let mut snapshot = snapshot_with_suites(&["TLS_RSA_WITH_3DES_EDE_CBC_SHA"]);
        Sweet32Check.analyze(&mut snapshot);
        assert_eq!(snapshot.sweet32_vulnerable, Some(true));

        let mut snapshot = snapshot_with_suites(&["TLS_RSA_WITH_IDEA_CBC_SHA"]);
        Sweet32Check.analyze(&mut snapshot);
        assert_eq!(snapshot.sweet32_vulnerable, Some(true));

        let mut snapshot = snapshot_with_suites(&["TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256"]);
        Sweet32Check.analyze(&mut snapshot);
        assert_eq!(snapshot.sweet32_vulnerable, Some(false));
    }

    #[test]
    fn freak_flags_export_rsa() {
        let mut snapshot = snapshot_with_suites(&["TLS_RSA_EXPORT_WITH_RC4_40_MD5"]);
        FreakCheck.analyze(&mut snapshot);
        assert_eq!(snapshot.freak_vulnerable, Some(true));
    }

    #[test]
    fn logjam_flags_export_dh() {
        let mut snapshot =
            snapshot_with_suites(&["TLS_DHE_RSA_EXPORT_WITH_DES40_CBC_SHA"]);
        LogjamCheck.analyze(&mut snapshot);
        assert_eq!(snapshot.logjam_vulnerable, Some(true));

        let mut snapshot = snapshot_with_suites(&["TLS_RSA_EXPORT_WITH_RC4_40_MD5"]);
        LogjamCheck.analyze(&mut snapshot);
        assert_eq!(snapshot.logjam_vulnerable, Some(false));
    }

    #[test]
    fn checks_stay_silent_without_cipher_probe() {
        let mut snapshot = Snapshot::for_target("example.com", 443);
        snapshot.cipher_suites = vec!["TLS_RSA_WITH_3DES_EDE_CBC_SHA".to_string()];
        for check in standard_derived_checks() {
            check.analyze(&mut snapshot);
        }
        assert_eq!(snapshot.sweet32_vulnerable, None);
        assert_eq!(snapshot.freak_vulnerable, None);
        assert_eq!(snapshot.logjam_vulnerable, None);
    }
}
