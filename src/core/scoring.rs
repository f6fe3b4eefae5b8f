// src/core/scoring.rs

//! The result scoring engine.
//!
//! Maps raw snapshot observations to normalized findings and aggregates
//! them into one composite report per scan. Every capability field of the
//! snapshot is tri-state; an unknown observation surfaces as a per-finding
//! error and is excluded from the score average, while its configured
//! severity still participates in score capping.

use chrono::Utc;
use tracing::debug;

use crate::core::models::{
    CompositeReport, EarlyCcsResult, Finding, MessageInfo, ProbeKind, ScanType, Severity,
    Snapshot, TranslatableMessage,
};

/// Outcome of the finding aggregation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOutcome {
    pub score: u32,
    pub has_error: bool,
}

/// Scores a raw observation snapshot into the composite report for the
/// given scan type.
///
/// Top-level gating precedes all per-category rules: a host that never
/// responded, or responded without negotiating any TLS, yields an error
/// report without findings. Auxiliary mail protocols report the
/// no-response case as `hidden` with a neutral score so they do not drag
/// down a mail super-scan.
pub fn score_snapshot(snapshot: &Snapshot, scan_type: ScanType) -> CompositeReport {
    let name = scan_type.to_string();
    if snapshot.server_alive != Some(true) {
        debug!(host = %snapshot.host, %scan_type, "Host did not respond, emitting gated report.");
        let message = TranslatableMessage::new(
            "PORT_NO_RESPONSE",
            Some(MessageInfo::Host {
                host: snapshot.host.clone(),
            }),
        );
        if scan_type == ScanType::Tls {
            return CompositeReport::new(&name, true, Some(message), 0, Vec::new());
        }
        let mut report = CompositeReport::new(&name, true, Some(message), 100, Vec::new());
        report.score_type = Some(Severity::Hidden);
        return report;
    }
    if snapshot.supports_tls != Some(true) {
        debug!(host = %snapshot.host, %scan_type, "Host negotiates no TLS, emitting gated report.");
        let message = TranslatableMessage::new(
            "TLS_NOT_SUPPORTED",
            Some(MessageInfo::Host {
                host: snapshot.host.clone(),
            }),
        );
        return CompositeReport::new(&name, true, Some(message), 0, Vec::new());
    }

    let mut findings = collect_findings(snapshot);
    let outcome = aggregate_findings(&mut findings);
    CompositeReport::new(&name, outcome.has_error, None, outcome.score, findings)
}

/// Applies every per-category rule whose probe actually executed, in the
/// fixed order the aggregation depends on.
fn collect_findings(snapshot: &Snapshot) -> Vec<Finding> {
    let mut findings = Vec::new();
    if snapshot.ran_probe(ProbeKind::Certificate) {
        findings.push(certificate_expired(snapshot));
        findings.push(certificate_not_valid_yet(snapshot));
        findings.push(certificate_not_sent_by_server(snapshot));
        findings.push(certificate_weak_hash_function(snapshot));
    }
    if snapshot.ran_probe(ProbeKind::CipherSuite) {
        findings.push(supports_anon(snapshot));
        findings.push(supports_export(snapshot));
        findings.push(supports_null(snapshot));
        findings.push(supports_rc4(snapshot));
        findings.push(supports_des(snapshot));
        findings.push(sweet32_vulnerable(snapshot));
    }
    if snapshot.ran_probe(ProbeKind::CipherSuiteOrder) {
        findings.push(cipher_suite_order(snapshot));
    }
    if snapshot.ran_probe(ProbeKind::ProtocolVersion) {
        findings.push(supports_ssl2(snapshot));
        findings.push(supports_ssl3(snapshot));
        findings.push(supports_tls13(snapshot));
    }
    if snapshot.ran_probe(ProbeKind::Bleichenbacher) {
        findings.push(bleichenbacher_vulnerable(snapshot));
    }
    if snapshot.ran_probe(ProbeKind::Compressions) {
        findings.push(crime_vulnerable(snapshot));
    }
    if snapshot.ran_probe(ProbeKind::Heartbleed) {
        findings.push(heartbleed_vulnerable(snapshot));
    }
    if snapshot.ran_probe(ProbeKind::EarlyCcs) {
        findings.push(early_ccs_vulnerable(snapshot));
    }
    if snapshot.ran_probe(ProbeKind::InvalidCurve) {
        findings.push(invalid_curve_ephemeral_vulnerable(snapshot));
        findings.push(invalid_curve_vulnerable(snapshot));
    }
    if snapshot.ran_probe(ProbeKind::PaddingOracle) {
        findings.push(padding_oracle_vulnerable(snapshot));
    }
    if snapshot.ran_probe(ProbeKind::Poodle) {
        findings.push(poodle_vulnerable(snapshot));
    }
    if snapshot.ran_probe(ProbeKind::TlsPoodle) {
        findings.push(tls_poodle_vulnerable(snapshot));
    }
    findings
}

/// Aggregates findings into the composite score, in list order.
///
/// Capping scans every non-hidden finding: a fatal or critical finding
/// whose score undercuts the running maximum lowers the achievable
/// ceiling. Averaging short-circuits once any finding reported an error;
/// values accumulated up to that point are retained. The final severity
/// rewrite (critical to warning, fatal to critical) softens the displayed
/// labels and deliberately runs after the cap was taken.
pub fn aggregate_findings(findings: &mut [Finding]) -> AggregateOutcome {
    let mut max: u32 = 100;
    let mut has_error = false;
    let mut has_critical = false;
    let mut has_warning = false;
    let mut count: u32 = 0;
    let mut sum: u32 = 0;
    for finding in findings.iter() {
        if finding.score_type == Severity::Hidden {
            continue;
        }
        if finding.score < max && finding.score_type.caps_score() {
            max = finding.score;
            has_critical = true;
        }
        if finding.score_type == Severity::Warning {
            has_warning = true;
        }
        has_error |= finding.has_error;
        if !has_error {
            sum += finding.score;
            count += 1;
        }
    }

    let mut score = if count != 0 { sum / count } else { 0 };
    if score > max && (has_critical || has_warning) {
        score = score * max / 100;
    }

    for finding in findings.iter_mut() {
        finding.score_type = match finding.score_type {
            Severity::Critical => Severity::Warning,
            Severity::Fatal => Severity::Critical,
            other => other,
        };
    }

    AggregateOutcome { score, has_error }
}

// --- Shared rule shapes ---

/// The common tri-state rule shape: a definite `true` observation scores
/// the penalized value, anything else scores a clean 100, and an unknown
/// observation additionally carries the generic error marker.
fn tri_state_finding(
    id: &str,
    observed: Option<bool>,
    penalty_score: u32,
    penalty_severity: Severity,
    messages: Option<Vec<TranslatableMessage>>,
) -> Finding {
    let has_error = observed.is_none();
    let error_message = has_error.then(TranslatableMessage::generic_error);
    let (score, score_type) = if observed == Some(true) {
        (penalty_score, penalty_severity)
    } else {
        (100, Severity::Success)
    };
    Finding::new(id, has_error, error_message, score, score_type, messages)
}

/// Collects the offending suite names for one cipher family into a single
/// structured message, or `None` when the family is absent.
fn suite_messages(
    snapshot: &Snapshot,
    message_key: &str,
    matches: impl Fn(&str) -> bool,
) -> Option<Vec<TranslatableMessage>> {
    let offending: Vec<&str> = snapshot
        .cipher_suites
        .iter()
        .map(String::as_str)
        .filter(|name| matches(name))
        .collect();
    if offending.is_empty() {
        return None;
    }
    Some(vec![TranslatableMessage::new(
        message_key,
        Some(MessageInfo::CipherSuites {
            suites: offending.join(" "),
        }),
    )])
}

// --- Certificate rules ---

fn certificate_expired(snapshot: &Snapshot) -> Finding {
    let now = Utc::now();
    let chain = snapshot.certificate_chain.as_ref();
    let messages = chain.and_then(|chain| {
        chain
            .entries
            .iter()
            .find(|entry| entry.valid_to < now)
            .map(|entry| {
                vec![TranslatableMessage::new(
                    "EXPIRED",
                    Some(MessageInfo::Date {
                        date: entry.valid_to.format("%Y-%m-%d").to_string(),
                    }),
                )]
            })
    });
    let contains_expired = chain.and_then(|chain| chain.contains_expired);
    tri_state_finding(
        "CERTIFICATE_EXPIRED",
        contains_expired,
        0,
        Severity::Critical,
        messages,
    )
}

fn certificate_not_valid_yet(snapshot: &Snapshot) -> Finding {
    let now = Utc::now();
    let chain = snapshot.certificate_chain.as_ref();
    let messages = chain.and_then(|chain| {
        chain
            .entries
            .iter()
            .find(|entry| entry.valid_from > now)
            .map(|entry| {
                vec![TranslatableMessage::new(
                    "NOT_YET_VALID",
                    Some(MessageInfo::Date {
                        date: entry.valid_from.format("%Y-%m-%d").to_string(),
                    }),
                )]
            })
    });
    let contains_not_yet_valid = chain.and_then(|chain| chain.contains_not_yet_valid);
    tri_state_finding(
        "CERTIFICATE_NOT_VALID_YET",
        contains_not_yet_valid,
        10,
        Severity::Warning,
        messages,
    )
}

fn certificate_not_sent_by_server(snapshot: &Snapshot) -> Finding {
    let id = "CERTIFICATE_NOT_SENT_BY_SERVER";
    match snapshot.certificate_length {
        None => Finding::new(
            id,
            true,
            Some(TranslatableMessage::generic_error()),
            0,
            Severity::Critical,
            None,
        ),
        Some(length) if length > 0 => Finding::new(id, false, None, 100, Severity::Hidden, None),
        Some(_) => Finding::new(id, false, None, 0, Severity::Critical, None),
    }
}

fn certificate_weak_hash_function(snapshot: &Snapshot) -> Finding {
    use crate::core::models::HashAlgorithm;

    let chain = snapshot.certificate_chain.as_ref();
    let weak_hash = chain.and_then(|chain| {
        chain
            .entries
            .iter()
            .map(|entry| entry.hash_algorithm)
            .find(|algo| matches!(algo, HashAlgorithm::Md5 | HashAlgorithm::Sha1))
    });
    let messages = weak_hash.map(|algo| {
        vec![TranslatableMessage::new(
            "HASH_ALGO",
            Some(MessageInfo::HashAlgorithm {
                hash: algo.to_string(),
            }),
        )]
    });
    let md5 = weak_hash == Some(HashAlgorithm::Md5);
    let contains_weak = chain.and_then(|chain| chain.contains_weak_signature);
    let (penalty_score, penalty_severity) = if md5 {
        (0, Severity::Critical)
    } else {
        (50, Severity::Warning)
    };
    tri_state_finding(
        "CERTIFICATE_WEAK_HASH_FUNCTION",
        contains_weak,
        penalty_score,
        penalty_severity,
        messages,
    )
}

// --- Cipher-suite rules ---

fn supports_anon(snapshot: &Snapshot) -> Finding {
    let messages = suite_messages(snapshot, "ANON_SUITES", |name| name.contains("anon"));
    tri_state_finding(
        "CIPHERSUITE_ANON",
        snapshot.supports_anon_ciphers,
        0,
        Severity::Fatal,
        messages,
    )
}

fn supports_export(snapshot: &Snapshot) -> Finding {
    let messages = suite_messages(snapshot, "EXPORT_SUITES", |name| {
        name.to_uppercase().contains("EXPORT")
    });
    tri_state_finding(
        "CIPHERSUITE_EXPORT",
        snapshot.supports_export_ciphers,
        0,
        Severity::Fatal,
        messages,
    )
}

fn supports_null(snapshot: &Snapshot) -> Finding {
    let messages = suite_messages(snapshot, "NULL_SUITES", |name| {
        name.to_uppercase().contains("NULL")
    });
    tri_state_finding(
        "CIPHERSUITE_NULL",
        snapshot.supports_null_ciphers,
        0,
        Severity::Fatal,
        messages,
    )
}

fn supports_rc4(snapshot: &Snapshot) -> Finding {
    let messages = suite_messages(snapshot, "RC4_SUITES", |name| {
        name.to_uppercase().contains("RC4")
    });
    tri_state_finding(
        "CIPHERSUITE_RC4",
        snapshot.supports_rc4_ciphers,
        30,
        Severity::Warning,
        messages,
    )
}

fn supports_des(snapshot: &Snapshot) -> Finding {
    let messages = suite_messages(snapshot, "DES_SUITES", |name| {
        name.to_uppercase().contains("_DES")
    });
    tri_state_finding(
        "CIPHERSUITE_DES",
        snapshot.supports_des_ciphers,
        0,
        Severity::Warning,
        messages,
    )
}

fn cipher_suite_order(snapshot: &Snapshot) -> Finding {
    let observed = snapshot.enforces_cipher_suite_order;
    let has_error = observed.is_none();
    let error_message = has_error.then(TranslatableMessage::generic_error);
    let (score, score_type) = if observed == Some(true) {
        (100, Severity::Success)
    } else {
        (90, Severity::Warning)
    };
    Finding::new(
        "CIPHERSUITEORDER_ENFORCED",
        has_error,
        error_message,
        score,
        score_type,
        None,
    )
}

// --- Protocol version rules ---

fn supports_ssl2(snapshot: &Snapshot) -> Finding {
    tri_state_finding(
        "PROTOCOLVERSION_SSL2",
        snapshot.supports_ssl2,
        0,
        Severity::Fatal,
        None,
    )
}

fn supports_ssl3(snapshot: &Snapshot) -> Finding {
    tri_state_finding(
        "PROTOCOLVERSION_SSL3",
        snapshot.supports_ssl3,
        0,
        Severity::Critical,
        None,
    )
}

/// The one rule that rewards instead of penalizing: TLS 1.3 support is a
/// bonus, its absence stays hidden and out of the average.
fn supports_tls13(snapshot: &Snapshot) -> Finding {
    let observed = snapshot.supports_tls13;
    let has_error = observed.is_none();
    let error_message = has_error.then(TranslatableMessage::generic_error);
    let (score, score_type) = if observed == Some(true) {
        (100, Severity::Bonus)
    } else {
        (0, Severity::Hidden)
    };
    Finding::new(
        "PROTOCOLVERSION_TLS13",
        has_error,
        error_message,
        score,
        score_type,
        None,
    )
}

// --- Exploit probe rules ---

fn heartbleed_vulnerable(snapshot: &Snapshot) -> Finding {
    tri_state_finding(
        "HEARTBLEED_VULNERABLE",
        snapshot.heartbleed_vulnerable,
        0,
        Severity::Fatal,
        None,
    )
}

fn bleichenbacher_vulnerable(snapshot: &Snapshot) -> Finding {
    tri_state_finding(
        "BLEICHENBACHER_VULNERABLE",
        snapshot.bleichenbacher_vulnerable,
        0,
        Severity::Critical,
        None,
    )
}

fn padding_oracle_vulnerable(snapshot: &Snapshot) -> Finding {
    tri_state_finding(
        "PADDING_ORACLE_VULNERABLE",
        snapshot.padding_oracle_vulnerable,
        0,
        Severity::Critical,
        None,
    )
}

fn poodle_vulnerable(snapshot: &Snapshot) -> Finding {
    tri_state_finding(
        "POODLE_VULNERABLE",
        snapshot.poodle_vulnerable,
        0,
        Severity::Critical,
        None,
    )
}

fn tls_poodle_vulnerable(snapshot: &Snapshot) -> Finding {
    tri_state_finding(
        "TLS_POODLE_VULNERABLE",
        snapshot.tls_poodle_vulnerable,
        0,
        Severity::Critical,
        None,
    )
}

fn invalid_curve_vulnerable(snapshot: &Snapshot) -> Finding {
    tri_state_finding(
        "INVALID_CURVE_VULNERABLE",
        snapshot.invalid_curve_vulnerable,
        0,
        Severity::Critical,
        None,
    )
}

fn invalid_curve_ephemeral_vulnerable(snapshot: &Snapshot) -> Finding {
    tri_state_finding(
        "INVALID_CURVE_EPHEMERAL_VULNERABLE",
        snapshot.invalid_curve_ephemeral_vulnerable,
        0,
        Severity::Warning,
        None,
    )
}

fn crime_vulnerable(snapshot: &Snapshot) -> Finding {
    tri_state_finding(
        "CRIME_VULNERABLE",
        snapshot.crime_vulnerable,
        0,
        Severity::Critical,
        None,
    )
}

fn sweet32_vulnerable(snapshot: &Snapshot) -> Finding {
    tri_state_finding(
        "SWEET32_VULNERABLE",
        snapshot.sweet32_vulnerable,
        80,
        Severity::Warning,
        None,
    )
}

/// Early CCS is only penalized when the probe classified the server as
/// actually exploitable, not merely vulnerable.
fn early_ccs_vulnerable(snapshot: &Snapshot) -> Finding {
    let has_error = snapshot.early_ccs.is_none();
    let error_message = has_error.then(TranslatableMessage::generic_error);
    let exploitable = snapshot.early_ccs == Some(EarlyCcsResult::Exploitable);
    let (score, score_type) = if exploitable {
        (0, Severity::Warning)
    } else {
        (100, Severity::Success)
    };
    Finding::new(
        "EARLYCCS_VULNERABLE",
        has_error,
        error_message,
        score,
        score_type,
        None,
    )
}
