// src/core/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

// --- Severity ---

/// Severity attached to a single finding.
///
/// The variant order is the total order used for score capping: only
/// `Critical` and `Fatal` findings can lower the achievable score ceiling,
/// `Warning` cannot, `Hidden` is excluded from averaging entirely and
/// `Bonus` rewards instead of penalizing.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, Display, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Hidden,
    Success,
    Bonus,
    Warning,
    Critical,
    Fatal,
}

impl Severity {
    /// Whether a finding of this severity participates in score capping.
    pub fn caps_score(self) -> bool {
        self >= Severity::Critical
    }
}

// --- Structured, translateable messages ---

/// Structured placeholder payload carried alongside a message key.
///
/// The key is resolved against translation resources by downstream
/// consumers; this crate only emits the key and the raw values needed to
/// fill the translated template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum MessageInfo {
    Host { host: String },
    Date { date: String },
    HashAlgorithm { hash: String },
    CipherSuites { suites: String },
    Error { error: String },
}

/// A message key plus structured placeholder values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TranslatableMessage {
    pub message_key: String,
    pub info: Option<MessageInfo>,
}

impl TranslatableMessage {
    pub fn new(message_key: &str, info: Option<MessageInfo>) -> Self {
        Self {
            message_key: message_key.to_string(),
            info,
        }
    }

    /// The generic per-finding error message attached whenever a raw
    /// observation came back unknown.
    pub fn generic_error() -> Self {
        Self::new("ERROR_GENERIC", None)
    }
}

// --- Findings and reports ---

/// One scored, severity-tagged verdict for a single vulnerability or
/// capability category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub id: String,
    pub has_error: bool,
    pub error_message: Option<TranslatableMessage>,
    pub score: u32,
    pub score_type: Severity,
    pub messages: Option<Vec<TranslatableMessage>>,
}

impl Finding {
    pub fn new(
        id: &str,
        has_error: bool,
        error_message: Option<TranslatableMessage>,
        score: u32,
        score_type: Severity,
        messages: Option<Vec<TranslatableMessage>>,
    ) -> Self {
        Self {
            id: id.to_string(),
            has_error,
            error_message,
            score,
            score_type,
            messages,
        }
    }
}

/// The composite report for one scan-type invocation: exactly one of these
/// is produced per single-protocol scan, whatever happens underneath.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompositeReport {
    pub name: String,
    pub has_error: bool,
    pub error_message: Option<TranslatableMessage>,
    pub score: u32,
    /// Only set on auxiliary-protocol no-response reports, where the whole
    /// report is marked `hidden` so it contributes neutrally inside a mail
    /// super-scan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_type: Option<Severity>,
    pub results: Vec<Finding>,
}

impl CompositeReport {
    pub fn new(
        name: &str,
        has_error: bool,
        error_message: Option<TranslatableMessage>,
        score: u32,
        results: Vec<Finding>,
    ) -> Self {
        Self {
            name: name.to_string(),
            has_error,
            error_message,
            score,
            score_type: None,
            results,
        }
    }
}

/// Wraps the per-protocol reports of a "mail" super-scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MultiProtocolReport {
    pub name: String,
    pub has_error: bool,
    pub error_message: Option<TranslatableMessage>,
    pub score: u32,
    pub results: Vec<CompositeReport>,
}

/// Either kind of report, ready for serialization to the callback wire
/// format. The two shapes share their field layout, so the wire document
/// is emitted untagged.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ReportBody {
    Single(CompositeReport),
    Multi(MultiProtocolReport),
}

impl ReportBody {
    /// The scan-type name the report was produced for, used in delivery
    /// logging.
    pub fn name(&self) -> &str {
        match self {
            ReportBody::Single(report) => &report.name,
            ReportBody::Multi(report) => &report.name,
        }
    }
}

// --- Scan requests and scan types ---

/// The protocol/port profile under test.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
pub enum ScanType {
    #[serde(rename = "TLS")]
    #[strum(serialize = "TLS")]
    Tls,
    #[serde(rename = "IMAP_TLS")]
    #[strum(serialize = "IMAP_TLS")]
    ImapStartTls,
    #[serde(rename = "IMAPS_TLS")]
    #[strum(serialize = "IMAPS_TLS")]
    Imaps,
    #[serde(rename = "POP3_TLS")]
    #[strum(serialize = "POP3_TLS")]
    Pop3StartTls,
    #[serde(rename = "POP3S_TLS")]
    #[strum(serialize = "POP3S_TLS")]
    Pop3s,
    #[serde(rename = "SMTP_TLS")]
    #[strum(serialize = "SMTP_TLS")]
    SmtpStartTls,
    #[serde(rename = "SMTP_MSA_TLS")]
    #[strum(serialize = "SMTP_MSA_TLS")]
    SmtpMsaStartTls,
    #[serde(rename = "SMTPS_TLS")]
    #[strum(serialize = "SMTPS_TLS")]
    Smtps,
    #[serde(rename = "MAIL")]
    #[strum(serialize = "MAIL")]
    Mail,
}

/// Opportunistic-TLS upgrade protocol spoken before the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum StarttlsProtocol {
    Imap,
    Pop3,
    Smtp,
}

/// Transport parameters a concrete scan type resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportProfile {
    pub port: u16,
    pub starttls: Option<StarttlsProtocol>,
}

impl ScanType {
    /// Resolves a concrete scan type to its port and optional STARTTLS
    /// upgrade protocol. `Mail` is a composite type and has no transport
    /// profile of its own.
    pub fn transport_profile(self) -> Option<TransportProfile> {
        let profile = match self {
            ScanType::Tls => TransportProfile {
                port: 443,
                starttls: None,
            },
            ScanType::ImapStartTls => TransportProfile {
                port: 143,
                starttls: Some(StarttlsProtocol::Imap),
            },
            ScanType::Imaps => TransportProfile {
                port: 993,
                starttls: None,
            },
            ScanType::Pop3StartTls => TransportProfile {
                port: 110,
                starttls: Some(StarttlsProtocol::Pop3),
            },
            ScanType::Pop3s => TransportProfile {
                port: 995,
                starttls: None,
            },
            ScanType::SmtpStartTls => TransportProfile {
                port: 25,
                starttls: Some(StarttlsProtocol::Smtp),
            },
            ScanType::SmtpMsaStartTls => TransportProfile {
                port: 587,
                starttls: Some(StarttlsProtocol::Smtp),
            },
            ScanType::Smtps => TransportProfile {
                port: 465,
                starttls: None,
            },
            ScanType::Mail => return None,
        };
        Some(profile)
    }

    /// Whether this scan type is one of the concrete mail profiles covered
    /// by the `Mail` super-scan.
    pub fn is_mail_member(self) -> bool {
        !matches!(self, ScanType::Mail | ScanType::Tls)
    }
}

/// An accepted scan request. Immutable; owned exclusively by the scan that
/// processes it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub url: String,
    pub callback_urls: Vec<String>,
    pub danger_level: u8,
    pub scan_type: ScanType,
}

// --- Raw observation snapshot ---

/// The probe categories a snapshot can carry observations for. Scoring
/// rules only apply for categories whose probe actually executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ProbeKind {
    Sni,
    Compressions,
    Certificate,
    ProtocolVersion,
    CipherSuite,
    CipherSuiteOrder,
    Extensions,
    Tls13,
    Heartbleed,
    PaddingOracle,
    Bleichenbacher,
    Poodle,
    TlsPoodle,
    InvalidCurve,
    EarlyCcs,
}

/// Hash algorithm used in a certificate signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

/// Facts about one certificate in the presented chain, as observed by the
/// certificate probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateEntry {
    pub subject: String,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub hash_algorithm: HashAlgorithm,
}

/// The certificate chain as presented by the server, with the chain-level
/// tri-state verdicts the certificate probe derives from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateChain {
    pub entries: Vec<CertificateEntry>,
    pub contains_expired: Option<bool>,
    pub contains_not_yet_valid: Option<bool>,
    pub contains_weak_signature: Option<bool>,
}

/// Early-CCS probing distinguishes plain vulnerability from actual
/// exploitability; only the latter is penalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EarlyCcsResult {
    NotVulnerable,
    Vulnerable,
    Exploitable,
}

/// The raw observation snapshot handed to the scoring engine.
///
/// Every capability field is tri-state: `Some(true)` / `Some(false)` for a
/// definite observation, `None` for unknown. Unknown never gets coerced to
/// a boolean; the scoring engine surfaces it as an explicit per-finding
/// error instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub host: String,
    pub port: u16,
    pub server_alive: Option<bool>,
    pub supports_tls: Option<bool>,
    pub executed_probes: Vec<ProbeKind>,

    pub certificate_chain: Option<CertificateChain>,
    /// Byte length of the raw certificate message, when one was sent.
    pub certificate_length: Option<usize>,
    pub cipher_suites: Vec<String>,

    pub supports_anon_ciphers: Option<bool>,
    pub supports_export_ciphers: Option<bool>,
    pub supports_null_ciphers: Option<bool>,
    pub supports_rc4_ciphers: Option<bool>,
    pub supports_des_ciphers: Option<bool>,
    pub enforces_cipher_suite_order: Option<bool>,

    pub supports_ssl2: Option<bool>,
    pub supports_ssl3: Option<bool>,
    pub supports_tls13: Option<bool>,

    pub heartbleed_vulnerable: Option<bool>,
    pub padding_oracle_vulnerable: Option<bool>,
    pub bleichenbacher_vulnerable: Option<bool>,
    pub poodle_vulnerable: Option<bool>,
    pub tls_poodle_vulnerable: Option<bool>,
    pub invalid_curve_vulnerable: Option<bool>,
    pub invalid_curve_ephemeral_vulnerable: Option<bool>,
    pub crime_vulnerable: Option<bool>,
    pub early_ccs: Option<EarlyCcsResult>,

    pub sweet32_vulnerable: Option<bool>,
    pub freak_vulnerable: Option<bool>,
    pub logjam_vulnerable: Option<bool>,
}

impl Snapshot {
    /// A snapshot with nothing observed yet, addressed to the given target.
    pub fn for_target(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            ..Self::default()
        }
    }

    pub fn ran_probe(&self, kind: ProbeKind) -> bool {
        self.executed_probes.contains(&kind)
    }

    /// Merges a partial observation into this snapshot. Fields the delta
    /// left unknown never overwrite an existing observation; cipher suites
    /// and executed probes accumulate.
    pub fn absorb(&mut self, delta: Snapshot) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }
        take(&mut self.server_alive, delta.server_alive);
        take(&mut self.supports_tls, delta.supports_tls);
        take(&mut self.certificate_chain, delta.certificate_chain);
        take(&mut self.certificate_length, delta.certificate_length);
        take(&mut self.supports_anon_ciphers, delta.supports_anon_ciphers);
        take(
            &mut self.supports_export_ciphers,
            delta.supports_export_ciphers,
        );
        take(&mut self.supports_null_ciphers, delta.supports_null_ciphers);
        take(&mut self.supports_rc4_ciphers, delta.supports_rc4_ciphers);
        take(&mut self.supports_des_ciphers, delta.supports_des_ciphers);
        take(
            &mut self.enforces_cipher_suite_order,
            delta.enforces_cipher_suite_order,
        );
        take(&mut self.supports_ssl2, delta.supports_ssl2);
        take(&mut self.supports_ssl3, delta.supports_ssl3);
        take(&mut self.supports_tls13, delta.supports_tls13);
        take(&mut self.heartbleed_vulnerable, delta.heartbleed_vulnerable);
        take(
            &mut self.padding_oracle_vulnerable,
            delta.padding_oracle_vulnerable,
        );
        take(
            &mut self.bleichenbacher_vulnerable,
            delta.bleichenbacher_vulnerable,
        );
        take(&mut self.poodle_vulnerable, delta.poodle_vulnerable);
        take(&mut self.tls_poodle_vulnerable, delta.tls_poodle_vulnerable);
        take(
            &mut self.invalid_curve_vulnerable,
            delta.invalid_curve_vulnerable,
        );
        take(
            &mut self.invalid_curve_ephemeral_vulnerable,
            delta.invalid_curve_ephemeral_vulnerable,
        );
        take(&mut self.crime_vulnerable, delta.crime_vulnerable);
        take(&mut self.early_ccs, delta.early_ccs);
        take(&mut self.sweet32_vulnerable, delta.sweet32_vulnerable);
        take(&mut self.freak_vulnerable, delta.freak_vulnerable);
        take(&mut self.logjam_vulnerable, delta.logjam_vulnerable);
        self.cipher_suites.extend(delta.cipher_suites);
        self.executed_probes.extend(delta.executed_probes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn severity_order_drives_capping() {
        assert!(Severity::Fatal.caps_score());
        assert!(Severity::Critical.caps_score());
        assert!(!Severity::Warning.caps_score());
        assert!(!Severity::Bonus.caps_score());
        assert!(!Severity::Hidden.caps_score());
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Severity::Fatal).unwrap(),
            "\"fatal\""
        );
        assert_eq!(Severity::Warning.to_string(), "warning");
    }

    #[test]
    fn scan_type_transport_table() {
        let cases = [
            (ScanType::Tls, 443, None),
            (ScanType::ImapStartTls, 143, Some(StarttlsProtocol::Imap)),
            (ScanType::Imaps, 993, None),
            (ScanType::Pop3StartTls, 110, Some(StarttlsProtocol::Pop3)),
            (ScanType::Pop3s, 995, None),
            (ScanType::SmtpStartTls, 25, Some(StarttlsProtocol::Smtp)),
            (ScanType::SmtpMsaStartTls, 587, Some(StarttlsProtocol::Smtp)),
            (ScanType::Smtps, 465, None),
        ];
        for (ty, port, starttls) in cases {
            let profile = ty.transport_profile().unwrap();
            assert_eq!(profile.port, port, "{ty}");
            assert_eq!(profile.starttls, starttls, "{ty}");
        }
        assert!(ScanType::Mail.transport_profile().is_none());
    }

    #[test]
    fn mail_members_exclude_tls_and_mail() {
        let members: Vec<ScanType> = ScanType::iter().filter(|t| t.is_mail_member()).collect();
        assert_eq!(members.len(), 7);
        assert!(!members.contains(&ScanType::Tls));
        assert!(!members.contains(&ScanType::Mail));
    }

    #[test]
    fn scan_request_deserializes_wire_names() {
        let json = r#"{
            "url": "example.com",
            "callbackUrls": ["https://cb.example/hook"],
            "dangerLevel": 1,
            "scanType": "SMTP_MSA_TLS"
        }"#;
        let request: ScanRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.scan_type, ScanType::SmtpMsaStartTls);
        assert_eq!(request.callback_urls.len(), 1);
    }

    #[test]
    fn finding_serializes_camel_case() {
        let finding = Finding::new(
            "HEARTBLEED_VULNERABLE",
            false,
            None,
            0,
            Severity::Fatal,
            None,
        );
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["scoreType"], "fatal");
        assert_eq!(json["hasError"], false);
        assert!(json["errorMessage"].is_null());
    }
}
