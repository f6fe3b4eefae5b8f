// src/core/knowledge_base.rs

//! Static, read-only database of every finding the scoring engine can
//! emit, with human-readable explanations and remediation steps. Severity
//! here is the configured (pre-rewrite) severity a finding starts with.

use crate::core::models::Severity;
use std::fmt;

/// High-level grouping for findings, used by operator-facing tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FindingCategory {
    Certificate,
    CipherSuites,
    ProtocolVersion,
    KnownAttack,
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingCategory::Certificate => write!(f, "Certificate Chain"),
            FindingCategory::CipherSuites => write!(f, "Cipher Suites"),
            FindingCategory::ProtocolVersion => write!(f, "Protocol Versions"),
            FindingCategory::KnownAttack => write!(f, "Known Attacks"),
        }
    }
}

/// Everything needed to present one finding code to a human.
pub struct FindingDetail {
    pub code: &'static str,
    pub title: &'static str,
    pub category: FindingCategory,
    pub severity: Severity,
    pub description: &'static str,
    pub remediation: &'static str,
}

static FINDINGS: &[FindingDetail] = &[
    // --- Certificate chain ---
    FindingDetail {
        code: "CERTIFICATE_EXPIRED",
        title: "Certificate Expired",
        category: FindingCategory::Certificate,
        severity: Severity::Critical,
        description: "A certificate in the presented chain is past its validity window. Clients will refuse the connection or warn prominently.",
        remediation: "Renew the certificate and automate renewal so it cannot lapse again.",
    },
    FindingDetail {
        code: "CERTIFICATE_NOT_VALID_YET",
        title: "Certificate Not Yet Valid",
        category: FindingCategory::Certificate,
        severity: Severity::Warning,
        description: "A certificate in the chain has a notBefore date in the future, usually a clock or deployment mistake.",
        remediation: "Check the server clock and redeploy a certificate whose validity window has started.",
    },
    FindingDetail {
        code: "CERTIFICATE_NOT_SENT_BY_SERVER",
        title: "No Certificate Sent",
        category: FindingCategory::Certificate,
        severity: Severity::Critical,
        description: "The server completed a handshake without presenting a certificate, so clients cannot authenticate it.",
        remediation: "Install a certificate chain and ensure the server is configured to send it.",
    },
    FindingDetail {
        code: "CERTIFICATE_WEAK_HASH_FUNCTION",
        title: "Weak Certificate Signature Hash",
        category: FindingCategory::Certificate,
        severity: Severity::Critical,
        description: "A chain certificate is signed with MD5 or SHA-1. Both are broken for collision resistance; MD5 signatures are forgeable in practice.",
        remediation: "Reissue the certificate with a SHA-2 family signature.",
    },
    // --- Cipher suites ---
    FindingDetail {
        code: "CIPHERSUITE_ANON",
        title: "Anonymous Cipher Suites",
        category: FindingCategory::CipherSuites,
        severity: Severity::Fatal,
        description: "Anonymous key exchange performs no server authentication at all, making man-in-the-middle interception trivial.",
        remediation: "Remove all anon suites from the server configuration.",
    },
    FindingDetail {
        code: "CIPHERSUITE_EXPORT",
        title: "Export Cipher Suites",
        category: FindingCategory::CipherSuites,
        severity: Severity::Fatal,
        description: "Export-grade suites cap key material at strengths breakable on commodity hardware.",
        remediation: "Remove all EXPORT suites from the server configuration.",
    },
    FindingDetail {
        code: "CIPHERSUITE_NULL",
        title: "NULL Cipher Suites",
        category: FindingCategory::CipherSuites,
        severity: Severity::Fatal,
        description: "NULL suites negotiate no encryption; traffic is transmitted in the clear inside the TLS framing.",
        remediation: "Remove all NULL suites from the server configuration.",
    },
    FindingDetail {
        code: "CIPHERSUITE_RC4",
        title: "RC4 Cipher Suites",
        category: FindingCategory::CipherSuites,
        severity: Severity::Warning,
        description: "RC4 keystream biases allow plaintext recovery given enough ciphertext; the cipher is prohibited for TLS by RFC 7465.",
        remediation: "Disable RC4 and prefer AEAD suites such as AES-GCM or ChaCha20-Poly1305.",
    },
    FindingDetail {
        code: "CIPHERSUITE_DES",
        title: "DES Cipher Suites",
        category: FindingCategory::CipherSuites,
        severity: Severity::Warning,
        description: "Single DES offers an effective 56-bit key, exhaustively searchable for decades.",
        remediation: "Disable DES suites entirely.",
    },
    FindingDetail {
        code: "CIPHERSUITEORDER_ENFORCED",
        title: "Cipher Suite Order Not Enforced",
        category: FindingCategory::CipherSuites,
        severity: Severity::Warning,
        description: "The server lets clients pick the suite, so a weak client preference wins over a strong server configuration.",
        remediation: "Enable server-side cipher order enforcement.",
    },
    FindingDetail {
        code: "SWEET32_VULNERABLE",
        title: "Sweet32",
        category: FindingCategory::CipherSuites,
        severity: Severity::Warning,
        description: "64-bit block ciphers (3DES, IDEA) leak plaintext through birthday collisions on long-lived connections.",
        remediation: "Disable 3DES and IDEA suites.",
    },
    // --- Protocol versions ---
    FindingDetail {
        code: "PROTOCOLVERSION_SSL2",
        title: "SSLv2 Supported",
        category: FindingCategory::ProtocolVersion,
        severity: Severity::Fatal,
        description: "SSLv2 is fundamentally broken and its presence also enables cross-protocol attacks against newer stacks.",
        remediation: "Disable SSLv2 on the server.",
    },
    FindingDetail {
        code: "PROTOCOLVERSION_SSL3",
        title: "SSLv3 Supported",
        category: FindingCategory::ProtocolVersion,
        severity: Severity::Critical,
        description: "SSLv3 is obsolete and exposes padding-oracle attacks such as Poodle.",
        remediation: "Disable SSLv3 on the server.",
    },
    FindingDetail {
        code: "PROTOCOLVERSION_TLS13",
        title: "TLS 1.3 Supported",
        category: FindingCategory::ProtocolVersion,
        severity: Severity::Bonus,
        description: "The server offers TLS 1.3; this is the only rewarded capability rather than a penalized one.",
        remediation: "Nothing to do.",
    },
    // --- Known attacks ---
    FindingDetail {
        code: "HEARTBLEED_VULNERABLE",
        title: "Heartbleed",
        category: FindingCategory::KnownAttack,
        severity: Severity::Fatal,
        description: "The heartbeat extension leaks server memory, including private key material (CVE-2014-0160).",
        remediation: "Upgrade OpenSSL immediately and rotate the key pair and certificates.",
    },
    FindingDetail {
        code: "BLEICHENBACHER_VULNERABLE",
        title: "Bleichenbacher / ROBOT",
        category: FindingCategory::KnownAttack,
        severity: Severity::Critical,
        description: "RSA PKCS#1 v1.5 error responses form a padding oracle allowing decryption and signing with the server key.",
        remediation: "Patch the TLS stack or disable RSA key-exchange suites.",
    },
    FindingDetail {
        code: "PADDING_ORACLE_VULNERABLE",
        title: "CBC Padding Oracle",
        category: FindingCategory::KnownAttack,
        severity: Severity::Critical,
        description: "Distinguishable padding errors in CBC mode let an attacker decrypt recorded sessions byte by byte.",
        remediation: "Patch the TLS implementation; prefer AEAD suites.",
    },
    FindingDetail {
        code: "POODLE_VULNERABLE",
        title: "Poodle",
        category: FindingCategory::KnownAttack,
        severity: Severity::Critical,
        description: "SSLv3 CBC padding is exploitable for plaintext recovery after a downgrade (CVE-2014-3566).",
        remediation: "Disable SSLv3.",
    },
    FindingDetail {
        code: "TLS_POODLE_VULNERABLE",
        title: "TLS Poodle",
        category: FindingCategory::KnownAttack,
        severity: Severity::Critical,
        description: "The implementation accepts SSLv3-style padding under TLS, reintroducing the Poodle oracle without any downgrade.",
        remediation: "Patch the TLS implementation.",
    },
    FindingDetail {
        code: "INVALID_CURVE_VULNERABLE",
        title: "Invalid Curve",
        category: FindingCategory::KnownAttack,
        severity: Severity::Critical,
        description: "The server accepts EC points off the negotiated curve, leaking its static ECDH private key.",
        remediation: "Patch the TLS stack to validate received points.",
    },
    FindingDetail {
        code: "INVALID_CURVE_EPHEMERAL_VULNERABLE",
        title: "Invalid Curve (Ephemeral)",
        category: FindingCategory::KnownAttack,
        severity: Severity::Warning,
        description: "Off-curve points are accepted with ephemeral ECDH; exploitation requires key reuse across handshakes.",
        remediation: "Patch the TLS stack to validate received points.",
    },
    FindingDetail {
        code: "CRIME_VULNERABLE",
        title: "Crime",
        category: FindingCategory::KnownAttack,
        severity: Severity::Critical,
        description: "TLS compression lets an attacker recover secrets such as cookies by observing compressed record lengths.",
        remediation: "Disable TLS compression.",
    },
    FindingDetail {
        code: "EARLYCCS_VULNERABLE",
        title: "Early CCS",
        category: FindingCategory::KnownAttack,
        severity: Severity::Warning,
        description: "The server accepts a premature ChangeCipherSpec, enabling key-material injection by a man in the middle (CVE-2014-0224).",
        remediation: "Upgrade OpenSSL on the server.",
    },
];

/// Looks up the full detail for a finding code.
pub fn get_finding_detail(code: &str) -> Option<&'static FindingDetail> {
    FINDINGS.iter().find(|detail| detail.code == code)
}

/// All finding codes known to the scoring engine.
pub fn all_finding_codes() -> impl Iterator<Item = &'static str> {
    FINDINGS.iter().map(|detail| detail.code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known_code() {
        let detail = get_finding_detail("HEARTBLEED_VULNERABLE").unwrap();
        assert_eq!(detail.severity, Severity::Fatal);
        assert_eq!(detail.category, FindingCategory::KnownAttack);
    }

    #[test]
    fn unknown_code_is_none() {
        assert!(get_finding_detail("NOT_A_FINDING").is_none());
    }

    #[test]
    fn codes_are_unique() {
        let codes: Vec<&str> = all_finding_codes().collect();
        let mut deduped = codes.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(codes.len(), deduped.len());
    }
}
