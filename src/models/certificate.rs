// src/models/certificate.rs
//! Certificate data model.
//!
//! Defines the off-chain certificate payload, the digest committed on-chain,
//! the ledger-resident certificate record and the verification verdict.

use ethers_core::types::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Off-chain payload describing an issued certificate.
///
/// Field declaration order mirrors the canonical order, but the canonical
/// form is written explicitly by [`crate::utils::canonical::CanonicalHasher`]
/// and never depends on how serde orders struct fields.
///
/// Unknown fields are rejected on deserialization: an extra field would have
/// been part of the digest at issuance time, so silently dropping it would
/// turn an authentic certificate into a tampered one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CertificateRecord {
    /// Full name of the certificate holder
    pub student_name: String,

    /// Title of the completed course or programme
    pub course_title: String,

    /// ISO 8601 date (`YYYY-MM-DD`) or RFC 3339 timestamp
    pub issue_date: String,

    /// Human-readable name of the issuing institution
    pub issuer_name: String,

    /// Ledger address of the recipient, kept byte-exact
    pub recipient_wallet: String,

    pub certificate_description: String,

    /// URI of the rendered certificate image or receipt
    pub visual_asset_url: String,

    pub grade: String,
}

/// Lower-case, unprefixed 64-character hex SHA-256 digest of a canonical record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct CertificateDigest(String);

impl CertificateDigest {
    /// Length of a hex-encoded 256-bit digest.
    pub const HEX_LEN: usize = 64;

    /// Wraps raw digest bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(ethers_core::utils::hex::encode(bytes))
    }

    /// Parses a hex digest in any case, with or without `0x`.
    ///
    /// Returns `None` unless the normalized value is exactly 64 hex digits.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = normalize_hex(value);
        let well_formed = normalized.len() == Self::HEX_LEN
            && normalized.bytes().all(|b| b.is_ascii_hexdigit());
        well_formed.then_some(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compares against a ledger-returned hash string.
    ///
    /// Both sides are normalized (optional `0x` stripped, lower-cased) and then
    /// compared byte for byte.
    pub fn matches(&self, on_chain: &str) -> bool {
        normalize_hex(on_chain) == self.0
    }
}

impl fmt::Display for CertificateDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strips surrounding whitespace and an optional `0x`/`0X` prefix, then lower-cases.
pub fn normalize_hex(value: &str) -> String {
    let trimmed = value.trim();
    let unprefixed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    unprefixed.to_ascii_lowercase()
}

/// Certificate details as stored by the ledger for a minted token.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OnChainCertificate {
    pub token_id: U256,
    pub issuer_address: Address,
    /// Hash string exactly as returned by the contract
    pub data_hash: String,
}

/// Outcome of a completed verification.
///
/// `Tampered` is an ordinary verdict, not an error: the check ran to
/// completion and the digests differ.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum VerificationResult {
    #[serde(rename_all = "camelCase")]
    Authentic {
        token_id: U256,
        issuer_address: Address,
    },
    #[serde(rename_all = "camelCase")]
    Tampered {
        token_id: U256,
        on_chain_digest: String,
        computed_digest: CertificateDigest,
    },
}

impl VerificationResult {
    pub fn is_authentic(&self) -> bool {
        matches!(self, VerificationResult::Authentic { .. })
    }

    pub fn token_id(&self) -> U256 {
        match self {
            VerificationResult::Authentic { token_id, .. }
            | VerificationResult::Tampered { token_id, .. } => *token_id,
        }
    }
}
