// src/utils/canonical.rs
//! Canonical serialization and hashing of certificate records.
//!
//! The digest produced here is embedded on-chain at issuance and recomputed at
//! verification, so the byte layout must never change for an existing scheme.
//! A new layout gets a new [`CanonicalScheme`] variant.
//!
//! ## `JsonV1` layout
//! A compact JSON object, keys in this fixed order:
//!
//! `studentName, courseTitle, issueDate, issuerName, recipientWallet,
//! certificateDescription, visualAssetUrl, grade`
//!
//! Each value is a JSON string (escaping `"`, `\` and control characters,
//! non-ASCII emitted as raw UTF-8), with no whitespace between tokens. The
//! digest is SHA-256 over those UTF-8 bytes, rendered as lower-case hex.

use crate::errors::CertificateError;
use crate::models::certificate::{CertificateDigest, CertificateRecord};
use crate::utils::crypto::sha256;
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

/// Versioned canonicalization layouts.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CanonicalScheme {
    #[default]
    JsonV1,
}

impl CanonicalScheme {
    pub fn name(&self) -> &'static str {
        match self {
            CanonicalScheme::JsonV1 => "json-v1",
        }
    }
}

/// Deterministic hasher for [`CertificateRecord`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalHasher {
    scheme: CanonicalScheme,
}

impl CanonicalHasher {
    pub fn new(scheme: CanonicalScheme) -> Self {
        Self { scheme }
    }

    pub fn scheme(&self) -> CanonicalScheme {
        self.scheme
    }

    /// Produces the canonical byte sequence for `record`.
    ///
    /// # Errors
    /// `InvalidRecord` if a field is empty or `issueDate` is not an ISO 8601
    /// date or RFC 3339 timestamp.
    pub fn canonicalize(&self, record: &CertificateRecord) -> Result<Vec<u8>, CertificateError> {
        let fields = ordered_fields(record);
        validate(&fields)?;

        match self.scheme {
            CanonicalScheme::JsonV1 => {
                let mut out = String::with_capacity(512);
                out.push('{');
                for (index, (key, value)) in fields.iter().enumerate() {
                    if index > 0 {
                        out.push(',');
                    }
                    out.push('"');
                    out.push_str(key);
                    out.push_str("\":");
                    let encoded = serde_json::to_string(value).map_err(|e| {
                        CertificateError::InvalidRecord(format!("{key} is not representable: {e}"))
                    })?;
                    out.push_str(&encoded);
                }
                out.push('}');
                Ok(out.into_bytes())
            }
        }
    }

    /// Hashes `record` into its [`CertificateDigest`].
    pub fn digest(&self, record: &CertificateRecord) -> Result<CertificateDigest, CertificateError> {
        let canonical = self.canonicalize(record)?;
        Ok(CertificateDigest::from_bytes(&sha256(&canonical)))
    }
}

/// Field names and values in canonical order.
fn ordered_fields(record: &CertificateRecord) -> [(&'static str, &str); 8] {
    [
        ("studentName", &record.student_name),
        ("courseTitle", &record.course_title),
        ("issueDate", &record.issue_date),
        ("issuerName", &record.issuer_name),
        ("recipientWallet", &record.recipient_wallet),
        ("certificateDescription", &record.certificate_description),
        ("visualAssetUrl", &record.visual_asset_url),
        ("grade", &record.grade),
    ]
}

fn validate(fields: &[(&'static str, &str)]) -> Result<(), CertificateError> {
    for (key, value) in fields {
        if value.trim().is_empty() {
            return Err(CertificateError::InvalidRecord(format!("{key} is required")));
        }
        if *key == "issueDate" && !is_iso8601(value) {
            return Err(CertificateError::InvalidRecord(format!(
                "issueDate {value:?} is not an ISO 8601 date"
            )));
        }
    }
    Ok(())
}

fn is_iso8601(value: &str) -> bool {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok() || DateTime::parse_from_rfc3339(value).is_ok()
}
