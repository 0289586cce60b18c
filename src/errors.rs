// src/errors.rs
//! Error taxonomy for certificate hashing, ledger access and the services built on them.
//!
//! A tampered certificate is *not* an error; see
//! [`crate::models::certificate::VerificationResult`].

use ethers_core::types::{H256, U256};
use thiserror::Error;

/// A certificate record that cannot be canonicalized.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CertificateError {
    #[error("invalid certificate record: {0}")]
    InvalidRecord(String),
}

/// Failures at the ledger boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("certificate {0} does not exist on the ledger")]
    NotFound(U256),

    /// Timeout or transport failure; says nothing about the certificate itself
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    #[error("contract call reverted: {0}")]
    Reverted(String),

    #[error("could not encode or decode contract data: {0}")]
    Decoding(String),

    #[error("transaction {0:?} was dropped before it was mined")]
    Dropped(H256),

    #[error("a signing key is required for ledger writes")]
    SignerRequired,
}

/// Errors returned by the issuer, relayer and verifier services.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("invalid certificate record: {0}")]
    InvalidRecord(String),

    #[error("certificate {0} not found")]
    CertificateNotFound(U256),

    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("contract rejected the call: {0}")]
    ContractReverted(String),

    #[error("invalid mint signature: {0}")]
    InvalidSignature(String),

    #[error("stale nonce: ledger expects {expected}, request carries {supplied}")]
    StaleNonce { expected: U256, supplied: U256 },

    #[error("a signing key is required for this operation")]
    SignerRequired,

    #[error("ledger error: {0}")]
    Ledger(String),
}

impl From<CertificateError> for ServiceError {
    fn from(err: CertificateError) -> Self {
        match err {
            CertificateError::InvalidRecord(reason) => ServiceError::InvalidRecord(reason),
        }
    }
}

impl From<LedgerError> for ServiceError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(token_id) => ServiceError::CertificateNotFound(token_id),
            LedgerError::Unavailable(reason) => ServiceError::LedgerUnavailable(reason),
            LedgerError::Reverted(reason) => ServiceError::ContractReverted(reason),
            LedgerError::SignerRequired => ServiceError::SignerRequired,
            other @ (LedgerError::Decoding(_) | LedgerError::Dropped(_)) => {
                ServiceError::Ledger(other.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_never_maps_to_not_found() {
        let err: ServiceError = LedgerError::Unavailable("timed out".into()).into();
        assert_eq!(err, ServiceError::LedgerUnavailable("timed out".into()));
    }

    #[test]
    fn test_not_found_keeps_token_id() {
        let err: ServiceError = LedgerError::NotFound(U256::from(999_999)).into();
        assert_eq!(err, ServiceError::CertificateNotFound(U256::from(999_999)));
    }
}
