// src/services/certificate_issuer.rs
//! Certificate Issuer Service
//!
//! Issues certificates by committing the canonical digest of a record to the
//! certificate contract, and wraps the contract's administrative calls
//! (minter and issuer registration, base URI).

use crate::blockchain::ledger::LedgerWriter;
use crate::errors::ServiceError;
use crate::models::certificate::{CertificateDigest, CertificateRecord};
use crate::models::mint_request::TxOutcome;
use crate::utils::canonical::CanonicalHasher;
use ethers_core::types::Address;
use std::sync::Arc;

/// Receipt of a successful issuance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issuance {
    pub digest: CertificateDigest,
    pub outcome: TxOutcome,
}

/// Service for issuing and administering certificates on-chain.
#[derive(Clone)]
pub struct CertificateIssuer {
    ledger: Arc<dyn LedgerWriter>,
    /// Must be the same hasher the verifiers use
    hasher: CanonicalHasher,
}

impl CertificateIssuer {
    pub fn new(ledger: Arc<dyn LedgerWriter>, hasher: CanonicalHasher) -> Self {
        Self { ledger, hasher }
    }

    /// Hashes `record` and submits `issueCertificate(recipient, digest)`.
    ///
    /// The record is validated before the ledger is contacted.
    pub async fn issue(
        &self,
        recipient: Address,
        record: &CertificateRecord,
    ) -> Result<Issuance, ServiceError> {
        let digest = self.hasher.digest(record)?;
        log::debug!("issuing digest {digest} to {recipient:?}");

        let outcome = self.ledger.issue_certificate(recipient, &digest).await?;
        match outcome.token_id {
            Some(token_id) => log::info!(
                "certificate {token_id} issued to {recipient:?} in tx {:?}",
                outcome.tx_hash
            ),
            None => log::warn!(
                "issueCertificate mined in tx {:?} but no mint event was found",
                outcome.tx_hash
            ),
        }
        Ok(Issuance { digest, outcome })
    }

    pub async fn add_minter(&self, account: Address) -> Result<TxOutcome, ServiceError> {
        let outcome = self.ledger.add_minter(account).await?;
        log::info!("minter {account:?} added in tx {:?}", outcome.tx_hash);
        Ok(outcome)
    }

    pub async fn remove_minter(&self, account: Address) -> Result<TxOutcome, ServiceError> {
        let outcome = self.ledger.remove_minter(account).await?;
        log::info!("minter {account:?} removed in tx {:?}", outcome.tx_hash);
        Ok(outcome)
    }

    /// Grants or revokes the right to sign mint requests.
    pub async fn set_issuer_status(
        &self,
        issuer: Address,
        active: bool,
    ) -> Result<TxOutcome, ServiceError> {
        let outcome = self.ledger.set_issuer_status(issuer, active).await?;
        log::info!(
            "issuer {issuer:?} status set to {active} in tx {:?}",
            outcome.tx_hash
        );
        Ok(outcome)
    }

    pub async fn set_base_uri(&self, base_uri: String) -> Result<TxOutcome, ServiceError> {
        let outcome = self.ledger.set_base_uri(base_uri).await?;
        log::info!("base URI updated in tx {:?}", outcome.tx_hash);
        Ok(outcome)
    }
}
