// src/services/verifier.rs
//! Certificate verification service.
//!
//! Confirms that a claimed certificate record is the one whose digest was
//! committed on-chain for a given token.

use crate::blockchain::ledger::LedgerReader;
use crate::errors::ServiceError;
use crate::models::certificate::{CertificateDigest, CertificateRecord, VerificationResult};
use crate::utils::canonical::CanonicalHasher;
use ethers_core::types::U256;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One entry of a batch verification.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub token_id: U256,
    pub certificate: CertificateRecord,
}

/// Stateless verifier over a read-only ledger.
///
/// Each call performs exactly one ledger query and never mutates anything,
/// so a single instance can be shared and called concurrently.
#[derive(Clone)]
pub struct Verifier {
    ledger: Arc<dyn LedgerReader>,
    hasher: CanonicalHasher,
}

impl Verifier {
    pub fn new(ledger: Arc<dyn LedgerReader>, hasher: CanonicalHasher) -> Self {
        Self { ledger, hasher }
    }

    pub fn hasher(&self) -> CanonicalHasher {
        self.hasher
    }

    /// Verifies `claimed` against the digest stored for `token_id`.
    ///
    /// # Returns
    /// - `Ok(Authentic)` if the recomputed digest equals the on-chain one
    /// - `Ok(Tampered)` if they differ
    /// - `Err(CertificateNotFound)` if the token does not exist (nothing is hashed)
    /// - `Err(InvalidRecord)` if `claimed` cannot be canonicalized
    /// - `Err(LedgerUnavailable)` on timeout or transport failure
    pub async fn verify(
        &self,
        token_id: U256,
        claimed: &CertificateRecord,
    ) -> Result<VerificationResult, ServiceError> {
        let on_chain = self.ledger.certificate_details(token_id).await.map_err(|e| {
            log::error!("certificate {token_id} could not be fetched: {e}");
            ServiceError::from(e)
        })?;

        let computed = self.hasher.digest(claimed)?;
        log::debug!(
            "certificate {token_id}: on-chain {} computed {computed}",
            on_chain.data_hash
        );

        if computed.matches(&on_chain.data_hash) {
            log::info!(
                "certificate {token_id} is authentic (issuer {:?})",
                on_chain.issuer_address
            );
            Ok(VerificationResult::Authentic {
                token_id,
                issuer_address: on_chain.issuer_address,
            })
        } else {
            if CertificateDigest::parse(&on_chain.data_hash).is_none() {
                log::warn!(
                    "certificate {token_id} stores {:?}, which is not a {}-digit hex digest",
                    on_chain.data_hash,
                    CertificateDigest::HEX_LEN
                );
            }
            log::warn!("certificate {token_id} does not match its on-chain digest");
            Ok(VerificationResult::Tampered {
                token_id,
                on_chain_digest: on_chain.data_hash,
                computed_digest: computed,
            })
        }
    }

    /// Verifies a batch concurrently; results keep the input order.
    pub async fn verify_many(
        &self,
        requests: &[VerificationRequest],
    ) -> Vec<Result<VerificationResult, ServiceError>> {
        join_all(
            requests
                .iter()
                .map(|request| self.verify(request.token_id, &request.certificate)),
        )
        .await
    }
}
