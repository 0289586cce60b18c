// src/services/relayer.rs
//! Relayer for signature-based minting.
//!
//! An issuer authorizes a mint off-chain by signing `CertificateData`; the
//! relayer checks the authorization and submits `mintWithSignature`, paying
//! the gas itself.

use crate::blockchain::ledger::LedgerWriter;
use crate::errors::ServiceError;
use crate::models::mint_request::{MintRequest, SignedMintRequest, TxOutcome};
use crate::wallet::key_management::KeyManager;
use crate::wallet::typed_data::{recover_signer, SigningDomain};
use ethers_core::types::{Address, U256};
use std::sync::Arc;

/// Name and version of the contract's EIP-712 domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainConfig {
    pub name: String,
    pub version: String,
    /// Overrides the chain id reported by the node
    pub chain_id: Option<u64>,
}

#[derive(Clone)]
pub struct Relayer {
    ledger: Arc<dyn LedgerWriter>,
    domain: DomainConfig,
}

impl Relayer {
    pub fn new(ledger: Arc<dyn LedgerWriter>, domain: DomainConfig) -> Self {
        Self { ledger, domain }
    }

    /// Full EIP-712 domain of the contract the relayer talks to.
    pub async fn signing_domain(&self) -> Result<SigningDomain, ServiceError> {
        let chain_id = match self.domain.chain_id {
            Some(id) => U256::from(id),
            None => self.ledger.chain_id().await?,
        };
        Ok(SigningDomain {
            name: self.domain.name.clone(),
            version: self.domain.version.clone(),
            chain_id,
            verifying_contract: self.ledger.contract_address(),
        })
    }

    /// Builds and signs a mint request for `recipient` with `keys` as issuer.
    ///
    /// The nonce is read from the ledger, so the request is valid until the
    /// issuer's next mint.
    pub async fn sign_request(
        &self,
        keys: &KeyManager,
        recipient: Address,
        token_uri: String,
    ) -> Result<SignedMintRequest, ServiceError> {
        let nonce = self.ledger.nonce_of(keys.address()).await?;
        let domain = self.signing_domain().await?;
        let request = MintRequest {
            recipient,
            token_uri,
            nonce,
        };
        keys.sign_mint_request(&domain, request)
            .map_err(|e| ServiceError::InvalidSignature(e.to_string()))
    }

    /// Checks `signed` and submits it with `mintWithSignature`.
    ///
    /// # Errors
    /// - `InvalidSignature` if the signature does not recover to `signed.issuer`
    /// - `StaleNonce` if the nonce is not the issuer's current on-chain nonce
    /// - ledger errors from the submission itself
    pub async fn relay(&self, signed: &SignedMintRequest) -> Result<TxOutcome, ServiceError> {
        let domain = self.signing_domain().await?;
        let signer = recover_signer(&domain, signed)
            .map_err(|e| ServiceError::InvalidSignature(e.to_string()))?;
        if signer != signed.issuer {
            log::warn!(
                "rejected mint for {:?}: signed by {signer:?}, claimed {:?}",
                signed.request.recipient,
                signed.issuer
            );
            return Err(ServiceError::InvalidSignature(format!(
                "signature recovers to {signer:?}, not {:?}",
                signed.issuer
            )));
        }

        let expected = self.ledger.nonce_of(signed.issuer).await?;
        if expected != signed.request.nonce {
            log::warn!(
                "rejected mint from {:?}: nonce {} but ledger expects {expected}",
                signed.issuer,
                signed.request.nonce
            );
            return Err(ServiceError::StaleNonce {
                expected,
                supplied: signed.request.nonce,
            });
        }

        let outcome = self.ledger.mint_with_signature(signed).await?;
        log::info!(
            "relayed mint for issuer {:?} to {:?} in tx {:?} (token {:?})",
            signed.issuer,
            signed.request.recipient,
            outcome.tx_hash,
            outcome.token_id
        );
        Ok(outcome)
    }
}
