// src/blockchain/ledger.rs
//! Capabilities the services need from the certificate contract.
//!
//! Reads and writes are split so the verifier can only ever query. Futures
//! are boxed to keep both traits object-safe; services hold them as
//! `Arc<dyn LedgerReader>` / `Arc<dyn LedgerWriter>`.

use crate::errors::LedgerError;
use crate::models::certificate::{CertificateDigest, OnChainCertificate};
use crate::models::mint_request::{SignedMintRequest, TxOutcome};
use ethers_core::types::{Address, U256};
use futures::future::BoxFuture;

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Read-only contract queries.
pub trait LedgerReader: Send + Sync {
    /// `getCertificateDetails(tokenId)`; unknown tokens yield [`LedgerError::NotFound`].
    fn certificate_details(&self, token_id: U256) -> BoxFuture<'_, LedgerResult<OnChainCertificate>>;

    /// `getCertificatesByOwner(owner)`
    fn certificates_by_owner(&self, owner: Address) -> BoxFuture<'_, LedgerResult<Vec<U256>>>;

    /// `nonces(issuer)`: the nonce the next signed mint must carry
    fn nonce_of(&self, issuer: Address) -> BoxFuture<'_, LedgerResult<U256>>;

    /// `owner()` of the contract itself
    fn contract_owner(&self) -> BoxFuture<'_, LedgerResult<Address>>;

    /// `ownerOf(tokenId)`
    fn owner_of(&self, token_id: U256) -> BoxFuture<'_, LedgerResult<Address>>;

    /// `tokenURI(tokenId)`
    fn token_uri(&self, token_id: U256) -> BoxFuture<'_, LedgerResult<String>>;

    /// Chain id used in the EIP-712 domain.
    fn chain_id(&self) -> BoxFuture<'_, LedgerResult<U256>>;

    /// Address of the certificate contract.
    fn contract_address(&self) -> Address;
}

/// State-changing contract calls. Each resolves once the transaction is mined.
pub trait LedgerWriter: LedgerReader {
    fn issue_certificate(
        &self,
        recipient: Address,
        digest: &CertificateDigest,
    ) -> BoxFuture<'_, LedgerResult<TxOutcome>>;

    fn mint_with_signature(&self, signed: &SignedMintRequest) -> BoxFuture<'_, LedgerResult<TxOutcome>>;

    fn add_minter(&self, account: Address) -> BoxFuture<'_, LedgerResult<TxOutcome>>;

    fn remove_minter(&self, account: Address) -> BoxFuture<'_, LedgerResult<TxOutcome>>;

    fn set_issuer_status(&self, issuer: Address, active: bool) -> BoxFuture<'_, LedgerResult<TxOutcome>>;

    fn set_base_uri(&self, base_uri: String) -> BoxFuture<'_, LedgerResult<TxOutcome>>;
}
