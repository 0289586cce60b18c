// src/contracts/certificate_registry.rs
//! SertifyEd certificate contract interface.
//!
//! Typed wrapper over the deployed ERC-721 certificate contract. Supports
//! issuing, signature minting, querying and administering certificates, and
//! implements [`LedgerReader`] / [`LedgerWriter`] for the services.

use crate::blockchain::ledger::{LedgerReader, LedgerResult, LedgerWriter};
use crate::blockchain::ledger_client::{classify_contract_error, with_timeout, Timeouts};
use crate::errors::LedgerError;
use crate::models::certificate::{CertificateDigest, OnChainCertificate};
use crate::models::mint_request::{SignedMintRequest, TxOutcome};
use crate::utils::crypto::keccak;
use ethers::providers::Middleware;
use ethers_contract::Contract;
use ethers_core::abi::{Abi, Detokenize, Tokenize};
use ethers_core::types::{Address, Log, H256, U256, U64};
use futures::future::BoxFuture;
use std::sync::Arc;

const SERTIFYED_ABI: &[u8] = include_bytes!("abi/SertifyEd.json");

/// `Error(string)` reasons used for unknown token ids by contracts without custom errors.
const MISSING_TOKEN_REASONS: [&str; 3] = ["does not exist", "nonexistent", "invalid token id"];

/// Certificate contract wrapper.
///
/// # Type Parameters
/// * `M` - middleware stack (`Provider<Http>` for reads, `SignerMiddleware` for writes)
pub struct CertificateRegistry<M> {
    /// Underlying contract instance
    contract: Contract<M>,
    timeouts: Timeouts,
    /// Whether the middleware can sign transactions
    writable: bool,
}

impl<M> CertificateRegistry<M>
where
    M: Middleware + 'static,
{
    /// Creates a new CertificateRegistry instance.
    ///
    /// # Errors
    /// `Decoding` if the embedded ABI cannot be loaded.
    pub fn new(
        client: Arc<M>,
        contract_address: Address,
        timeouts: Timeouts,
        writable: bool,
    ) -> Result<Self, LedgerError> {
        let abi = Abi::load(SERTIFYED_ABI).map_err(|e| LedgerError::Decoding(e.to_string()))?;
        Ok(Self {
            contract: Contract::new(contract_address, abi, client),
            timeouts,
            writable,
        })
    }

    /// Calls a view function.
    async fn query<T, D>(&self, method: &str, params: T) -> LedgerResult<D>
    where
        T: Tokenize + Send,
        D: Detokenize + Send + Sync,
    {
        let call = self
            .contract
            .method::<T, D>(method, params)
            .map_err(|e| LedgerError::Decoding(e.to_string()))?;
        with_timeout(self.timeouts.query, call.call())
            .await?
            .map_err(classify_contract_error)
    }

    /// Sends a transaction and waits for it to be mined.
    ///
    /// A mined-but-failed transaction is reported as `Reverted`.
    async fn transact<T>(&self, method: &str, params: T) -> LedgerResult<TxOutcome>
    where
        T: Tokenize + Send,
    {
        if !self.writable {
            return Err(LedgerError::SignerRequired);
        }

        let call = self
            .contract
            .method::<T, ()>(method, params)
            .map_err(|e| LedgerError::Decoding(e.to_string()))?;
        let pending = with_timeout(self.timeouts.query, call.send())
            .await?
            .map_err(classify_contract_error)?;
        let tx_hash = pending.tx_hash();
        log::info!("{method} submitted in tx {tx_hash:?}");

        let receipt = with_timeout(self.timeouts.confirmation, pending)
            .await?
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?
            .ok_or(LedgerError::Dropped(tx_hash))?;

        if receipt.status == Some(U64::zero()) {
            return Err(LedgerError::Reverted(format!("{method} transaction {tx_hash:?} failed")));
        }

        Ok(TxOutcome {
            tx_hash,
            token_id: minted_token_id(&receipt.logs, self.contract.address()),
        })
    }

    async fn fetch_details(&self, token_id: U256) -> LedgerResult<OnChainCertificate> {
        match self
            .query::<_, (Address, String)>("getCertificateDetails", token_id)
            .await
        {
            // Contracts that return a zeroed struct instead of reverting
            Ok((issuer_address, data_hash)) if issuer_address.is_zero() && data_hash.is_empty() => {
                Err(LedgerError::NotFound(token_id))
            }
            Ok((issuer_address, data_hash)) => Ok(OnChainCertificate {
                token_id,
                issuer_address,
                data_hash,
            }),
            Err(LedgerError::Reverted(reason)) if is_missing_token(&reason) => {
                Err(LedgerError::NotFound(token_id))
            }
            Err(e) => Err(e),
        }
    }
}

fn is_missing_token(reason: &str) -> bool {
    let reason = reason.to_ascii_lowercase();
    MISSING_TOKEN_REASONS.iter().any(|fragment| reason.contains(fragment))
}

/// Extracts the id of a token minted by `contract` from receipt logs.
///
/// Looks for the ERC-721 `Transfer(from = 0x0, to, tokenId)` event, which
/// both `issueCertificate` and `mintWithSignature` emit.
pub fn minted_token_id(logs: &[Log], contract: Address) -> Option<U256> {
    let transfer_topic = H256::from(keccak(b"Transfer(address,address,uint256)"));
    logs.iter()
        .filter(|log| log.address == contract)
        .find(|log| {
            log.topics.len() == 4 && log.topics[0] == transfer_topic && log.topics[1] == H256::zero()
        })
        .map(|log| U256::from_big_endian(log.topics[3].as_bytes()))
}

impl<M> LedgerReader for CertificateRegistry<M>
where
    M: Middleware + 'static,
{
    fn certificate_details(&self, token_id: U256) -> BoxFuture<'_, LedgerResult<OnChainCertificate>> {
        Box::pin(self.fetch_details(token_id))
    }

    fn certificates_by_owner(&self, owner: Address) -> BoxFuture<'_, LedgerResult<Vec<U256>>> {
        Box::pin(async move { self.query("getCertificatesByOwner", owner).await })
    }

    fn nonce_of(&self, issuer: Address) -> BoxFuture<'_, LedgerResult<U256>> {
        Box::pin(async move { self.query("nonces", issuer).await })
    }

    fn contract_owner(&self) -> BoxFuture<'_, LedgerResult<Address>> {
        Box::pin(async move { self.query("owner", ()).await })
    }

    fn owner_of(&self, token_id: U256) -> BoxFuture<'_, LedgerResult<Address>> {
        Box::pin(async move {
            match self.query("ownerOf", token_id).await {
                Err(LedgerError::Reverted(reason)) if is_missing_token(&reason) => {
                    Err(LedgerError::NotFound(token_id))
                }
                other => other,
            }
        })
    }

    fn token_uri(&self, token_id: U256) -> BoxFuture<'_, LedgerResult<String>> {
        Box::pin(async move {
            match self.query("tokenURI", token_id).await {
                Err(LedgerError::Reverted(reason)) if is_missing_token(&reason) => {
                    Err(LedgerError::NotFound(token_id))
                }
                other => other,
            }
        })
    }

    fn chain_id(&self) -> BoxFuture<'_, LedgerResult<U256>> {
        Box::pin(async move {
            let client = self.contract.client();
            with_timeout(self.timeouts.query, client.get_chainid())
                .await?
                .map_err(|e| LedgerError::Unavailable(e.to_string()))
        })
    }

    fn contract_address(&self) -> Address {
        self.contract.address()
    }
}

impl<M> LedgerWriter for CertificateRegistry<M>
where
    M: Middleware + 'static,
{
    fn issue_certificate(
        &self,
        recipient: Address,
        digest: &CertificateDigest,
    ) -> BoxFuture<'_, LedgerResult<TxOutcome>> {
        // Stored unprefixed and lower-case, like every digest issued so far
        let data_hash = digest.as_str().to_owned();
        Box::pin(async move { self.transact("issueCertificate", (recipient, data_hash)).await })
    }

    fn mint_with_signature(&self, signed: &SignedMintRequest) -> BoxFuture<'_, LedgerResult<TxOutcome>> {
        let params = (
            signed.request.recipient,
            signed.request.token_uri.clone(),
            signed.request.nonce,
            signed.signature.clone(),
        );
        Box::pin(async move { self.transact("mintWithSignature", params).await })
    }

    fn add_minter(&self, account: Address) -> BoxFuture<'_, LedgerResult<TxOutcome>> {
        Box::pin(async move { self.transact("addMinter", account).await })
    }

    fn remove_minter(&self, account: Address) -> BoxFuture<'_, LedgerResult<TxOutcome>> {
        Box::pin(async move { self.transact("removeMinter", account).await })
    }

    fn set_issuer_status(&self, issuer: Address, active: bool) -> BoxFuture<'_, LedgerResult<TxOutcome>> {
        Box::pin(async move { self.transact("setIssuerStatus", (issuer, active)).await })
    }

    fn set_base_uri(&self, base_uri: String) -> BoxFuture<'_, LedgerResult<TxOutcome>> {
        Box::pin(async move { self.transact("setBaseURI", base_uri).await })
    }
}
