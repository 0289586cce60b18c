// src/blockchain/ledger_client.rs
//! EVM JSON-RPC client for the certificate contract.
//!
//! Provides the connection to the chain hosting the contract, wallet wiring
//! for signed transactions, and the timeout / error classification shared by
//! every contract call.

use crate::contracts::certificate_registry::CertificateRegistry;
use crate::errors::LedgerError;
use crate::wallet::key_management::KeyManager;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers_contract::ContractError;
use ethers_core::types::{Address, U256};
use ethers_core::utils::id;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Middleware stack used for transactions signed by the operator key.
pub type SigningProvider = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Time limits applied to ledger calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Limit for a read, or for submitting a transaction
    pub query: Duration,
    /// Limit for a submitted transaction to be mined
    pub confirmation: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            query: Duration::from_secs(10),
            confirmation: Duration::from_secs(120),
        }
    }
}

/// Connection to an EVM node.
///
/// Cloning is cheap; the underlying HTTP client is shared.
#[derive(Clone, Debug)]
pub struct LedgerClient {
    provider: Provider<Http>,
    timeouts: Timeouts,
}

impl LedgerClient {
    /// Creates a client for the node at `rpc_url`.
    ///
    /// No request is sent until the first call.
    ///
    /// # Errors
    /// `Unavailable` if the URL cannot be parsed.
    pub fn new(rpc_url: &str, timeouts: Timeouts) -> Result<Self, LedgerError> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| LedgerError::Unavailable(format!("invalid RPC url {rpc_url}: {e}")))?;
        Ok(Self { provider, timeouts })
    }

    /// Fetches the chain id reported by the node.
    pub async fn chain_id(&self) -> Result<u64, LedgerError> {
        with_timeout(self.timeouts.query, self.provider.get_chainid())
            .await?
            .map(|id| id.as_u64())
            .map_err(|e| LedgerError::Unavailable(e.to_string()))
    }

    /// Read-only handle on the contract at `contract_address`.
    ///
    /// Write calls on the returned registry fail with `SignerRequired`.
    pub fn reader(
        &self,
        contract_address: Address,
    ) -> Result<CertificateRegistry<Provider<Http>>, LedgerError> {
        CertificateRegistry::new(
            Arc::new(self.provider.clone()),
            contract_address,
            self.timeouts,
            false,
        )
    }

    /// Handle on the contract that signs transactions with `keys`.
    pub fn writer(
        &self,
        contract_address: Address,
        keys: &KeyManager,
    ) -> Result<CertificateRegistry<SigningProvider>, LedgerError> {
        let middleware = SignerMiddleware::new(self.provider.clone(), keys.wallet().clone());
        log::debug!(
            "signing transactions as {:?} on chain {}",
            keys.address(),
            keys.wallet().chain_id()
        );
        CertificateRegistry::new(Arc::new(middleware), contract_address, self.timeouts, true)
    }
}

/// Runs `fut`, reporting expiry as [`LedgerError::Unavailable`].
pub(crate) async fn with_timeout<F: Future>(limit: Duration, fut: F) -> Result<F::Output, LedgerError> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| LedgerError::Unavailable(format!("no response within {} ms", limit.as_millis())))
}

/// Custom error raised by OpenZeppelin 5 ERC-721 for unknown token ids.
const NONEXISTENT_TOKEN_ERROR: &str = "ERC721NonexistentToken(uint256)";

/// Token id carried by an `ERC721NonexistentToken` revert, if `data` is one.
fn nonexistent_token(data: &[u8]) -> Option<U256> {
    if data.len() != 36 || data[..4] != id(NONEXISTENT_TOKEN_ERROR)[..] {
        return None;
    }
    Some(U256::from_big_endian(&data[4..]))
}

/// Maps an ethers contract error onto the ledger taxonomy.
///
/// An `ERC721NonexistentToken` revert becomes `NotFound`. Other reverts
/// (decoded `Error(string)` reasons, raw revert data, or node messages
/// mentioning a revert) become `Reverted`; any other transport failure
/// becomes `Unavailable`; ABI problems become `Decoding`.
pub(crate) fn classify_contract_error<M: Middleware>(err: ContractError<M>) -> LedgerError {
    if let Some(reason) = err.decode_revert::<String>() {
        return LedgerError::Reverted(reason);
    }
    if let Some(data) = err.as_revert() {
        if let Some(token_id) = nonexistent_token(data) {
            return LedgerError::NotFound(token_id);
        }
        return LedgerError::Reverted(data.to_string());
    }
    match err {
        ContractError::MiddlewareError { .. } | ContractError::ProviderError { .. } => {
            let message = err.to_string();
            if message.to_ascii_lowercase().contains("revert") {
                LedgerError::Reverted(message)
            } else {
                LedgerError::Unavailable(message)
            }
        }
        other => LedgerError::Decoding(other.to_string()),
    }
}
