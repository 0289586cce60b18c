// src/blockchain/memory_ledger.rs
//! In-memory stand-in for the certificate contract, used by service and API tests.

use crate::blockchain::ledger::{LedgerReader, LedgerResult, LedgerWriter};
use crate::errors::LedgerError;
use crate::models::certificate::{CertificateDigest, OnChainCertificate};
use crate::models::mint_request::{SignedMintRequest, TxOutcome};
use crate::wallet::typed_data::{recover_signer, SigningDomain};
use ethers_core::types::{Address, H256, U256};
use futures::future::BoxFuture;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const CHAIN_ID: u64 = 31337;

#[derive(Default)]
struct State {
    details: HashMap<U256, (Address, String)>,
    owners: HashMap<U256, Address>,
    uris: HashMap<U256, String>,
    nonces: HashMap<Address, U256>,
    issuers: HashSet<Address>,
    minters: HashSet<Address>,
    base_uri: String,
    next_token: u64,
    tx_count: u64,
}

/// Contract double with the same observable behaviour as the deployed contract.
pub struct MemoryLedger {
    state: Mutex<State>,
    /// Account whose transactions this ledger executes
    caller: Address,
    contract: Address,
    delay: Option<Duration>,
    offline: bool,
    queries: AtomicUsize,
}

impl MemoryLedger {
    pub fn new(caller: Address) -> Self {
        Self {
            state: Mutex::new(State {
                next_token: 1,
                ..Default::default()
            }),
            caller,
            contract: Address::repeat_byte(0x5f),
            delay: None,
            offline: false,
            queries: AtomicUsize::new(0),
        }
    }

    /// Every call sleeps for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every call fails as if the node were unreachable.
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    pub fn domain(&self) -> SigningDomain {
        SigningDomain {
            name: "Sertifyed".into(),
            version: "1".into(),
            chain_id: U256::from(CHAIN_ID),
            verifying_contract: self.contract,
        }
    }

    /// Stores a certificate held by `owner` as if it had been issued by `issuer`.
    pub fn insert(&self, token_id: u64, owner: Address, issuer: Address, data_hash: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .details
            .insert(U256::from(token_id), (issuer, data_hash.to_string()));
        state.owners.insert(U256::from(token_id), owner);
    }

    pub fn register_issuer(&self, issuer: Address) {
        self.state.lock().unwrap().issuers.insert(issuer);
    }

    pub fn base_uri(&self) -> String {
        self.state.lock().unwrap().base_uri.clone()
    }

    pub fn is_minter(&self, account: Address) -> bool {
        self.state.lock().unwrap().minters.contains(&account)
    }

    /// Number of ledger calls served so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> LedgerResult<()> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.offline {
            return Err(LedgerError::Unavailable("connection refused".into()));
        }
        Ok(())
    }

    fn receipt(state: &mut State, token_id: Option<U256>) -> TxOutcome {
        state.tx_count += 1;
        TxOutcome {
            tx_hash: H256::from_low_u64_be(state.tx_count),
            token_id,
        }
    }

    fn mint(state: &mut State, recipient: Address, issuer: Address, data_hash: String, uri: String) -> U256 {
        let token_id = U256::from(state.next_token);
        state.next_token += 1;
        state.details.insert(token_id, (issuer, data_hash));
        state.owners.insert(token_id, recipient);
        state.uris.insert(token_id, uri);
        token_id
    }
}

impl LedgerReader for MemoryLedger {
    fn certificate_details(&self, token_id: U256) -> BoxFuture<'_, LedgerResult<OnChainCertificate>> {
        Box::pin(async move {
            self.enter().await?;
            let state = self.state.lock().unwrap();
            let (issuer_address, data_hash) = state
                .details
                .get(&token_id)
                .cloned()
                .ok_or(LedgerError::NotFound(token_id))?;
            Ok(OnChainCertificate {
                token_id,
                issuer_address,
                data_hash,
            })
        })
    }

    fn certificates_by_owner(&self, owner: Address) -> BoxFuture<'_, LedgerResult<Vec<U256>>> {
        Box::pin(async move {
            self.enter().await?;
            let state = self.state.lock().unwrap();
            let mut tokens: Vec<U256> = state
                .owners
                .iter()
                .filter(|(_, holder)| **holder == owner)
                .map(|(token_id, _)| *token_id)
                .collect();
            tokens.sort();
            Ok(tokens)
        })
    }

    fn nonce_of(&self, issuer: Address) -> BoxFuture<'_, LedgerResult<U256>> {
        Box::pin(async move {
            self.enter().await?;
            let state = self.state.lock().unwrap();
            Ok(state.nonces.get(&issuer).copied().unwrap_or_default())
        })
    }

    fn contract_owner(&self) -> BoxFuture<'_, LedgerResult<Address>> {
        Box::pin(async move {
            self.enter().await?;
            Ok(self.caller)
        })
    }

    fn owner_of(&self, token_id: U256) -> BoxFuture<'_, LedgerResult<Address>> {
        Box::pin(async move {
            self.enter().await?;
            let state = self.state.lock().unwrap();
            state.owners.get(&token_id).copied().ok_or(LedgerError::NotFound(token_id))
        })
    }

    fn token_uri(&self, token_id: U256) -> BoxFuture<'_, LedgerResult<String>> {
        Box::pin(async move {
            self.enter().await?;
            let state = self.state.lock().unwrap();
            if !state.owners.contains_key(&token_id) {
                return Err(LedgerError::NotFound(token_id));
            }
            let uri = state.uris.get(&token_id).cloned().unwrap_or_default();
            Ok(format!("{}{}", state.base_uri, uri))
        })
    }

    fn chain_id(&self) -> BoxFuture<'_, LedgerResult<U256>> {
        Box::pin(async move {
            self.enter().await?;
            Ok(U256::from(CHAIN_ID))
        })
    }

    fn contract_address(&self) -> Address {
        self.contract
    }
}

impl LedgerWriter for MemoryLedger {
    fn issue_certificate(
        &self,
        recipient: Address,
        digest: &CertificateDigest,
    ) -> BoxFuture<'_, LedgerResult<TxOutcome>> {
        let data_hash = digest.as_str().to_owned();
        Box::pin(async move {
            self.enter().await?;
            let mut state = self.state.lock().unwrap();
            if !state.minters.contains(&self.caller) && !state.issuers.contains(&self.caller) {
                return Err(LedgerError::Reverted("Caller is not a minter".into()));
            }
            let token_id = Self::mint(&mut state, recipient, self.caller, data_hash, String::new());
            Ok(Self::receipt(&mut state, Some(token_id)))
        })
    }

    fn mint_with_signature(&self, signed: &SignedMintRequest) -> BoxFuture<'_, LedgerResult<TxOutcome>> {
        let signed = signed.clone();
        Box::pin(async move {
            self.enter().await?;
            let signer = recover_signer(&self.domain(), &signed)
                .map_err(|e| LedgerError::Reverted(e.to_string()))?;
            let mut state = self.state.lock().unwrap();
            if !state.issuers.contains(&signer) {
                return Err(LedgerError::Reverted("Signer is not an authorized issuer".into()));
            }
            let nonce = state.nonces.entry(signer).or_default();
            if *nonce != signed.request.nonce {
                return Err(LedgerError::Reverted("Invalid nonce".into()));
            }
            *nonce += U256::one();
            let token_id = Self::mint(
                &mut state,
                signed.request.recipient,
                signer,
                String::new(),
                signed.request.token_uri.clone(),
            );
            Ok(Self::receipt(&mut state, Some(token_id)))
        })
    }

    fn add_minter(&self, account: Address) -> BoxFuture<'_, LedgerResult<TxOutcome>> {
        Box::pin(async move {
            self.enter().await?;
            let mut state = self.state.lock().unwrap();
            state.minters.insert(account);
            Ok(Self::receipt(&mut state, None))
        })
    }

    fn remove_minter(&self, account: Address) -> BoxFuture<'_, LedgerResult<TxOutcome>> {
        Box::pin(async move {
            self.enter().await?;
            let mut state = self.state.lock().unwrap();
            state.minters.remove(&account);
            Ok(Self::receipt(&mut state, None))
        })
    }

    fn set_issuer_status(&self, issuer: Address, active: bool) -> BoxFuture<'_, LedgerResult<TxOutcome>> {
        Box::pin(async move {
            self.enter().await?;
            let mut state = self.state.lock().unwrap();
            if active {
                state.issuers.insert(issuer);
            } else {
                state.issuers.remove(&issuer);
            }
            Ok(Self::receipt(&mut state, None))
        })
    }

    fn set_base_uri(&self, base_uri: String) -> BoxFuture<'_, LedgerResult<TxOutcome>> {
        Box::pin(async move {
            self.enter().await?;
            let mut state = self.state.lock().unwrap();
            state.base_uri = base_uri;
            Ok(Self::receipt(&mut state, None))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inserted_certificate_belongs_to_owner_not_issuer() {
        let issuer = Address::repeat_byte(0xaa);
        let student = Address::repeat_byte(0xf5);
        let ledger = MemoryLedger::new(issuer);
        ledger.insert(1, student, issuer, "00");

        assert_eq!(ledger.certificates_by_owner(student).await.unwrap(), vec![U256::one()]);
        assert!(ledger.certificates_by_owner(issuer).await.unwrap().is_empty());
        assert_eq!(ledger.certificate_details(U256::one()).await.unwrap().issuer_address, issuer);
    }
}
