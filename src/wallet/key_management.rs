// src/wallet/key_management.rs
//! Issuer key management.
//!
//! Wraps the operator's secp256k1 key (via `k256`) as an ethers wallet used for:
//! - Signing ledger transactions (through `SignerMiddleware`)
//! - Signing EIP-712 mint authorizations for the relayer flow

use crate::models::mint_request::{MintRequest, SignedMintRequest};
use crate::wallet::typed_data::{signing_hash, SigningDomain};
use ethers::signers::{LocalWallet, Signer, Wallet, WalletError};
use ethers_core::types::Address;
use ethers_core::utils::hex;
use k256::ecdsa::SigningKey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    #[error("signing failed: {0}")]
    Signing(#[from] WalletError),
}

/// Holds the issuer/operator key.
///
/// # Security Notes
/// - The secret key is never exposed; only the address is public
/// - Signatures are deterministic (RFC 6979)
#[derive(Clone, Debug)]
pub struct KeyManager {
    wallet: LocalWallet,
}

impl KeyManager {
    /// Builds a key manager from a hex-encoded private key (with or without 0x prefix).
    ///
    /// # Errors
    /// `InvalidKey` if the string is not hex or not a valid secp256k1 scalar.
    pub fn from_private_key(private_key: &str, chain_id: u64) -> Result<Self, KeyError> {
        let trimmed = private_key.trim();
        let bytes = hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
            .map_err(|e| KeyError::InvalidKey(e.to_string()))?;
        let signing_key =
            SigningKey::from_slice(&bytes).map_err(|e| KeyError::InvalidKey(e.to_string()))?;
        Ok(Self::from_signing_key(signing_key, chain_id))
    }

    pub fn from_signing_key(signing_key: SigningKey, chain_id: u64) -> Self {
        Self {
            wallet: Wallet::from(signing_key).with_chain_id(chain_id),
        }
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// Wallet used to sign transactions.
    pub fn wallet(&self) -> &LocalWallet {
        &self.wallet
    }

    /// Signs a `CertificateData` mint authorization as the issuer.
    ///
    /// The returned request carries this key's address as `issuer` and a
    /// 65-byte `r || s || v` signature the contract can `ecrecover`.
    pub fn sign_mint_request(
        &self,
        domain: &SigningDomain,
        request: MintRequest,
    ) -> Result<SignedMintRequest, KeyError> {
        let signature = self.wallet.sign_hash(signing_hash(domain, &request))?;
        Ok(SignedMintRequest {
            request,
            issuer: self.address(),
            signature: signature.to_vec().into(),
        })
    }
}
