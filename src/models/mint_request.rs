// src/models/mint_request.rs
//! Data model for the signature-based ("gasless") mint flow.
//!
//! An issuer signs a [`MintRequest`] off-chain; any relayer may then submit
//! the resulting [`SignedMintRequest`] to the contract and pay for gas.

use ethers_core::types::{Address, Bytes, H256, U256};
use serde::{Deserialize, Serialize};

/// The `CertificateData` struct bound by the issuer's EIP-712 signature.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MintRequest {
    pub recipient: Address,
    #[serde(rename = "tokenURI")]
    pub token_uri: String,
    /// Must equal the issuer's current on-chain nonce when relayed
    pub nonce: U256,
}

/// A mint request together with the issuer's signature over it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignedMintRequest {
    #[serde(flatten)]
    pub request: MintRequest,
    /// Address the signature is claimed to come from
    pub issuer: Address,
    /// 65-byte `r || s || v` signature
    pub signature: Bytes,
}

/// Result of a ledger mutation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TxOutcome {
    pub tx_hash: H256,
    /// Token minted by the transaction, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<U256>,
}
