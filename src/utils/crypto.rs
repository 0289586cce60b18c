// src/utils/crypto.rs
//! Hash primitives used by the service.
//!
//! - SHA-256 (via `ring`) for certificate data digests
//! - Keccak-256 (Ethereum's hash) for EIP-712 typed data

use ethers_core::utils::keccak256;
use ring::digest::{digest, SHA256};

/// Computes the SHA-256 digest of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(digest(&SHA256, data).as_ref());
    out
}

/// Computes a Keccak-256 hash of the input data (Ethereum-compatible).
pub fn keccak(data: &[u8]) -> [u8; 32] {
    keccak256(data)
}
