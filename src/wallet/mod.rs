// src/wallet/mod.rs
//! Issuer keys and EIP-712 typed-data signing.

pub mod key_management;
pub mod typed_data;
