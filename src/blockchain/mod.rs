// src/blockchain/mod.rs
//! Ledger access: capability traits and the EVM JSON-RPC client.

pub mod ledger;
pub mod ledger_client;

#[cfg(test)]
pub mod memory_ledger;
