// src/main.rs

//! # SertifyEd Certificate Integrity Verifier - Main Entry Point
//!
//! Loads configuration, connects to the node hosting the certificate contract
//! and starts the API server.
//!
//! ## Architecture Overview
//! 1. **Blockchain Layer**: `LedgerClient` and the `LedgerReader` / `LedgerWriter` capabilities
//! 2. **Contracts Layer**: `CertificateRegistry` bindings for the ERC-721 certificate contract
//! 3. **Services Layer**: Issuance, signature relaying, verification and API endpoints
//! 4. **Cryptography Layer**: Canonical hashing, operator keys and EIP-712 signing
//!
//! Environment variables read at startup are listed in `src/config.rs`.

use crate::blockchain::ledger_client::LedgerClient;
use crate::config::Settings;
use crate::services::api_server::ApiServer;
use crate::utils::canonical::{CanonicalHasher, CanonicalScheme};
use crate::wallet::key_management::KeyManager;
use anyhow::Context;
use dotenv::dotenv;
use std::sync::Arc;

// Module declarations (organized by functional domain)
mod blockchain; // Ledger capabilities and JSON-RPC client
mod config; // Environment configuration
mod contracts; // Contract bindings
mod errors; // Error taxonomy
mod models; // Data structures
mod services; // Business logic and API
mod utils; // Hashing helpers
mod wallet; // Keys and typed-data signing

/// Main application entry point
///
/// # Initialization Sequence
/// 1. Load `.env` and environment configuration
/// 2. Connect to the node and resolve the chain id
/// 3. Bind the contract, signing with the operator key when one is configured
/// 4. Start API server
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::from_env().context("failed to load configuration")?;
    let contract_address = settings.contract_address()?;
    let addr = settings.listen_addr()?;

    let client = LedgerClient::new(&settings.rpc_url, settings.timeouts())?;
    let chain_id = match settings.chain_id {
        Some(id) => id,
        None => client
            .chain_id()
            .await
            .context("could not reach the node to read its chain id")?,
    };
    log::info!(
        "certificate contract 0x{:x} on chain {} via {}",
        contract_address,
        chain_id,
        settings.rpc_url
    );

    let hasher = CanonicalHasher::new(CanonicalScheme::JsonV1);
    log::info!("hashing certificates with scheme {}", hasher.scheme().name());
    let mut domain = settings.domain();
    domain.chain_id = Some(chain_id);

    let server = match settings.private_key.as_deref() {
        Some(private_key) => {
            let keys = KeyManager::from_private_key(private_key, chain_id)
                .context("invalid SERTIFYED_PRIVATE_KEY")?;
            log::info!("operator account 0x{:x}", keys.address());
            let registry = client.writer(contract_address, &keys)?;
            ApiServer::new(Arc::new(registry), Some(keys), hasher, domain)
        }
        None => {
            log::warn!("no operator key configured; write endpoints will answer 501");
            let registry = client.reader(contract_address)?;
            ApiServer::new(Arc::new(registry), None, hasher, domain)
        }
    };

    server.run(addr).await?;
    Ok(())
}
