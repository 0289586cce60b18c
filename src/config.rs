// src/config.rs
//! Runtime configuration.
//!
//! Values come from built-in defaults overridden by `SERTIFYED_*` environment
//! variables (a `.env` file is loaded into the environment first by `main`).
//!
//! | Variable | Default |
//! |---|---|
//! | `SERTIFYED_RPC_URL` | `http://127.0.0.1:8545` |
//! | `SERTIFYED_CONTRACT_ADDRESS` | required |
//! | `SERTIFYED_PRIVATE_KEY` | unset (read-only mode) |
//! | `SERTIFYED_LISTEN_ADDR` | `127.0.0.1:3000` |
//! | `SERTIFYED_QUERY_TIMEOUT_MS` | `10000` |
//! | `SERTIFYED_CONFIRMATION_TIMEOUT_MS` | `120000` |
//! | `SERTIFYED_DOMAIN_NAME` | `Sertifyed` |
//! | `SERTIFYED_DOMAIN_VERSION` | `1` |
//! | `SERTIFYED_CHAIN_ID` | unset (asked from the node) |

use crate::blockchain::ledger_client::Timeouts;
use crate::services::relayer::DomainConfig;
use config::{Config, ConfigError, Environment};
use ethers_core::types::Address;
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

pub const ENV_PREFIX: &str = "SERTIFYED";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub rpc_url: String,
    pub contract_address: String,
    /// Operator key; without it the service can only read
    pub private_key: Option<String>,
    pub listen_addr: String,
    pub query_timeout_ms: u64,
    pub confirmation_timeout_ms: u64,
    pub domain_name: String,
    pub domain_version: String,
    pub chain_id: Option<u64>,
}

impl Settings {
    /// Loads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(Environment::with_prefix(ENV_PREFIX))
    }

    fn load(environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("rpc_url", "http://127.0.0.1:8545")?
            .set_default("listen_addr", "127.0.0.1:3000")?
            .set_default("query_timeout_ms", 10_000)?
            .set_default("confirmation_timeout_ms", 120_000)?
            .set_default("domain_name", "Sertifyed")?
            .set_default("domain_version", "1")?
            .add_source(environment.try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn contract_address(&self) -> Result<Address, ConfigError> {
        self.contract_address.trim().parse().map_err(|e| {
            ConfigError::Message(format!(
                "invalid contract address {:?}: {e}",
                self.contract_address
            ))
        })
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen_addr
            .parse()
            .map_err(|e| ConfigError::Message(format!("invalid listen address {:?}: {e}", self.listen_addr)))
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            query: Duration::from_millis(self.query_timeout_ms),
            confirmation: Duration::from_millis(self.confirmation_timeout_ms),
        }
    }

    pub fn domain(&self) -> DomainConfig {
        DomainConfig {
            name: self.domain_name.clone(),
            version: self.domain_version.clone(),
            chain_id: self.chain_id,
        }
    }
}
