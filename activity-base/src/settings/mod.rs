//! Settings of the history agents.
//!
//! ## Precedence
//! Sources are merged in this order, later ones overriding earlier ones:
//! 1. every `./config/*.json` file, in file name order
//! 2. files listed in the comma separated `CONFIG_FILES` env var
//! 3. env vars prefixed with `HIST_`, nesting separated by `__`, e.g.
//!    `HIST_TRACING__LEVEL=debug`
//!
//! Keys are snake case; the config loader lowercases them.

use std::{collections::HashMap, path::PathBuf};

use eyre::{eyre, Result};
use serde::Deserialize;
use url::Url;

pub use loader::*;
pub use trace::*;

mod loader;
mod trace;

/// Page size used when a backend does not configure one
pub const DEFAULT_PAGE_SIZE: u32 = 50;

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Settings shared by every history agent
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Path of the RocksDB interval cache
    pub db: PathBuf,
    /// Logging configuration
    #[serde(default)]
    pub tracing: TracingConfig,
    /// Configured chains by name
    #[serde(default)]
    pub chains: HashMap<String, ChainConf>,
}

impl Settings {
    /// Look up a configured chain
    pub fn chain(&self, name: &str) -> Result<&ChainConf> {
        self.chains
            .get(&name.to_ascii_lowercase())
            .ok_or_else(|| eyre!("No configuration found for chain {name}"))
    }
}

/// Configuration of one chain
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConf {
    /// Default account to page through
    pub account: Option<String>,
    /// Which indexer serves the chain's history
    pub backend: BackendConf,
}

/// Indexer backend of a chain.
///
/// Urls may carry `custom_header=Name:Value` query params, which are sent
/// as request headers instead of query params.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConf {
    /// Account-ledger indexer (TzKT API)
    Ledger {
        /// Indexer base url, e.g. `https://api.tzkt.io/v1`
        url: Url,
        /// Records per query shape
        #[serde(default = "default_page_size")]
        page_size: u32,
    },
    /// Single cursor balances API (Covalent API)
    BalancesApi {
        /// API base url, e.g. `https://api.covalenthq.com/v1`
        url: Url,
        /// The API's name of the chain, e.g. `eth-mainnet`
        chain_name: String,
        /// Transactions per page
        #[serde(default = "default_page_size")]
        page_size: u32,
    },
    /// Block explorer with separately paginated transactions and token
    /// transfers (Blockscout v2 API)
    Explorer {
        /// Explorer api base url, e.g. `https://eth.blockscout.com/api/v2`
        url: Url,
    },
}
