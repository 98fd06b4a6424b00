use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::PageParams;

/// One page of an explorer endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct ExplorerPage {
    /// Kept raw so one bad item does not spoil the page
    #[serde(default)]
    pub items: Vec<Value>,
    pub next_page_params: Option<PageParams>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AddressRef {
    pub hash: String,
}

/// Item of `addresses/{a}/transactions`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ExplorerTransaction {
    pub hash: String,
    #[serde(alias = "block")]
    pub block_number: u64,
    pub timestamp: DateTime<Utc>,
    pub status: Option<String>,
    pub from: AddressRef,
    pub to: Option<AddressRef>,
    pub value: Option<String>,
    pub raw_input: Option<String>,
    pub created_contract: Option<AddressRef>,
    pub position: Option<u64>,
    pub method: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenInfo {
    #[serde(alias = "address_hash")]
    pub address: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
    /// The explorer reports decimals as a string
    pub decimals: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TransferTotal {
    pub value: Option<String>,
    pub token_id: Option<String>,
}

/// Item of `addresses/{a}/token-transfers`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenTransfer {
    #[serde(alias = "tx_hash")]
    pub transaction_hash: String,
    pub block_number: u64,
    pub log_index: u64,
    pub timestamp: DateTime<Utc>,
    pub from: AddressRef,
    pub to: AddressRef,
    pub token: TokenInfo,
    pub total: Option<TransferTotal>,
}

/// An endpoint item with a position in history
pub(crate) trait Positioned {
    fn position(&self) -> PageParams;
}

impl Positioned for ExplorerTransaction {
    fn position(&self) -> PageParams {
        PageParams::new(self.block_number, self.position.unwrap_or_default())
    }
}

impl Positioned for TokenTransfer {
    fn position(&self) -> PageParams {
        PageParams::new(self.block_number, self.log_index)
    }
}
