use activity_core::{
    Activity, ActivityStatus, AssetId, AssetMetadata, Operation, OperationKind,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::calldata::same_address;

/// Response envelope of the balances API
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    pub data: Option<TransactionsData>,
    #[serde(default)]
    pub error: bool,
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransactionsData {
    /// Kept raw so one bad item does not spoil the page
    #[serde(default)]
    pub items: Vec<Value>,
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Pagination {
    pub has_more: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Transaction {
    pub block_signed_at: DateTime<Utc>,
    pub block_height: u64,
    pub tx_hash: String,
    pub tx_offset: u64,
    pub successful: Option<bool>,
    pub from_address: String,
    pub to_address: Option<String>,
    pub value: Option<String>,
    #[serde(default)]
    pub log_events: Vec<LogEvent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LogEvent {
    pub log_offset: u64,
    pub sender_address: String,
    pub sender_name: Option<String>,
    pub sender_contract_ticker_symbol: Option<String>,
    pub sender_contract_decimals: Option<u8>,
    pub decoded: Option<DecodedEvent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DecodedEvent {
    pub name: String,
    #[serde(default)]
    pub params: Vec<EventParam>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EventParam {
    pub name: String,
    pub value: Option<Value>,
}

impl DecodedEvent {
    fn param(&self, name: &str) -> Option<String> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| match p.value.as_ref()? {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    }
}

impl LogEvent {
    fn metadata(&self) -> AssetMetadata {
        AssetMetadata {
            name: self.sender_name.clone(),
            symbol: self.sender_contract_ticker_symbol.clone(),
            decimals: self.sender_contract_decimals,
        }
    }

    /// Operation described by the event, when it concerns `account`
    fn operation(&self, account: &str) -> Option<Operation> {
        let decoded = self.decoded.as_ref()?;
        let kind = match decoded.name.as_str() {
            "Transfer" => {
                let from = decoded.param("from")?;
                let to = decoded.param("to")?;
                if !same_address(&from, account) && !same_address(&to, account) {
                    return None;
                }
                // ERC-721 transfers carry a token id instead of a value
                let (token_id, amount) = match decoded.param("value") {
                    Some(value) => (None, value),
                    None => (Some(decoded.param("tokenId")?), "1".to_owned()),
                };
                OperationKind::Transfer {
                    from,
                    to,
                    asset: AssetId::token(self.sender_address.to_lowercase(), token_id),
                    amount,
                }
            }
            "Approval" => {
                let owner = decoded.param("owner")?;
                if !same_address(&owner, account) {
                    return None;
                }
                OperationKind::Approval {
                    owner,
                    spender: decoded.param("spender")?,
                    asset: AssetId::token(self.sender_address.to_lowercase(), None),
                    amount: decoded.param("value")?,
                }
            }
            _ => return None,
        };
        Some(Operation::new(kind).with_log_index(self.log_offset))
    }
}

impl Transaction {
    /// Normalizes the transaction as seen by `account`, together with the
    /// descriptors of the tokens it moved.
    pub(crate) fn into_activity(self, account: &str) -> (Activity, Vec<(AssetId, AssetMetadata)>) {
        let mut operations = vec![];
        let mut metadata = vec![];

        if let Some(value) = self.value.as_deref().filter(|v| *v != "0") {
            if let Some(to) = &self.to_address {
                operations.push(Operation::new(OperationKind::Transfer {
                    from: self.from_address.clone(),
                    to: to.clone(),
                    asset: AssetId::Native,
                    amount: value.to_owned(),
                }));
            }
        }
        for event in &self.log_events {
            if let Some(op) = event.operation(account) {
                if let Some(asset) = op.asset() {
                    metadata.push((asset.clone(), event.metadata()));
                }
                operations.push(op);
            }
        }
        if operations.is_empty() {
            if let Some(to) = &self.to_address {
                operations.push(Operation::new(OperationKind::Interaction {
                    contract: to.clone(),
                    entrypoint: None,
                }));
            }
        }

        let mut activity = Activity {
            hash: self.tx_hash,
            added_at: self.block_signed_at,
            status: match self.successful {
                Some(true) => ActivityStatus::Applied,
                Some(false) => ActivityStatus::Failed,
                None => ActivityStatus::Other,
            },
            operations,
            block_height: self.block_height,
            index: self.tx_offset,
        };
        activity.sort_operations();
        (activity, metadata)
    }
}
