use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifies an asset on a chain.
///
/// Slugs are `native` for the chain's gas asset, `<contract>` for fungible
/// tokens without ids and `<contract>_<token_id>` for multi-token contracts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum AssetId {
    /// The chain's native asset
    Native,
    /// A token contract, optionally narrowed to one token id
    Token {
        /// Contract address
        contract: String,
        /// Token id within the contract, for multi-token standards
        token_id: Option<String>,
    },
}

impl AssetId {
    /// Token asset helper
    pub fn token(contract: impl Into<String>, token_id: Option<String>) -> Self {
        AssetId::Token {
            contract: contract.into(),
            token_id,
        }
    }

    /// The asset's slug, see the type-level docs.
    pub fn slug(&self) -> String {
        self.to_string()
    }
}

impl Display for AssetId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetId::Native => f.write_str("native"),
            AssetId::Token {
                contract,
                token_id: None,
            } => f.write_str(contract),
            AssetId::Token {
                contract,
                token_id: Some(id),
            } => write!(f, "{contract}_{id}"),
        }
    }
}

impl FromStr for AssetId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("native") {
            return Ok(AssetId::Native);
        }
        Ok(match s.split_once('_') {
            Some((contract, id)) => AssetId::token(contract, Some(id.to_owned())),
            None => AssetId::token(s, None),
        })
    }
}

impl From<AssetId> for String {
    fn from(id: AssetId) -> Self {
        id.to_string()
    }
}

impl From<String> for AssetId {
    fn from(slug: String) -> Self {
        match slug.parse() {
            Ok(id) => id,
            Err(never) => match never {},
        }
    }
}

/// Descriptor learned about an asset while parsing transfers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMetadata {
    /// Human readable name
    pub name: Option<String>,
    /// Ticker
    pub symbol: Option<String>,
    /// Number of decimals of the base unit
    pub decimals: Option<u8>,
}

/// Side-channel asset metadata produced by a fetch.
pub type AssetsMetadata = HashMap<AssetId, AssetMetadata>;

/// Final status of an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityStatus {
    /// Included and executed
    Applied,
    /// Included but reverted
    Failed,
    /// Backtracked, skipped or otherwise not applied
    Other,
}

/// One operation inside an activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum OperationKind {
    /// A movement of an asset between two accounts
    Transfer {
        /// Sender. For mints this is the zero address / the token contract.
        from: String,
        /// Receiver
        to: String,
        /// Moved asset
        asset: AssetId,
        /// Amount in base units as a decimal string
        amount: String,
    },
    /// An allowance grant
    Approval {
        /// Owner granting the allowance
        owner: String,
        /// Spender receiving the allowance
        spender: String,
        /// Asset the allowance applies to
        asset: AssetId,
        /// Allowance in base units as a decimal string
        amount: String,
    },
    /// A contract call that is not one of the more specific kinds
    Interaction {
        /// Called contract
        contract: String,
        /// Entrypoint or method name, if known
        entrypoint: Option<String>,
    },
    /// A baking / staking delegation change
    Delegation {
        /// New delegate, `None` when the delegation was withdrawn
        delegate: Option<String>,
    },
    /// A contract origination / deployment
    Deployment {
        /// Address of the new contract
        contract: String,
    },
}

/// An operation plus its ordering key inside the activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// What happened
    #[serde(flatten)]
    pub kind: OperationKind,
    /// Position of the emitting log, when the operation comes from a log
    pub log_index: Option<u64>,
}

impl Operation {
    /// Operation without a log index
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            log_index: None,
        }
    }

    /// Sets the log index
    pub fn with_log_index(mut self, log_index: u64) -> Self {
        self.log_index = Some(log_index);
        self
    }

    /// The asset this operation touches, if any
    pub fn asset(&self) -> Option<&AssetId> {
        match &self.kind {
            OperationKind::Transfer { asset, .. } | OperationKind::Approval { asset, .. } => {
                Some(asset)
            }
            _ => None,
        }
    }
}

/// One finalized, immutable history event for an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Transaction / operation group hash, unique within a chain
    pub hash: String,
    /// Timestamp of the including block
    pub added_at: DateTime<Utc>,
    /// Final status
    pub status: ActivityStatus,
    /// Operations ordered by log index
    pub operations: Vec<Operation>,
    /// Including block height
    pub block_height: u64,
    /// Backend-specific position used for ordering: the indexer's
    /// operation id for ledger indexers, the in-block position otherwise.
    ///
    /// An explorer activity built from token transfers alone has no known
    /// in-block position and carries its first log index instead. Within one
    /// block such activities keep log order among themselves, but their place
    /// relative to the account's own transactions is not meaningful.
    pub index: u64,
}

impl Activity {
    /// Ordering key, newest activities have the greatest key.
    pub fn position(&self) -> (u64, u64) {
        (self.block_height, self.index)
    }

    /// Whether the activity should be shown under the given asset filter.
    /// No filter matches everything.
    pub fn matches(&self, filter: Option<&AssetId>) -> bool {
        match filter {
            None => true,
            Some(wanted) => self.operations.iter().any(|op| op.asset() == Some(wanted)),
        }
    }

    /// Sorts operations by log index; operations without one (native
    /// transfers, top level calls) come first and keep their relative order.
    pub fn sort_operations(&mut self) {
        self.operations
            .sort_by_key(|op| op.log_index.map_or((0, 0), |i| (1, i)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer(asset: AssetId, log_index: Option<u64>) -> Operation {
        Operation {
            kind: OperationKind::Transfer {
                from: "a".into(),
                to: "b".into(),
                asset,
                amount: "1".into(),
            },
            log_index,
        }
    }

    #[test]
    fn test_asset_slug_round_trips_through_from_str() {
        for slug in ["native", "KT1abc", "KT1abc_0"] {
            let id: AssetId = slug.parse().unwrap();
            assert_eq!(id.slug(), slug);
        }
    }

    #[test]
    fn test_activity_matches_filter() {
        let usdt = AssetId::token("0xdac1", None);
        let activity = Activity {
            hash: "0x1".into(),
            added_at: DateTime::<Utc>::default(),
            status: ActivityStatus::Applied,
            operations: vec![transfer(usdt.clone(), Some(3))],
            block_height: 1,
            index: 0,
        };
        assert!(activity.matches(None));
        assert!(activity.matches(Some(&usdt)));
        assert!(!activity.matches(Some(&AssetId::Native)));
    }

    #[test]
    fn test_sort_operations_puts_unindexed_first() {
        let mut activity = Activity {
            hash: "0x1".into(),
            added_at: DateTime::<Utc>::default(),
            status: ActivityStatus::Applied,
            operations: vec![
                transfer(AssetId::token("t", None), Some(9)),
                transfer(AssetId::token("t", None), Some(2)),
                transfer(AssetId::Native, None),
            ],
            block_height: 1,
            index: 0,
        };
        activity.sort_operations();
        let order: Vec<_> = activity.operations.iter().map(|op| op.log_index).collect();
        assert_eq!(order, vec![None, Some(2), Some(9)]);
    }
}
