use std::fmt::{Display, Formatter};

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::AssetId;

/// Identifies one cached history: a chain, an account and an optional
/// asset filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct CacheKey {
    /// Configured chain name
    pub chain: String,
    /// Account address as the backend spells it
    pub account: String,
    /// Only activities touching this asset are returned
    #[new(default)]
    pub asset: Option<AssetId>,
}

impl CacheKey {
    /// Narrow the key to one asset
    pub fn with_asset(mut self, asset: AssetId) -> Self {
        self.asset = Some(asset);
        self
    }

    /// The same history without the asset filter. Pages are persisted under
    /// this key since the cache is shared by every filter.
    pub fn unfiltered(&self) -> Self {
        Self {
            chain: self.chain.clone(),
            account: self.account.clone(),
            asset: None,
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.asset {
            Some(asset) => write!(f, "{}:{}:{}", self.chain, self.account, asset),
            None => write!(f, "{}:{}", self.chain, self.account),
        }
    }
}
