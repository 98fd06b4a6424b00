use activity_core::{
    cancel::ensure_active, ActivitySource, AssetsMetadata, CacheKey, CancellationToken,
    DescendingActivities, HistoryCursor, HttpClient, SourceError, SourcePage, SourceResult,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use types::{Envelope, Transaction};

mod types;


/// Everything strictly below this block height. `BlockCursor(0)` is genesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockCursor(pub u64);

impl HistoryCursor for BlockCursor {
    fn genesis() -> Self {
        BlockCursor(0)
    }
}

/// History source backed by a balances API that lists an account's
/// transactions newest first and filters by block height (Covalent API).
#[derive(Debug)]
pub struct BalancesSource<H> {
    client: H,
    chain_name: String,
    page_size: u32,
}

impl<H: HttpClient> BalancesSource<H> {
    /// Instantiate a source. `chain_name` is the API's name of the chain.
    pub fn new(client: H, chain_name: impl Into<String>, page_size: u32) -> Self {
        Self {
            client,
            chain_name: chain_name.into(),
            page_size: page_size.max(1),
        }
    }

    fn path(&self, account: &str) -> String {
        format!("{}/address/{}/transactions_v3/", self.chain_name, account)
    }

    pub(crate) fn query(&self, older_than: Option<&BlockCursor>) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("block-signed-at-asc", "false".to_owned()),
            ("page-size", self.page_size.to_string()),
        ];
        if let Some(BlockCursor(below)) = older_than {
            query.push(("ending-block", below.saturating_sub(1).to_string()));
        }
        query
    }
}

#[async_trait]
impl<H: HttpClient> ActivitySource for BalancesSource<H> {
    type Cursor = BlockCursor;

    #[instrument(skip_all, fields(%key, ?older_than))]
    async fn fetch_page(
        &self,
        key: &CacheKey,
        older_than: Option<&BlockCursor>,
        cancel: &CancellationToken,
    ) -> SourceResult<SourcePage<BlockCursor>> {
        ensure_active(cancel)?;
        if older_than.is_some_and(HistoryCursor::is_genesis) {
            return Ok(SourcePage::new(
                DescendingActivities::default(),
                key.asset.as_ref(),
                BlockCursor::genesis(),
                true,
            ));
        }

        let path = self.path(&key.account);
        let envelope: Envelope = self
            .client
            .get_json(&path, &self.query(older_than), cancel)
            .await?;
        let data = match envelope.data {
            Some(data) if !envelope.error => data,
            _ => {
                return Err(SourceError::malformed(
                    path,
                    envelope
                        .error_message
                        .unwrap_or_else(|| "response without data".into()),
                ))
            }
        };

        let raw_len = data.items.len();
        let reached_end = match data.pagination.and_then(|p| p.has_more) {
            Some(has_more) => !has_more,
            None => raw_len < self.page_size as usize,
        };
        let mut activities = vec![];
        let mut metadata = AssetsMetadata::default();
        for item in data.items {
            match serde_json::from_value::<Transaction>(item) {
                Ok(tx) => {
                    let (activity, assets) = tx.into_activity(&key.account);
                    activities.push((activity, assets));
                }
                Err(err) => debug!(error = %err, "Skipping unparsable transaction"),
            }
        }

        let next_cursor = if reached_end {
            BlockCursor::genesis()
        } else {
            let heights = activities.iter().map(|(a, _)| a.block_height);
            let (Some(oldest), Some(newest)) = (heights.clone().min(), heights.max()) else {
                return Err(SourceError::malformed(path, "full page without usable items"));
            };
            if oldest < newest {
                // the page may have stopped inside its oldest block; that
                // block is listed in full on the next page
                activities.retain(|(a, _)| a.block_height > oldest);
                BlockCursor(oldest + 1)
            } else {
                warn!(
                    block = oldest,
                    page_size = self.page_size,
                    "Page holds a single block, older transactions of that block may be skipped"
                );
                BlockCursor(oldest)
            }
        };

        let activities = activities
            .into_iter()
            .map(|(activity, assets)| {
                metadata.extend(assets);
                activity
            })
            .collect();
        Ok(SourcePage::new(
            DescendingActivities::sorted(activities),
            key.asset.as_ref(),
            next_cursor,
            reached_end,
        )
        .with_assets_metadata(metadata))
    }
}
