use std::collections::HashMap;

use activity_core::{
    cancel::ensure_active, ActivitySource, CacheKey, CancellationToken, DescendingActivities,
    HistoryCursor, HttpClient, SourceError, SourcePage, SourceResult,
};
use async_trait::async_trait;
use futures_util::try_join;
use itertools::Itertools;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

pub use cursor::*;
use normalize::{normalize_transaction, normalize_transfers, transfers_metadata};
use reconcile::{reconcile, EndpointPage};
use types::{ExplorerPage, ExplorerTransaction, Positioned, TokenTransfer};

mod cursor;
mod normalize;
mod reconcile;
mod types;


/// History source backed by a block explorer that pages an account's
/// transactions and its token transfers separately (Blockscout v2 API).
///
/// Both endpoints are queried concurrently and reconciled so that no
/// transaction is ever split across two pages.
#[derive(Debug)]
pub struct ExplorerSource<H> {
    client: H,
}

impl<H: HttpClient> ExplorerSource<H> {
    /// Instantiate a source
    pub fn new(client: H) -> Self {
        Self { client }
    }

    async fn fetch_endpoint<T: DeserializeOwned + Positioned>(
        &self,
        path: String,
        requested: PageCursor,
        cancel: &CancellationToken,
    ) -> SourceResult<EndpointPage<T>> {
        if requested == PageCursor::Exhausted {
            return Ok(EndpointPage::skipped());
        }
        let page: ExplorerPage = self
            .client
            .get_json(&path, &requested.query(), cancel)
            .await?;
        let mut records: Vec<T> = page
            .items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<T>(item) {
                Ok(record) => Some(record),
                Err(err) => {
                    debug!(%path, error = %err, "Skipping unparsable item");
                    None
                }
            })
            .collect();
        records.sort_by_key(|r| std::cmp::Reverse(r.position()));
        if let (Some(next), PageCursor::At(requested)) = (page.next_page_params, requested) {
            if next >= requested {
                return Err(SourceError::malformed(
                    path,
                    format!("next page params {next:?} do not precede {requested:?}"),
                ));
            }
        }
        Ok(EndpointPage {
            requested,
            records,
            next: page.next_page_params,
        })
    }
}

#[async_trait]
impl<H: HttpClient> ActivitySource for ExplorerSource<H> {
    type Cursor = ExplorerCursor;

    #[instrument(skip_all, fields(%key, ?older_than))]
    async fn fetch_page(
        &self,
        key: &CacheKey,
        older_than: Option<&ExplorerCursor>,
        cancel: &CancellationToken,
    ) -> SourceResult<SourcePage<ExplorerCursor>> {
        ensure_active(cancel)?;
        let from = older_than.copied().unwrap_or_else(ExplorerCursor::head);
        if from.is_genesis() {
            return Ok(SourcePage::new(
                DescendingActivities::default(),
                key.asset.as_ref(),
                from,
                true,
            ));
        }

        let (transactions, token_transfers) = try_join!(
            self.fetch_endpoint::<ExplorerTransaction>(
                format!("addresses/{}/transactions", key.account),
                from.transactions,
                cancel,
            ),
            self.fetch_endpoint::<TokenTransfer>(
                format!("addresses/{}/token-transfers", key.account),
                from.token_transfers,
                cancel,
            ),
        )?;
        let (transactions, token_transfers, next_cursor) =
            reconcile(transactions, token_transfers);
        debug!(
            transactions = transactions.len(),
            token_transfers = token_transfers.len(),
            ?next_cursor,
            "Reconciled explorer page"
        );

        let metadata = transfers_metadata(&token_transfers);
        let mut transfers_by_hash: HashMap<String, Vec<TokenTransfer>> = token_transfers
            .into_iter()
            .into_group_map_by(|t| t.transaction_hash.to_lowercase());

        let mut activities = Vec::with_capacity(transactions.len());
        for tx in transactions.into_iter().unique_by(|tx| tx.hash.to_lowercase()) {
            let transfers = transfers_by_hash
                .remove(&tx.hash.to_lowercase())
                .unwrap_or_default();
            activities.push(normalize_transaction(tx, &transfers));
        }
        activities.extend(
            transfers_by_hash
                .into_iter()
                .filter_map(|(_, transfers)| {
                    let hash = transfers.first()?.transaction_hash.clone();
                    normalize_transfers(hash, &transfers)
                }),
        );

        Ok(SourcePage::new(
            DescendingActivities::sorted(activities),
            key.asset.as_ref(),
            next_cursor,
            false,
        )
        .with_assets_metadata(metadata))
    }
}
