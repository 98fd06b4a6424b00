use std::io::Write;

use activity_base::{FetchRequest, HistorySync};
use activity_core::{ActivitySource, CacheKey, CancellationToken, Cancelled, IntervalStore};
use eyre::Result;
use tracing::{debug, info, warn};

/// Pages backwards through the history of `key`, writing every page to
/// `out` as one line of JSON. Stops at the end of history, after
/// `max_pages` pages, on cancellation, or once a page makes no progress.
///
/// Returns the number of pages written.
pub(crate) async fn page_through<S, St, W>(
    sync: &HistorySync<S, St>,
    key: CacheKey,
    max_pages: Option<u32>,
    cancel: &CancellationToken,
    out: &mut W,
) -> Result<u32>
where
    S: ActivitySource,
    St: IntervalStore<S::Cursor>,
    W: Write,
{
    let mut cursor = None;
    let mut pages = 0;
    while max_pages.map_or(true, |max| pages < max) {
        let page = match sync
            .fetch(FetchRequest::new(key.clone(), cursor.clone()), cancel)
            .await
        {
            Ok(page) => page,
            Err(Cancelled) => {
                info!(pages, "Cancelled");
                break;
            }
        };
        pages += 1;
        serde_json::to_writer(&mut *out, &page)?;
        writeln!(out)?;
        debug!(
            activities = page.activities.len(),
            reached_end = page.reached_end,
            "Wrote page"
        );

        if page.reached_end {
            break;
        }
        if page.next_cursor == cursor {
            warn!(?cursor, "History source unavailable, stopping");
            break;
        }
        cursor = page.next_cursor;
    }
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use activity_base::db::InMemoryIntervalStore;
    use activity_core::{
        test_utils::MockHttpClient, Activity, ActivityStatus, DescendingActivities,
        HistoryCursor, SourceError, SourcePage, SourceResult,
    };
    use activity_evm::{ExplorerCursor, ExplorerSource};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
    struct Block(u64);

    impl HistoryCursor for Block {
        fn genesis() -> Self {
            Block(0)
        }
    }

    /// One activity per block, from `head` down to block 1
    #[derive(Debug)]
    struct Countdown {
        head: u64,
        available: bool,
    }

    #[async_trait]
    impl ActivitySource for Countdown {
        type Cursor = Block;

        async fn fetch_page(
            &self,
            key: &CacheKey,
            older_than: Option<&Block>,
            _cancel: &CancellationToken,
        ) -> SourceResult<SourcePage<Block>> {
            if !self.available {
                return Err(SourceError::from_other_str("offline"));
            }
            let block = older_than.map_or(self.head, |b| b.0 - 1);
            let activity = Activity {
                hash: format!("0x{block}"),
                added_at: DateTime::<Utc>::default(),
                status: ActivityStatus::Applied,
                operations: vec![],
                block_height: block,
                index: 0,
            };
            Ok(SourcePage::new(
                DescendingActivities::sorted(vec![activity]),
                key.asset.as_ref(),
                Block(block),
                block == 1,
            ))
        }
    }

    fn sync(head: u64, available: bool) -> HistorySync<Countdown, InMemoryIntervalStore<Block>> {
        HistorySync::new(
            Countdown { head, available },
            InMemoryIntervalStore::default(),
        )
    }

    fn key() -> CacheKey {
        CacheKey::new("test".into(), "acct".into())
    }

    #[tokio::test]
    async fn test_pages_until_end_of_history() {
        let mut out = vec![];
        let pages = page_through(&sync(3, true), key(), None, &CancellationToken::new(), &mut out)
            .await
            .unwrap();
        assert_eq!(pages, 3);
        let lines: Vec<serde_json::Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["activities"][0]["hash"], "0x3");
        assert_eq!(lines[2]["reachedEnd"], true);
    }

    #[tokio::test]
    async fn test_stops_at_page_limit() {
        let mut out = vec![];
        let pages = page_through(&sync(10, true), key(), Some(2), &CancellationToken::new(), &mut out)
            .await
            .unwrap();
        assert_eq!(pages, 2);
    }

    #[tokio::test]
    async fn test_stops_when_source_is_unavailable() {
        let mut out = vec![];
        let pages = page_through(&sync(10, false), key(), None, &CancellationToken::new(), &mut out)
            .await
            .unwrap();
        assert_eq!(pages, 1);
    }

    #[tokio::test]
    async fn test_cancelled_run_writes_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut out = vec![];
        let pages = page_through(&sync(10, true), key(), None, &cancel, &mut out)
            .await
            .unwrap();
        assert_eq!(pages, 0);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_explorer_serves_cached_page() {
        const ACCOUNT: &str = "0xa11ce00000000000000000000000000000000000";
        let txs = format!("addresses/{ACCOUNT}/transactions");
        let transfers = format!("addresses/{ACCOUNT}/token-transfers");
        let client = MockHttpClient::new();
        client.register_value(
            txs.clone(),
            json!({
                "items": [{
                    "hash": "0x1",
                    "block_number": 10,
                    "timestamp": "2024-05-01T08:00:00.000000Z",
                    "status": "ok",
                    "from": { "hash": ACCOUNT },
                    "to": { "hash": "0xb0b0000000000000000000000000000000000001" },
                    "value": "7",
                    "raw_input": "0x",
                    "position": 0
                }],
                "next_page_params": null
            }),
        );
        client.register_value(transfers.clone(), json!({ "items": [], "next_page_params": null }));
        let history = HistorySync::new(
            ExplorerSource::new(client.clone()),
            InMemoryIntervalStore::<ExplorerCursor>::default(),
        );
        let key = CacheKey::new("ethereum".into(), ACCOUNT.into());
        let cancel = CancellationToken::new();

        let fresh = history
            .fetch(FetchRequest::new(key.clone(), None), &cancel)
            .await
            .unwrap();
        assert_eq!(fresh.activities.len(), 1);

        client.register_failure(transfers);
        let stale = history
            .fetch(FetchRequest::new(key, None), &cancel)
            .await
            .unwrap();
        assert_eq!(stale.activities, fresh.activities);
        assert!(stale.reached_end);
        assert_eq!(client.call_count(&txs), 2);
    }
}
