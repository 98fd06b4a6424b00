use activity_core::{
    cancel::ensure_active, Activity, ActivitySource, AssetsMetadata, CacheKey, CancellationToken,
    Cancelled, HistoryCursor, IntervalStore, SourcePage,
};
use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::{walk, AcceptStale, Contiguous, HistoryMetrics, Walked};

/// One page request against a history.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct FetchRequest<C> {
    /// History to page through
    pub key: CacheKey,
    /// Only return activities strictly older than this cursor; `None` for
    /// the newest page.
    pub older_than: Option<C>,
}

/// One page of history as served to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchedPage<C> {
    /// Activities matching the key's asset filter, newest first
    pub activities: Vec<Activity>,
    /// Asset descriptors the source returned along with the page
    pub assets_metadata: AssetsMetadata,
    /// Whether there is no older history
    pub reached_end: bool,
    /// Cursor for the next (older) page. Equals the request cursor when
    /// nothing could be served, so the caller can retry.
    pub next_cursor: Option<C>,
}

impl<C> FetchedPage<C> {
    fn empty(next_cursor: Option<C>) -> Self {
        Self {
            activities: vec![],
            assets_metadata: AssetsMetadata::default(),
            reached_end: false,
            next_cursor,
        }
    }
}

impl<C> From<Walked<C>> for FetchedPage<C> {
    fn from(walked: Walked<C>) -> Self {
        Self {
            activities: walked.activities,
            assets_metadata: AssetsMetadata::default(),
            reached_end: walked.reached_end,
            next_cursor: Some(walked.cursor),
        }
    }
}

/// Cache-or-fetch history pager over one source and one interval store.
///
/// Cached intervals are served when they continue exactly where the caller
/// left off. Otherwise the source is asked for the page, and the full
/// unfiltered page is persisted so every asset filter can reuse it. When the
/// source fails the cache is served regardless of contiguity.
#[derive(Debug)]
pub struct HistorySync<S, St> {
    source: S,
    store: St,
    metrics: Option<HistoryMetrics>,
}

impl<S, St> HistorySync<S, St>
where
    S: ActivitySource,
    St: IntervalStore<S::Cursor>,
{
    /// Instantiate a pager without metrics
    pub fn new(source: S, store: St) -> Self {
        Self {
            source,
            store,
            metrics: None,
        }
    }

    /// Record hit / miss / fallback counters
    pub fn with_metrics(mut self, metrics: HistoryMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Serve one page of history.
    ///
    /// Only cancellation is reported as an error; a failing source degrades
    /// to cached data or to an empty, not-ended page.
    #[instrument(skip_all, fields(key = %request.key, older_than = ?request.older_than))]
    pub async fn fetch(
        &self,
        request: FetchRequest<S::Cursor>,
        cancel: &CancellationToken,
    ) -> Result<FetchedPage<S::Cursor>, Cancelled> {
        ensure_active(cancel)?;
        let FetchRequest { key, older_than } = request;

        if let Some(cursor) = older_than.as_ref() {
            if let Some(walked) = walk(&self.store, &key, Some(cursor), &Contiguous, cancel).await? {
                debug!(activities = walked.activities.len(), reached_end = walked.reached_end, "Served page from cache");
                self.count(&key, |m| &m.cache_hits);
                return Ok(walked.into());
            }
        }
        self.count(&key, |m| &m.cache_misses);

        match self
            .source
            .fetch_page(&key, older_than.as_ref(), cancel)
            .await
        {
            Ok(page) => {
                ensure_active(cancel)?;
                self.persist(&key, older_than.as_ref(), &page).await;
                let next_cursor = if page.reached_end {
                    S::Cursor::genesis()
                } else {
                    page.next_cursor
                };
                Ok(FetchedPage {
                    activities: page.matched.into_inner(),
                    assets_metadata: page.assets_metadata,
                    reached_end: page.reached_end,
                    next_cursor: Some(next_cursor),
                })
            }
            Err(err) if err.is_cancelled() => Err(Cancelled),
            Err(err) => {
                warn!(error = %err, "Source failed, serving cached history regardless of contiguity");
                self.count(&key, |m| &m.stale_fallbacks);
                let fallback =
                    walk(&self.store, &key, older_than.as_ref(), &AcceptStale, cancel).await?;
                Ok(match fallback {
                    Some(walked) => walked.into(),
                    None => {
                        info!("No cached history to fall back to");
                        FetchedPage::empty(older_than)
                    }
                })
            }
        }
    }

    /// Best effort: failures are logged and counted, never returned.
    async fn persist(
        &self,
        key: &CacheKey,
        upper_bound: Option<&S::Cursor>,
        page: &SourcePage<S::Cursor>,
    ) {
        let lower_bound = if page.reached_end {
            S::Cursor::genesis()
        } else {
            page.next_cursor.clone()
        };
        if upper_bound.is_some_and(|upper| lower_bound >= *upper) {
            warn!(?upper_bound, ?lower_bound, "Source did not move the cursor backward, not caching page");
            return;
        }
        if let Err(err) = self
            .store
            .put(&key.unfiltered(), upper_bound, &lower_bound, &page.all)
            .await
        {
            warn!(error = ?err, "Failed to cache fetched page");
            self.count(key, |m| &m.store_failures);
        }
    }

    fn count(&self, key: &CacheKey, counter: impl Fn(&HistoryMetrics) -> &prometheus::IntCounterVec) {
        if let Some(metrics) = &self.metrics {
            counter(metrics).with_label_values(&[key.chain.as_str()]).inc();
        }
    }
}
