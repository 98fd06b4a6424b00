use std::fmt::Debug;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{AssetId, AssetsMetadata, CacheKey, DescendingActivities, HistoryCursor, SourceResult};

/// One page produced by a remote source.
#[derive(Debug, Clone)]
pub struct SourcePage<C> {
    /// Activities matching the key's asset filter; returned to the caller
    pub matched: DescendingActivities,
    /// Every activity of the page; persisted under the unfiltered key
    pub all: DescendingActivities,
    /// Cursor to continue from
    pub next_cursor: C,
    /// Whether the source has no older history
    pub reached_end: bool,
    /// Asset descriptors seen while parsing the page
    pub assets_metadata: AssetsMetadata,
}

impl<C: HistoryCursor> SourcePage<C> {
    /// Builds a page from the full activity set, deriving the filtered subset.
    /// `reached_end` is implied when the next cursor is genesis.
    pub fn new(
        all: DescendingActivities,
        filter: Option<&AssetId>,
        next_cursor: C,
        reached_end: bool,
    ) -> Self {
        let matched = all.filtered(|a| a.matches(filter));
        let reached_end = reached_end || next_cursor.is_genesis();
        Self {
            matched,
            all,
            next_cursor,
            reached_end,
            assets_metadata: AssetsMetadata::default(),
        }
    }

    /// Attaches side-channel asset metadata
    pub fn with_assets_metadata(mut self, assets_metadata: AssetsMetadata) -> Self {
        self.assets_metadata = assets_metadata;
        self
    }
}

/// A remote history backend: turns a backward cursor into one page of
/// normalized activities plus the cursor to continue from.
#[async_trait]
pub trait ActivitySource: Send + Sync + Debug {
    /// Backend-specific pagination cursor
    type Cursor: HistoryCursor;

    /// Fetch the page of activities strictly older than `older_than`, or the
    /// newest page when no cursor is given.
    ///
    /// Implementations must stop their in-flight requests promptly once
    /// `cancel` fires and report [`crate::SourceError::Cancelled`].
    async fn fetch_page(
        &self,
        key: &CacheKey,
        older_than: Option<&Self::Cursor>,
        cancel: &CancellationToken,
    ) -> SourceResult<SourcePage<Self::Cursor>>;
}
