use std::sync::Arc;

use activity_core::{
    cancel::ensure_active, ActivitySource, CacheKey, CancellationToken, DescendingActivities,
    HistoryCursor, HttpClient, KnownActivities, SourceError, SourcePage, SourceResult,
};
use async_trait::async_trait;
use itertools::Itertools;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::normalize::normalize_group;
use crate::shapes::{QueryShape, ShapeRecord};
use crate::LedgerCursor;

/// History source backed by an account-ledger indexer (TzKT API).
///
/// A page is assembled from several disjoint query shapes. Operation groups
/// are only fetched for hashes that are not already cached.
#[derive(Debug)]
pub struct LedgerSource<H> {
    client: H,
    known: Arc<dyn KnownActivities>,
    page_size: u32,
    lower_limit: Option<u64>,
}

impl<H: HttpClient> LedgerSource<H> {
    /// Instantiate a source. `known` is consulted before fetching groups.
    pub fn new(client: H, known: Arc<dyn KnownActivities>, page_size: u32) -> Self {
        Self {
            client,
            known,
            page_size: page_size.max(1),
            lower_limit: None,
        }
    }

    /// Never page below this operation id
    pub fn with_lower_limit(mut self, lower_limit: u64) -> Self {
        self.lower_limit = Some(lower_limit);
        self
    }

    /// Fetch one shape, dropping records that do not parse. The page's last
    /// id is read from the raw listing so that unparsable records still bind
    /// the boundary.
    async fn fetch_shape(
        &self,
        shape: &QueryShape,
        upper: Option<u64>,
        lower: Option<u64>,
        cancel: &CancellationToken,
    ) -> SourceResult<ShapePage> {
        let query = shape.query(upper, lower, self.page_size);
        let raw: Vec<Value> = self.client.get_json(&shape.path, &query, cancel).await?;
        let last_id = if raw.len() >= self.page_size as usize {
            let last_id = raw.iter().filter_map(|r| r["id"].as_u64()).min();
            if last_id.is_none() {
                return Err(SourceError::malformed(
                    &shape.path,
                    format!("full {} page lists no operation id", shape.name),
                ));
            }
            last_id
        } else {
            None
        };
        let records = raw
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<ShapeRecord>(raw) {
                Ok(record) => Some(record),
                Err(err) => {
                    debug!(shape = shape.name, error = %err, "Skipping unparsable record");
                    None
                }
            })
            // not every endpoint bounds ids from below
            .filter(|record| lower.map_or(true, |lower| record.id >= lower))
            .collect();
        Ok(ShapePage { records, last_id })
    }
}

/// The parsed records of one shape.
#[derive(Debug, Default)]
pub(crate) struct ShapePage {
    pub records: Vec<ShapeRecord>,
    /// Lowest listed id when the shape filled its page
    pub last_id: Option<u64>,
}

/// Result of merging the query shapes of one page.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct MergedShapes {
    /// Distinct hashes, newest first
    pub hashes: Vec<String>,
    /// Highest last id among the shapes that returned a full page; `None`
    /// when every shape is exhausted
    pub boundary: Option<u64>,
}

/// Merges the records of all shapes of a page.
///
/// Shapes that filled their page may have more records below their last
/// id, so everything below the highest of those last ids is left for the
/// next page.
pub(crate) fn merge_shapes(shapes: Vec<ShapePage>) -> MergedShapes {
    let boundary = shapes.iter().filter_map(|shape| shape.last_id).max();
    let hashes = shapes
        .into_iter()
        .flat_map(|shape| shape.records)
        .filter(|record| boundary.map_or(true, |b| record.id >= b))
        .sorted_by(|a, b| b.id.cmp(&a.id))
        .map(|record| record.hash)
        .unique()
        .collect();
    MergedShapes { hashes, boundary }
}

#[async_trait]
impl<H: HttpClient> ActivitySource for LedgerSource<H> {
    type Cursor = LedgerCursor;

    #[instrument(skip_all, fields(%key, ?older_than))]
    async fn fetch_page(
        &self,
        key: &CacheKey,
        older_than: Option<&LedgerCursor>,
        cancel: &CancellationToken,
    ) -> SourceResult<SourcePage<LedgerCursor>> {
        ensure_active(cancel)?;
        let genesis = LedgerCursor::genesis();
        if older_than.is_some_and(HistoryCursor::is_genesis) {
            return Ok(SourcePage::new(
                DescendingActivities::default(),
                key.asset.as_ref(),
                genesis,
                true,
            ));
        }
        let upper = older_than.map(|c| c.upper_limit);
        let lower_limit = older_than.map_or(self.lower_limit, |c| c.lower_limit);

        let mut shapes = vec![];
        for shape in QueryShape::all(&key.account) {
            shapes.push(self.fetch_shape(&shape, upper, lower_limit, cancel).await?);
        }
        let merged = merge_shapes(shapes);

        let known = match self
            .known
            .retrieve_activities_by_hash(&key.unfiltered(), &merged.hashes)
            .await
        {
            Ok(known) => known,
            Err(err) => {
                warn!(error = ?err, "Failed to look up cached activities, fetching every group");
                Default::default()
            }
        };

        let mut fetched_groups = 0;
        let mut activities = Vec::with_capacity(merged.hashes.len());
        for hash in &merged.hashes {
            ensure_active(cancel)?;
            if let Some(activity) = known.get(hash) {
                activities.push(activity.clone());
                continue;
            }
            fetched_groups += 1;
            let group: Vec<Value> = self
                .client
                .get_json(&format!("operations/{hash}"), &[], cancel)
                .await?;
            activities.extend(normalize_group(hash, group, &key.account));
        }
        debug!(
            hashes = merged.hashes.len(),
            cached = known.len(),
            fetched = fetched_groups,
            "Assembled ledger page"
        );

        let next_cursor = match merged.boundary {
            // a group straddling the boundary was fetched whole; its ids
            // below the boundary must not be listed again
            Some(boundary) => {
                let upper = activities
                    .iter()
                    .map(|a| a.index)
                    .chain([boundary])
                    .min()
                    .unwrap_or(boundary);
                LedgerCursor::below(upper, lower_limit)
            }
            None => genesis,
        };
        let reached_end = next_cursor.is_genesis();
        Ok(SourcePage::new(
            DescendingActivities::sorted(activities),
            key.asset.as_ref(),
            if reached_end { genesis } else { next_cursor },
            reached_end,
        ))
    }
}
