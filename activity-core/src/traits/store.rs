use std::collections::HashMap;
use std::fmt::Debug;

use async_trait::async_trait;
use auto_impl::auto_impl;
use eyre::Result;

use crate::{Activity, CacheKey, Interval};

/// Persistent interval cache shared by every `fetch` of one backend.
///
/// Implementations must tolerate concurrent readers and writers for the
/// same key; last write wins.
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait IntervalStore<C: Send + Sync>: Send + Sync + Debug {
    /// The newest interval whose upper bound is at or below `cursor`, or the
    /// newest interval at all when no cursor is given.
    async fn closest_interval(&self, key: &CacheKey, cursor: Option<&C>)
        -> Result<Option<Interval<C>>>;

    /// Stores `activities` as the interval `(lower_bound, upper_bound]`,
    /// replacing every stored interval overlapping that range. Idempotent.
    async fn put(
        &self,
        key: &CacheKey,
        upper_bound: Option<&C>,
        lower_bound: &C,
        activities: &[Activity],
    ) -> Result<()>;
}

/// Lookup of activities already persisted for a history.
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait KnownActivities: Send + Sync + Debug {
    /// Returns the cached activities among `hashes`, keyed by hash.
    async fn retrieve_activities_by_hash(
        &self,
        key: &CacheKey,
        hashes: &[String],
    ) -> Result<HashMap<String, Activity>>;
}
