use std::{collections::HashMap, fmt::Debug, sync::Arc};

use activity_core::{Activity, CacheKey, Interval, IntervalStore, KnownActivities};
use async_trait::async_trait;
use eyre::Result;
use parking_lot::RwLock;

use super::{closest_interval, splice_interval};

/// Process-local interval store. Cloning shares the underlying map.
#[derive(Debug, Clone)]
pub struct InMemoryIntervalStore<C> {
    intervals: Arc<RwLock<HashMap<CacheKey, Vec<Interval<C>>>>>,
}

impl<C> Default for InMemoryIntervalStore<C> {
    fn default() -> Self {
        Self {
            intervals: Default::default(),
        }
    }
}

impl<C: Clone> InMemoryIntervalStore<C> {
    /// Every interval stored under `key`, newest first
    pub fn intervals(&self, key: &CacheKey) -> Vec<Interval<C>> {
        self.intervals.read().get(key).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl<C> IntervalStore<C> for InMemoryIntervalStore<C>
where
    C: Clone + Ord + Debug + Send + Sync,
{
    async fn closest_interval(
        &self,
        key: &CacheKey,
        cursor: Option<&C>,
    ) -> Result<Option<Interval<C>>> {
        let intervals = self.intervals.read();
        Ok(intervals
            .get(key)
            .and_then(|set| closest_interval(set, cursor))
            .cloned())
    }

    async fn put(
        &self,
        key: &CacheKey,
        upper_bound: Option<&C>,
        lower_bound: &C,
        activities: &[Activity],
    ) -> Result<()> {
        let interval = Interval::new(
            upper_bound.cloned(),
            lower_bound.clone(),
            activities.to_vec(),
        );
        let mut intervals = self.intervals.write();
        splice_interval(intervals.entry(key.clone()).or_default(), interval);
        Ok(())
    }
}

#[async_trait]
impl<C> KnownActivities for InMemoryIntervalStore<C>
where
    C: Debug + Send + Sync,
{
    async fn retrieve_activities_by_hash(
        &self,
        key: &CacheKey,
        hashes: &[String],
    ) -> Result<HashMap<String, Activity>> {
        let intervals = self.intervals.read();
        Ok(intervals
            .get(&key.unfiltered())
            .into_iter()
            .flatten()
            .flat_map(|interval| interval.activities.iter())
            .filter(|activity| hashes.contains(&activity.hash))
            .map(|activity| (activity.hash.clone(), activity.clone()))
            .collect())
    }
}
