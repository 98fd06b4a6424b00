use std::collections::HashMap;

use activity_core::{Activity, CacheKey, HistoryCursor, Interval, IntervalStore, KnownActivities};
use async_trait::async_trait;
use eyre::Result;
use parking_lot::Mutex;
use tracing::{debug, instrument};

use super::{closest_interval, splice_interval, DbResult, DB};

// these keys MUST not be given multiple uses in case multiple agents are
// started with the same database.

const INTERVALS: &str = "intervals_";
const ACTIVITY_BY_HASH: &str = "activity_by_hash_";

/// RocksDB backed interval store.
///
/// Keys --> Values:
/// - `intervals_<chain>:<account>` --> every interval of that history, newest first
/// - `activity_by_hash_<chain>:<account>:<hash>` --> activity as seen by that account
#[derive(Debug)]
pub struct RocksIntervalStore {
    db: DB,
    // serializes the read-modify-write of interval sets
    write_lock: Mutex<()>,
}

impl RocksIntervalStore {
    /// Instantiate a store over an opened db
    pub fn new(db: DB) -> Self {
        Self {
            db,
            write_lock: Mutex::new(()),
        }
    }

    fn retrieve_intervals<C: HistoryCursor>(&self, key: &CacheKey) -> DbResult<Vec<Interval<C>>> {
        Ok(self
            .db
            .retrieve_value(INTERVALS, key.to_string())?
            .unwrap_or_default())
    }

    // normalized activities only hold the operations involving the account,
    // so they are never shared between accounts
    fn store_activity(&self, key: &CacheKey, activity: &Activity) -> DbResult<()> {
        self.db.store_value(
            ACTIVITY_BY_HASH,
            format!("{}:{}", key.unfiltered(), activity.hash),
            activity,
        )
    }

    fn retrieve_activity(&self, key: &CacheKey, hash: &str) -> DbResult<Option<Activity>> {
        self.db
            .retrieve_value(ACTIVITY_BY_HASH, format!("{}:{hash}", key.unfiltered()))
    }
}

#[async_trait]
impl<C: HistoryCursor> IntervalStore<C> for RocksIntervalStore {
    async fn closest_interval(
        &self,
        key: &CacheKey,
        cursor: Option<&C>,
    ) -> Result<Option<Interval<C>>> {
        let intervals = self.retrieve_intervals::<C>(key)?;
        Ok(closest_interval(&intervals, cursor).cloned())
    }

    #[instrument(skip(self, key, activities), fields(%key, activities = activities.len()))]
    async fn put(
        &self,
        key: &CacheKey,
        upper_bound: Option<&C>,
        lower_bound: &C,
        activities: &[Activity],
    ) -> Result<()> {
        for activity in activities {
            self.store_activity(key, activity)?;
        }

        let _guard = self.write_lock.lock();
        let mut intervals = self.retrieve_intervals::<C>(key)?;
        splice_interval(
            &mut intervals,
            Interval::new(upper_bound.cloned(), lower_bound.clone(), activities.to_vec()),
        );
        debug!(intervals = intervals.len(), "Storing cached intervals");
        self.db.store_value(INTERVALS, key.to_string(), &intervals)?;
        Ok(())
    }
}

#[async_trait]
impl KnownActivities for RocksIntervalStore {
    async fn retrieve_activities_by_hash(
        &self,
        key: &CacheKey,
        hashes: &[String],
    ) -> Result<HashMap<String, Activity>> {
        let mut known = HashMap::new();
        for hash in hashes {
            if let Some(activity) = self.retrieve_activity(key, hash)? {
                known.insert(hash.clone(), activity);
            }
        }
        Ok(known)
    }
}

#[cfg(test)]
mod tests {
    use activity_core::AssetId;

    use super::*;
    use crate::test_utils::{activity, native_transfer, token_transfer, Height};

    fn open() -> (tempfile::TempDir, RocksIntervalStore) {
        let dir = tempfile::tempdir().unwrap();
        let db = DB::from_path(dir.path()).unwrap();
        (dir, RocksIntervalStore::new(db))
    }

    fn key() -> CacheKey {
        CacheKey::new("chainA".into(), "acct1".into())
    }

    #[tokio::test]
    async fn test_adjacent_puts_leave_no_gap() {
        let (_dir, store) = open();
        store.put(&key(), None, &Height(90), &[]).await.unwrap();
        store
            .put(&key(), Some(&Height(90)), &Height(40), &[activity("0x50", 50, vec![native_transfer()])])
            .await
            .unwrap();
        store
            .put(&key(), Some(&Height(40)), &Height(0), &[])
            .await
            .unwrap();

        let intervals = store.retrieve_intervals::<Height>(&key()).unwrap();
        for pair in intervals.windows(2) {
            assert_eq!(Some(pair[0].lower_bound), pair[1].upper_bound);
        }
        assert_eq!(intervals.len(), 3);
    }

    #[tokio::test]
    async fn test_closest_interval_and_known_activities_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let usdt = AssetId::token("0xusdt", None);
        {
            let store = RocksIntervalStore::new(DB::from_path(dir.path()).unwrap());
            store
                .put(&key(), Some(&Height(90)), &Height(40), &[activity("0x50", 50, vec![token_transfer(usdt)])])
                .await
                .unwrap();
        }

        let store = RocksIntervalStore::new(DB::from_path(dir.path()).unwrap());
        let interval: Interval<Height> = store
            .closest_interval(&key(), Some(&Height(95)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(interval.lower_bound, Height(40));

        let known = store
            .retrieve_activities_by_hash(&key(), &["0x50".to_owned(), "0x51".to_owned()])
            .await
            .unwrap();
        assert_eq!(known.len(), 1);
        assert!(known.contains_key("0x50"));
    }

    #[tokio::test]
    async fn test_known_activities_are_scoped_to_the_account() {
        let (_dir, store) = open();
        let alice = key();
        let bob = CacheKey::new("chainA".into(), "acct2".into());
        let mut for_alice = activity("0x50", 50, vec![native_transfer()]);
        for_alice.index = 1;
        let mut for_bob = activity("0x50", 50, vec![token_transfer(AssetId::token("0xusdt", None))]);
        for_bob.index = 2;

        store
            .put(&alice, Some(&Height(90)), &Height(40), &[for_alice.clone()])
            .await
            .unwrap();
        let hashes = ["0x50".to_owned()];
        assert!(store
            .retrieve_activities_by_hash(&bob, &hashes)
            .await
            .unwrap()
            .is_empty());

        store
            .put(&bob, Some(&Height(90)), &Height(40), &[for_bob.clone()])
            .await
            .unwrap();
        let known = store.retrieve_activities_by_hash(&alice, &hashes).await.unwrap();
        assert_eq!(known["0x50"], for_alice);
        let known = store
            .retrieve_activities_by_hash(&bob.clone().with_asset(AssetId::Native), &hashes)
            .await
            .unwrap();
        assert_eq!(known["0x50"], for_bob);
    }
}
