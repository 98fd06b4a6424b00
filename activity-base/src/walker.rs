use activity_core::{
    cancel::ensure_active, Activity, CacheKey, CancellationToken, Cancelled, HistoryCursor,
    IntervalStore,
};
use tracing::{debug, trace, warn};

use crate::ReusePolicy;

/// What a walk over cached intervals produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Walked<C> {
    /// Adopted activities, newest first, already filtered by the key's asset
    pub activities: Vec<Activity>,
    /// Cursor to continue from
    pub cursor: C,
    /// Whether the walk reached the start of history
    pub reached_end: bool,
}

impl<C: HistoryCursor> Walked<C> {
    fn genesis() -> Self {
        Self {
            activities: vec![],
            cursor: C::genesis(),
            reached_end: true,
        }
    }
}

/// Walks backward from `start` through the cached intervals of `key`.
///
/// Empty intervals (including those that are only empty after asset
/// filtering) are skipped without touching the network. Returns `Ok(None)`
/// on a cache miss: no interval below the cursor, an interval the policy
/// rejects, an interval that would not move the cursor backward, or a store
/// read error.
pub async fn walk<C, S, P>(
    store: &S,
    key: &CacheKey,
    start: Option<&C>,
    policy: &P,
    cancel: &CancellationToken,
) -> Result<Option<Walked<C>>, Cancelled>
where
    C: HistoryCursor,
    S: IntervalStore<C> + ?Sized,
    P: ReusePolicy<C> + ?Sized,
{
    let stored_under = key.unfiltered();
    let mut cursor = start.cloned();
    loop {
        ensure_active(cancel)?;
        if cursor.as_ref().is_some_and(HistoryCursor::is_genesis) {
            trace!(%key, "Walk reached genesis");
            return Ok(Some(Walked::genesis()));
        }

        let interval = match store.closest_interval(&stored_under, cursor.as_ref()).await {
            Ok(Some(interval)) => interval,
            Ok(None) => return Ok(None),
            Err(err) => {
                warn!(%key, ?cursor, error = ?err, "Failed to read cached interval, treating as a miss");
                return Ok(None);
            }
        };
        ensure_active(cancel)?;

        if !policy.accepts(cursor.as_ref(), &interval) {
            debug!(%key, ?cursor, upper = ?interval.upper_bound, ?policy, "Cached interval rejected");
            return Ok(None);
        }
        if let Some(current) = cursor.as_ref() {
            if interval.lower_bound >= *current {
                warn!(
                    %key,
                    cursor = ?current,
                    lower = ?interval.lower_bound,
                    "Cached interval does not move the cursor backward, treating as a miss"
                );
                return Ok(None);
            }
        }

        let activities = interval.matching(key.asset.as_ref());
        let lower = interval.lower_bound;
        if !activities.is_empty() || lower.is_genesis() {
            let reached_end = lower.is_genesis();
            return Ok(Some(Walked {
                activities,
                cursor: lower,
                reached_end,
            }));
        }
        trace!(%key, ?lower, "Skipping empty cached interval");
        cursor = Some(lower);
    }
}
