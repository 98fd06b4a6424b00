use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::Activity;

/// Activities out of order; carries the offending pair of positions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("activities are not newest-first: {newer:?} precedes {older:?}")]
pub struct OrderError {
    /// Position of the element that should have been newer
    pub newer: (u64, u64),
    /// Position of the element that follows it
    pub older: (u64, u64),
}

/// A sequence of activities descending by `(block_height, index)`, i.e.
/// newest first, with no repeated hashes.
///
/// Every adapter hands its page to the engine in this form, so "the last
/// element is the oldest" holds wherever a page is consumed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Activity>", into = "Vec<Activity>")]
pub struct DescendingActivities(Vec<Activity>);

impl DescendingActivities {
    /// Sorts newest-first, dropping repeated hashes (the first, i.e. newest,
    /// occurrence wins).
    pub fn sorted(mut activities: Vec<Activity>) -> Self {
        activities.sort_by(|a, b| b.position().cmp(&a.position()));
        let mut seen = std::collections::HashSet::new();
        activities.retain(|a| seen.insert(a.hash.clone()));
        Self(activities)
    }

    /// Keeps only the activities matching the predicate, order is preserved.
    pub fn filtered(&self, mut keep: impl FnMut(&Activity) -> bool) -> Self {
        Self(self.0.iter().filter(|a| keep(a)).cloned().collect())
    }

    /// The oldest activity of the sequence
    pub fn oldest(&self) -> Option<&Activity> {
        self.0.last()
    }

    /// Unwraps into the inner vector
    pub fn into_inner(self) -> Vec<Activity> {
        self.0
    }
}

/// Accepts only strictly descending input.
impl TryFrom<Vec<Activity>> for DescendingActivities {
    type Error = OrderError;

    fn try_from(activities: Vec<Activity>) -> Result<Self, Self::Error> {
        if let Some(pair) = activities
            .windows(2)
            .find(|pair| pair[0].position() <= pair[1].position())
        {
            return Err(OrderError {
                newer: pair[0].position(),
                older: pair[1].position(),
            });
        }
        Ok(Self(activities))
    }
}

impl From<DescendingActivities> for Vec<Activity> {
    fn from(value: DescendingActivities) -> Self {
        value.0
    }
}

impl Deref for DescendingActivities {
    type Target = [Activity];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::ActivityStatus;

    fn activity(hash: &str, block_height: u64, index: u64) -> Activity {
        Activity {
            hash: hash.into(),
            added_at: DateTime::<Utc>::default(),
            status: ActivityStatus::Applied,
            operations: vec![],
            block_height,
            index,
        }
    }

    #[test]
    fn test_sorted_orders_newest_first_and_dedupes() {
        let seq = DescendingActivities::sorted(vec![
            activity("a", 1, 0),
            activity("c", 3, 1),
            activity("b", 3, 0),
            activity("c", 3, 1),
        ]);
        let hashes: Vec<_> = seq.iter().map(|a| a.hash.as_str()).collect();
        assert_eq!(hashes, vec!["c", "b", "a"]);
        assert_eq!(seq.oldest().unwrap().hash, "a");
    }

    #[test]
    fn test_try_from_rejects_ascending_input() {
        let err = DescendingActivities::try_from(vec![activity("a", 1, 0), activity("b", 2, 0)])
            .unwrap_err();
        assert_eq!(err.newer, (1, 0));
        assert_eq!(err.older, (2, 0));
    }
}
