use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::{Activity, AssetId};

/// A cached, gap-free slice of history between two cursors.
///
/// The slice covers `(lower_bound, upper_bound]`. `upper_bound` is `None`
/// when the slice was fetched from the head of history, i.e. without an
/// `older_than` cursor, and then stands above every cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct Interval<C> {
    /// Newest boundary, the `older_than` cursor the slice was fetched with
    pub upper_bound: Option<C>,
    /// Oldest boundary; equals the next older interval's upper bound
    pub lower_bound: C,
    /// Activities in newest-to-oldest order
    pub activities: Vec<Activity>,
}

/// `a < b`, where a missing `b` is the head of history.
fn below<C: Ord>(a: &C, b: Option<&C>) -> bool {
    b.map_or(true, |b| a < b)
}

impl<C: Ord> Interval<C> {
    /// Whether this interval shares any history with `(lower, upper]`.
    pub fn overlaps(&self, upper: Option<&C>, lower: &C) -> bool {
        below(&self.lower_bound, upper) && below(lower, self.upper_bound.as_ref())
    }

    /// Whether the interval starts at or below `cursor`.
    pub fn starts_at_or_below(&self, cursor: Option<&C>) -> bool {
        match (self.upper_bound.as_ref(), cursor) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(upper), Some(cursor)) => upper <= cursor,
        }
    }
}

impl<C> Interval<C> {
    /// Activities matching an optional asset filter
    pub fn matching(&self, filter: Option<&AssetId>) -> Vec<Activity> {
        self.activities
            .iter()
            .filter(|a| a.matches(filter))
            .cloned()
            .collect()
    }
}
