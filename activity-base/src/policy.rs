use std::fmt::Debug;

use activity_core::{HistoryCursor, Interval};

/// Decides whether a cached interval may answer a request positioned at
/// `cursor`.
pub trait ReusePolicy<C>: Debug + Send + Sync {
    /// `cursor` is `None` when walking from the head of history.
    fn accepts(&self, cursor: Option<&C>, interval: &Interval<C>) -> bool;
}

/// Only reuse an interval that starts exactly where the caller left off.
#[derive(Debug, Clone, Copy, Default)]
pub struct Contiguous;

impl<C: HistoryCursor> ReusePolicy<C> for Contiguous {
    fn accepts(&self, cursor: Option<&C>, interval: &Interval<C>) -> bool {
        match (cursor, interval.upper_bound.as_ref()) {
            (None, None) => true,
            (Some(cursor), Some(upper)) => cursor.continues_into(upper),
            _ => false,
        }
    }
}

/// Reuse whatever is cached, even if history between the cursor and the
/// interval was never fetched. Used when the source is unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptStale;

impl<C: HistoryCursor> ReusePolicy<C> for AcceptStale {
    fn accepts(&self, _cursor: Option<&C>, _interval: &Interval<C>) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::Height;

    fn interval(upper: Option<u64>, lower: u64) -> Interval<Height> {
        Interval::new(upper.map(Height), Height(lower), vec![])
    }

    #[test]
    fn test_contiguous_requires_matching_upper_bound() {
        assert!(Contiguous.accepts(Some(&Height(50)), &interval(Some(50), 10)));
        assert!(!Contiguous.accepts(Some(&Height(70)), &interval(Some(50), 10)));
        assert!(!Contiguous.accepts(Some(&Height(70)), &interval(None, 10)));
        assert!(Contiguous.accepts(None, &interval(None, 10)));
        assert!(!Contiguous.accepts(None, &interval(Some(50), 10)));
    }

    #[test]
    fn test_accept_stale_accepts_gaps() {
        assert!(AcceptStale.accepts(Some(&Height(70)), &interval(Some(50), 10)));
        assert!(AcceptStale.accepts(None, &interval(Some(50), 10)));
    }
}
