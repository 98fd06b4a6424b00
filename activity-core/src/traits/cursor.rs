use std::fmt::Debug;

use serde::{de::DeserializeOwned, Serialize};

/// A backend-specific position in backward-ordered history.
///
/// Cursors are totally ordered: newer positions compare greater, and every
/// backend has one fixed [`HistoryCursor::genesis`] cursor that compares less
/// than or equal to everything else and means "nothing older exists".
/// Callers treat cursors as opaque tokens: they are persisted and handed back
/// verbatim, never built or compared by hand.
pub trait HistoryCursor:
    Clone + Debug + Ord + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// The start-of-history sentinel
    fn genesis() -> Self;

    /// Whether nothing older than this cursor exists
    fn is_genesis(&self) -> bool {
        *self == Self::genesis()
    }

    /// Whether a cached interval whose upper bound is `upper_bound` picks up
    /// exactly where `self` leaves off, with nothing in between.
    fn continues_into(&self, upper_bound: &Self) -> bool {
        self == upper_bound
    }
}
