use activity_core::HistoryCursor;
use serde::{Deserialize, Serialize};

/// Range of indexer operation ids still to be paged through: everything
/// with `lower_limit <= id < upper_limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerCursor {
    /// Exclusive upper id limit
    pub upper_limit: u64,
    /// Inclusive lower id limit, `None` for the whole history
    pub lower_limit: Option<u64>,
}

impl LedgerCursor {
    /// Cursor for the ids below `upper_limit`
    pub fn below(upper_limit: u64, lower_limit: Option<u64>) -> Self {
        Self {
            upper_limit,
            lower_limit,
        }
    }
}

impl HistoryCursor for LedgerCursor {
    fn genesis() -> Self {
        Self::below(0, None)
    }

    /// The range is empty once the limits meet.
    fn is_genesis(&self) -> bool {
        self.upper_limit <= self.lower_limit.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_is_smallest_and_detects_empty_ranges() {
        let genesis = LedgerCursor::genesis();
        assert!(genesis <= LedgerCursor::below(1, None));
        assert!(genesis <= LedgerCursor::below(0, Some(0)));
        assert!(LedgerCursor::below(500, Some(500)).is_genesis());
        assert!(!LedgerCursor::below(501, Some(500)).is_genesis());
    }
}
