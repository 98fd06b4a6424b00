use activity_core::HistoryCursor;
use serde::{Deserialize, Serialize};

/// Explorer page params: the endpoint returns items strictly older than
/// `(block_number, index)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageParams {
    /// Block of the position
    pub block_number: u64,
    /// Transaction position or log index within the block
    pub index: u64,
}

impl PageParams {
    /// Position `index` of `block_number`
    pub fn new(block_number: u64, index: u64) -> Self {
        Self {
            block_number,
            index,
        }
    }

    pub(crate) fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("block_number", self.block_number.to_string()),
            ("index", self.index.to_string()),
        ]
    }
}

/// Where one endpoint resumes.
///
/// Variants are declared oldest first so the derived order runs from
/// `Exhausted` up to `Head`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageCursor {
    /// Nothing older is left on this endpoint
    Exhausted,
    /// Items strictly older than the params
    At(PageParams),
    /// The newest items
    Head,
}

impl PageCursor {
    pub(crate) fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            PageCursor::At(params) => params.query(),
            PageCursor::Exhausted | PageCursor::Head => vec![],
        }
    }
}

/// Pair of independent endpoint positions of the explorer source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerCursor {
    /// Position in the account's transactions
    pub transactions: PageCursor,
    /// Position in the account's token transfers
    pub token_transfers: PageCursor,
}

impl ExplorerCursor {
    /// Both endpoints from their newest items
    pub fn head() -> Self {
        Self {
            transactions: PageCursor::Head,
            token_transfers: PageCursor::Head,
        }
    }
}

impl HistoryCursor for ExplorerCursor {
    fn genesis() -> Self {
        Self {
            transactions: PageCursor::Exhausted,
            token_transfers: PageCursor::Exhausted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_is_smallest() {
        let genesis = ExplorerCursor::genesis();
        let partial = ExplorerCursor {
            transactions: PageCursor::Exhausted,
            token_transfers: PageCursor::At(PageParams::new(0, 0)),
        };
        assert!(genesis < partial);
        assert!(partial < ExplorerCursor::head());
        assert!(genesis.is_genesis());
        assert!(!partial.is_genesis());
    }

    #[test]
    fn test_cursor_serializes_as_an_opaque_token() {
        let cursor = ExplorerCursor {
            transactions: PageCursor::At(PageParams::new(100, 3)),
            token_transfers: PageCursor::Exhausted,
        };
        let token = serde_json::to_string(&cursor).unwrap();
        assert_eq!(
            token,
            r#"{"transactions":{"at":{"block_number":100,"index":3}},"tokenTransfers":"exhausted"}"#
        );
        assert_eq!(serde_json::from_str::<ExplorerCursor>(&token).unwrap(), cursor);
    }
}
