use tracing::warn;

use super::types::Positioned;
use super::{ExplorerCursor, PageCursor, PageParams};

/// The records one endpoint returned for the current page.
#[derive(Debug)]
pub(crate) struct EndpointPage<T> {
    /// Where the endpoint was asked to start
    pub requested: PageCursor,
    /// Newest first
    pub records: Vec<T>,
    /// `None` once the endpoint has nothing older
    pub next: Option<PageParams>,
}

impl<T: Positioned> EndpointPage<T> {
    /// An endpoint that was not queried because it is exhausted
    pub(crate) fn skipped() -> Self {
        Self {
            requested: PageCursor::Exhausted,
            records: vec![],
            next: None,
        }
    }

    /// Block of the last record, for endpoints that have more to give
    fn last_block(&self) -> Option<u64> {
        self.next?;
        self.records.last().map(|r| r.position().block_number)
    }

    fn has_record_above(&self, block: u64) -> bool {
        self.records
            .iter()
            .any(|r| r.position().block_number > block)
    }

    /// Keeps the records whose block passes `keep` and tells where the
    /// endpoint resumes: after its page when nothing was dropped, otherwise
    /// right below its last kept record.
    fn settle(self, keep: impl Fn(u64) -> bool) -> (Vec<T>, PageCursor) {
        let total = self.records.len();
        let kept: Vec<T> = self
            .records
            .into_iter()
            .filter(|r| keep(r.position().block_number))
            .collect();
        let resume = if kept.len() == total {
            self.next.map_or(PageCursor::Exhausted, PageCursor::At)
        } else {
            kept.last()
                .map_or(self.requested, |r| PageCursor::At(r.position()))
        };
        (kept, resume)
    }
}

/// Reconciles the pages of the two endpoints so that the combined page
/// never ends inside a block one endpoint has only partly listed.
///
/// The binding block is the highest last-record block among endpoints that
/// are not exhausted. Everything at or below it is left for the next page,
/// unless nothing lies above it, in which case only the records older than
/// it are left.
pub(crate) fn reconcile<A: Positioned, B: Positioned>(
    transactions: EndpointPage<A>,
    token_transfers: EndpointPage<B>,
) -> (Vec<A>, Vec<B>, ExplorerCursor) {
    let binding = transactions
        .last_block()
        .into_iter()
        .chain(token_transfers.last_block())
        .max();

    let keep: Box<dyn Fn(u64) -> bool> = match binding {
        None => Box::new(|_| true),
        Some(b) if transactions.has_record_above(b) || token_transfers.has_record_above(b) => {
            Box::new(move |block| block > b)
        }
        Some(b) => {
            warn!(
                block = b,
                "Page ends inside a single block, records of older blocks are left for the next page"
            );
            Box::new(move |block| block == b)
        }
    };

    let (transactions, tx_resume) = transactions.settle(&keep);
    let (token_transfers, transfers_resume) = token_transfers.settle(&keep);
    (
        transactions,
        token_transfers,
        ExplorerCursor {
            transactions: tx_resume,
            token_transfers: transfers_resume,
        },
    )
}
