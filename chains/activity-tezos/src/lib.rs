//! History source for Tezos accounts, backed by a TzKT-style ledger
//! indexer.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub use cursor::*;
pub use source::*;

mod cursor;
mod normalize;
mod shapes;
mod source;
