//! History sources for EVM accounts.
//!
//! Two backends are supported: a balances API that pages by block height
//! (Covalent style) and a block explorer that pages its transactions and
//! token transfers independently (Blockscout v2 style).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub use balances::*;
pub use explorer::*;

mod balances;
mod calldata;
mod explorer;
