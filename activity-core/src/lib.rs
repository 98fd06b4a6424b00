//! This crate contains core primitives, traits, and types shared by the
//! activity history engine and its per-backend source adapters.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]
#![forbid(unsafe_code)]

pub use error::*;

/// Cooperative cancellation helpers
pub mod cancel;
pub use cancel::CancellationToken;
/// Error types
mod error;
/// Traits at the engine / adapter / store seams
pub mod traits;
pub use traits::*;

/// Core activity data structures
pub mod types;
pub use types::*;

/// Test utilities shared by adapter crates
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
