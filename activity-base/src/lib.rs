//! This crate contains the history engine shared by the agents: the
//! cache walker and cache-or-fetch engine, interval stores, settings,
//! tracing, metrics and the reqwest client the source adapters use.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]
#![forbid(unsafe_code)]

/// Interval stores: RocksDB and in-memory
pub mod db;

mod engine;
pub use engine::*;

mod http;
pub use http::*;

mod metrics;
pub use metrics::*;

mod policy;
pub use policy::*;

/// Settings and settings loading
pub mod settings;

mod walker;
pub use walker::*;

#[cfg(test)]
mod test_utils;
