use eyre::Result;
use tracing_subscriber::{
    filter::{LevelFilter, Targets},
    prelude::*,
};

pub use self::fmt::Style;

/// Log output layers, all writing to stderr
mod fmt;

/// Dependencies whose own debug output drowns the fetcher's. They log at info
/// unless the configured level is `trace`.
const CHATTY_TARGETS: [&str; 3] = ["hyper", "reqwest", "rocksdb"];

/// Maximum verbosity of the history agents' logs. Unknown names read as
/// `info`.
#[derive(Default, Debug, Clone, Copy, serde::Deserialize, PartialOrd, Ord, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Level {
    /// Nothing is logged
    Off = 0,
    /// Failures only
    Error = 1,
    /// Degraded pages, stale fallbacks and store failures
    Warn = 2,
    /// Per-request detail, including skipped records
    Debug = 4,
    /// Cache walks step by step
    Trace = 5,
    /// Per-page progress
    #[serde(other)]
    #[default]
    Info = 3,
}

impl From<Level> for LevelFilter {
    fn from(level: Level) -> LevelFilter {
        match level {
            Level::Off => LevelFilter::OFF,
            Level::Error => LevelFilter::ERROR,
            Level::Warn => LevelFilter::WARN,
            Level::Info => LevelFilter::INFO,
            Level::Debug => LevelFilter::DEBUG,
            Level::Trace => LevelFilter::TRACE,
        }
    }
}

/// Configuration for the tracing subscribers used by history agents
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct TracingConfig {
    /// Output format
    #[serde(default)]
    pub fmt: Style,
    /// Maximum level logged
    #[serde(default)]
    pub level: Level,
}

impl TracingConfig {
    fn targets(&self) -> Targets {
        let targets = Targets::new().with_default(self.level);
        if self.level == Level::Trace {
            return targets;
        }
        CHATTY_TARGETS.into_iter().fold(targets, |targets, target| {
            targets.with_target(target, self.level.min(Level::Info))
        })
    }

    /// Register the global subscriber: a per-target level filter, the
    /// configured output layer and span traces for `eyre` reports.
    pub fn start_tracing(&self) -> Result<()> {
        tracing_subscriber::Registry::default()
            .with(self.targets())
            .with(self.fmt.layer())
            .with(tracing_error::ErrorLayer::default())
            .try_init()?;
        Ok(())
    }
}
