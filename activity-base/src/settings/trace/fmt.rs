use serde::Deserialize;
use tracing::Subscriber;
use tracing_subscriber::{fmt, registry::LookupSpan, Layer};

/// Basic log output style
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    /// Pretty print
    Pretty,
    /// JSON
    Json,
    /// Compact
    Compact,
    /// Default style
    #[default]
    #[serde(other)]
    Full,
}

impl Style {
    /// The log layer for this style. Logs go to stderr, stdout is left to
    /// the agents' output.
    pub(super) fn layer<S>(self) -> Box<dyn Layer<S> + Send + Sync + 'static>
    where
        S: Subscriber + for<'a> LookupSpan<'a> + 'static,
    {
        match self {
            Style::Pretty => fmt::layer().with_writer(std::io::stderr).pretty().boxed(),
            Style::Json => fmt::layer().with_writer(std::io::stderr).json().boxed(),
            Style::Compact => fmt::layer().with_writer(std::io::stderr).compact().boxed(),
            Style::Full => fmt::layer().with_writer(std::io::stderr).boxed(),
        }
    }
}
