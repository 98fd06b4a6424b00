use std::any::Any;
use std::error::Error as StdError;
use std::fmt::{Debug, Display, Formatter};

/// The result of talking to a remote history source.
pub type SourceResult<T> = Result<T, SourceError>;

/// A call was cancelled through its cancellation token.
///
/// This is an expected outcome rather than a failure: it is propagated
/// immediately, never logged as an error and never triggers a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// An "Any"-typed error.
pub trait SourceCustomError: StdError + Send + Sync + Any {}

impl<E: StdError + Send + Sync + Any> SourceCustomError for E {}

/// Thin wrapper around a boxed SourceCustomError.
#[repr(transparent)]
pub struct SourceCustomErrorWrapper(Box<dyn SourceCustomError>);

impl Debug for SourceCustomErrorWrapper {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl Display for SourceCustomErrorWrapper {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for SourceCustomErrorWrapper {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

/// Errors returned by a remote activity source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The call was cancelled
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
    /// The backend answered with something we could not use as a whole page
    #[error("Malformed response from {endpoint}: {reason}")]
    MalformedResponse {
        /// Endpoint path that produced the response
        endpoint: String,
        /// What was wrong with it
        reason: String,
    },
    /// Any other error; does not implement `From` to prevent
    /// conflicting/absorbing other errors.
    #[error(transparent)]
    Other(SourceCustomErrorWrapper),
}

impl SourceError {
    /// Create a source error from any other existing error
    pub fn from_other<E: SourceCustomError>(err: E) -> Self {
        Self::Other(SourceCustomErrorWrapper(Box::new(err)))
    }

    /// Creates a source error of the other variant from a static string
    pub fn from_other_str(err: &'static str) -> Self {
        #[derive(Debug)]
        #[repr(transparent)]
        struct StringError(&'static str);
        impl Display for StringError {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.0)
            }
        }
        impl StdError for StringError {}

        Self::from_other(StringError(err))
    }

    /// Create a malformed response error
    pub fn malformed(endpoint: impl Into<String>, reason: impl Display) -> Self {
        Self::MalformedResponse {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error only reports a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SourceError::Cancelled(_))
    }
}
