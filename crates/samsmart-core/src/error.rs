//! Error types for samsmart-core.
//!
//! # Error Kinds
//!
//! | Error | Meaning | Handling |
//! |-------|---------|----------|
//! | [`Error::InvalidArgument`] | Unknown sensor id, bad tag, malformed raw table | Caller error, never retried |
//! | [`Error::Integrity`] | Internal invariant broken after de-duplication | Logic defect, treat as fatal |
//! | [`Error::Upstream`] | The measurement API could not deliver a series | Absorbed per sensor by the orchestration layer |
//! | [`Error::OverlapViolation`] | One box deployed at two places at once | Fix the configuration |
//! | [`Error::Config`] | Configuration file unreadable or invalid | Fix the configuration |
//!
//! Only [`Error::Upstream`] (and an [`Error::InvalidArgument`] raised while
//! building a fetch request) is ever swallowed, and only by
//! [`timeframe_records`](crate::collect::timeframe_records), which logs it
//! and omits the affected sensor. Everything else propagates unchanged.

use thiserror::Error;

use samsmart_types::{ParseError, Timeframe};

use crate::config::ConfigError;

/// Errors produced by the reconciliation engine and its collaborators.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Malformed input at a boundary.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An invariant the engine itself guarantees did not hold.
    #[error("Integrity violation: {0}")]
    Integrity(String),

    /// The remote measurement API could not deliver data.
    #[error("Upstream unavailable: {0}")]
    Upstream(#[from] UpstreamError),

    /// Two timeframes of the same source overlap.
    #[error("Sanity check failed: Timeframes {first} and {second} overlap")]
    OverlapViolation {
        /// The timeframe ending first.
        first: Box<Timeframe>,
        /// The timeframe starting before `first` ends.
        second: Box<Timeframe>,
    },

    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// CSV encoding or decoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this is a caller error at a boundary.
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument(_))
    }

    /// Whether the remote API failed to deliver data.
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        matches!(self, Error::Upstream(_))
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::InvalidArgument(err.to_string())
    }
}

/// Failures of the remote measurement API.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UpstreamError {
    /// The API has no data for the request.
    #[error("No data at {url}")]
    NotFound {
        /// The requested URL.
        url: String,
    },

    /// The API answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Http {
        /// The requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The request never got an answer.
    #[error("Request to {url} failed: {message}")]
    Transport {
        /// The requested URL.
        url: String,
        /// Transport-level failure description.
        message: String,
    },

    /// The answer could not be understood.
    #[error("Unusable response from {url}: {message}")]
    Decode {
        /// The requested URL.
        url: String,
        /// What was wrong with the response.
        message: String,
    },
}

/// Result type alias using samsmart-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
