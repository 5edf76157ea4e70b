//! Error types for parsing in samsmart-types.

use thiserror::Error;

/// Errors that can occur when parsing SamSmart identifiers and values.
///
/// This error type knows nothing about fetching or merging (those belong
/// in samsmart-core).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The string is not one of the known source devices.
    #[error("Unknown source '{0}' (expected koffer1 or koffer2)")]
    UnknownSource(String),

    /// The string is not a valid location tag.
    #[error("Tag {0} is not valid")]
    InvalidTag(String),

    /// The string does not describe a positive fixed-length duration.
    #[error("Invalid duration '{input}': {reason}")]
    InvalidDuration {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The string is not a known sensor role.
    #[error("Unknown sensor role '{0}' (expected nominal or cardinal)")]
    UnknownRole(String),

    /// A timeframe's bounds are reversed.
    #[error("Invalid timeframe: oldest record {oldest} is after newest record {newest}")]
    ReversedTimeframe {
        /// Lower bound as given.
        oldest: time::OffsetDateTime,
        /// Upper bound as given.
        newest: time::OffsetDateTime,
    },
}

/// Result type alias using samsmart-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
