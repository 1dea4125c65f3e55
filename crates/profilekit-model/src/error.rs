//! Error types for profile model operations.

use thiserror::Error;

/// Errors raised by profile construction, mutation, and merge.
///
/// All failures are synchronous and fail-fast: a rejected mutation leaves
/// the aggregate unchanged.
#[derive(Error, Debug)]
pub enum ProfileError {
    /// Malformed or missing method/constructor input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An attribute failed its validity predicate at insertion.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    /// A session failed its validity predicate at insertion.
    #[error("invalid session: {0}")]
    InvalidSession(String),

    /// An event failed its validity predicate at insertion.
    #[error("invalid event: {0}")]
    InvalidEvent(String),

    /// Merge called with a foreign profile whose id differs from the local one.
    #[error("profile ID mismatch: expected {expected}, got {got}")]
    IdMismatch { expected: String, got: String },
}
