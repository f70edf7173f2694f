//! Expiry error types.

use thiserror::Error;

/// Rejections of client-requested lifetimes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpiryError {
    /// Requested duration is not one of the offered options.
    #[error("unsupported expiration duration: {minutes} minutes")]
    UnsupportedDuration {
        /// Requested minutes.
        minutes: u32,
    },

    /// Absolute expiration is not after the current time.
    #[error("expiration time must be in the future")]
    NotInFuture,

    /// Absolute expiration lies beyond the longest offered lifetime.
    #[error("expiration time exceeds the maximum retention of {max_minutes} minutes")]
    TooFar {
        /// Longest accepted lifetime in minutes.
        max_minutes: u32,
    },
}
