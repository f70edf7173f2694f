//! Expiry policy.
//!
//! Expiration is a computed property: a record carries an absolute
//! `expiration_time` and every read decides liveness against the current
//! time. Nothing here performs I/O.

mod error;
mod policy;

pub use error::ExpiryError;
pub use policy::{
    CLOCK_SKEW_TOLERANCE, ExpiryOption, compute_expiration, format_remaining, is_expired, remaining,
    validate_expiration,
};
