//! Reclamation of expired files.
//!
//! A cycle deletes each expired blob before its record, so a record only
//! disappears once nothing can be served for it. A failed blob delete leaves
//! the record in place to be retried on the next cycle. Deletes on both sides
//! are idempotent, so overlapping cycles degrade to no-ops.

mod cycle;
mod scheduler;

pub use cycle::{ReapFailure, ReapReport, ReapStage, Reaper, ReaperConfig};
pub use scheduler::{ReaperHandle, ReaperScheduler};
