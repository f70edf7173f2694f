//! One reclamation pass over expired records.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::{StreamExt, stream};
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use vanish_shared::ReaperSettings;

use crate::file::{FileRecord, FileStore};
use crate::storage::ObjectGateway;

/// Reaper tuning.
#[derive(Debug, Clone)]
pub struct ReaperConfig {
    /// Time between scheduled cycles.
    pub interval: Duration,
    /// Records reclaimed concurrently within one cycle.
    pub max_concurrent_deletes: usize,
}

impl ReaperConfig {
    /// Default cycle interval: 60 seconds.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);
    /// Default deletion concurrency.
    pub const DEFAULT_MAX_CONCURRENT_DELETES: usize = 16;

    /// Set the cycle interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            max_concurrent_deletes: Self::DEFAULT_MAX_CONCURRENT_DELETES,
        }
    }
}

impl From<&ReaperSettings> for ReaperConfig {
    fn from(settings: &ReaperSettings) -> Self {
        Self {
            interval: Duration::from_secs(settings.interval_secs.max(1)),
            max_concurrent_deletes: settings.max_concurrent_deletes.max(1),
        }
    }
}

/// Step at which reclaiming a record failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReapStage {
    /// Deleting the blob. The record was left in place.
    BlobDelete,
    /// Deleting the record after its blob was removed.
    MetadataDelete,
}

impl ReapStage {
    /// Stable name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BlobDelete => "blob_delete",
            Self::MetadataDelete => "metadata_delete",
        }
    }
}

impl fmt::Display for ReapStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record the cycle could not reclaim.
#[derive(Debug, Clone)]
pub struct ReapFailure {
    /// Record id.
    pub file_id: Uuid,
    /// Record object path.
    pub object_path: String,
    /// Failed step.
    pub stage: ReapStage,
    /// Error text.
    pub error: String,
}

/// Outcome of one cycle.
#[derive(Debug, Clone)]
pub struct ReapReport {
    /// Reference time every expiry comparison in the cycle used.
    pub cycle_started_at: DateTime<Utc>,
    /// Expired records found.
    pub attempted: usize,
    /// Records fully removed.
    pub reclaimed: usize,
    /// Records left behind, ordered by id.
    pub failures: Vec<ReapFailure>,
}

impl ReapReport {
    fn empty(cycle_started_at: DateTime<Utc>) -> Self {
        Self {
            cycle_started_at,
            attempted: 0,
            reclaimed: 0,
            failures: Vec::new(),
        }
    }

    /// Number of records that could not be reclaimed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Deletes expired blobs and then their records.
pub struct Reaper {
    store: Arc<dyn FileStore>,
    gateway: Arc<dyn ObjectGateway>,
    max_concurrent_deletes: usize,
}

impl Reaper {
    /// Create a reaper over the given stores.
    #[must_use]
    pub fn new(
        store: Arc<dyn FileStore>,
        gateway: Arc<dyn ObjectGateway>,
        config: &ReaperConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            max_concurrent_deletes: config.max_concurrent_deletes.max(1),
        }
    }

    /// Run one cycle with `now` as the reference time.
    ///
    /// Never fails: every problem is logged and reported.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> ReapReport {
        let expired = match self.store.list_expired(now).await {
            Ok(expired) => expired,
            Err(e) => {
                error!(error = %e, "failed to list expired files");
                return ReapReport::empty(now);
            }
        };

        if expired.is_empty() {
            debug!("no expired files");
            return ReapReport::empty(now);
        }

        let attempted = expired.len();
        let mut failures: Vec<ReapFailure> = stream::iter(expired)
            .map(|record| self.reclaim(record))
            .buffer_unordered(self.max_concurrent_deletes)
            .filter_map(|outcome| async move { outcome.err() })
            .collect()
            .await;
        failures.sort_by_key(|f| f.file_id);

        let report = ReapReport {
            cycle_started_at: now,
            attempted,
            reclaimed: attempted - failures.len(),
            failures,
        };
        info!(
            attempted = report.attempted,
            reclaimed = report.reclaimed,
            failed = report.failed(),
            "reaper cycle complete"
        );
        report
    }

    async fn reclaim(&self, record: FileRecord) -> Result<(), ReapFailure> {
        let fail = |stage: ReapStage, error: String| {
            warn!(
                file_id = %record.id,
                object_path = %record.object_path,
                stage = %stage,
                error = %error,
                "failed to reclaim expired file"
            );
            ReapFailure {
                file_id: record.id,
                object_path: record.object_path.clone(),
                stage,
                error,
            }
        };

        if let Err(e) = self.gateway.delete_object(&record.object_path).await {
            return Err(fail(ReapStage::BlobDelete, e.to_string()));
        }

        match self.store.delete(record.id).await {
            Ok(removed) => {
                debug!(file_id = %record.id, removed, "expired file reclaimed");
                Ok(())
            }
            Err(e) => Err(fail(ReapStage::MetadataDelete, e.to_string())),
        }
    }
}
