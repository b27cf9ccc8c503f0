//! Append-only audit trail of synthesized values.
//!
//! Every value the pipeline invents (a substituted baseline, a gap filled in an
//! index series) is recorded as one [`InterpolationLogEntry`]. The collector is an
//! explicit object owned by the caller and passed by reference into each
//! aggregation call; the caller decides when to [`drain`](InterpolationLog::drain)
//! it into a sink.
//!
//! Appends take `&self` and lock per entry, so products computed on a worker pool
//! can share one log.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ProductId;

/// How a value was synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairMethod {
    /// Baseline price substituted.
    AdjustedPrice,
    /// Forward-filled from an earlier value. Accepted when reading older logs; not emitted.
    Ffill,
    /// Backward-filled from a later value. Accepted when reading older logs; not emitted.
    Bfill,
    /// Filled by the series gap-repair pass.
    Interpolation,
    /// Baseline volume substituted.
    AdjustedVolume,
}

/// Which field a synthesized value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogColumn {
    /// Baseline price.
    AvgPrice,
    /// Baseline trade count.
    TotalVolume,
    /// Per-bucket index value.
    ResellIndex,
}

/// One synthesized value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpolationLogEntry {
    /// Product the value belongs to.
    pub product_id: ProductId,
    /// Bucket start (series repairs) or baseline date (baseline substitutions).
    pub date_created: DateTime<Utc>,
    /// Field that was synthesized.
    pub column: LogColumn,
    /// How it was synthesized.
    pub method: RepairMethod,
    /// Value before repair; `None` when it was missing or non-finite.
    pub original_value: Option<f64>,
    /// Value after repair.
    pub new_value: f64,
}

/// Thread-safe, append-only collector of [`InterpolationLogEntry`] values.
#[derive(Debug, Default)]
pub struct InterpolationLog {
    entries: Mutex<Vec<InterpolationLogEntry>>,
}

impl InterpolationLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave a half-written entry behind,
    // so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, Vec<InterpolationLogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one entry.
    pub fn record(&self, entry: InterpolationLogEntry) {
        self.lock().push(entry);
    }

    /// Append a batch of entries contiguously.
    pub fn extend(&self, entries: impl IntoIterator<Item = InterpolationLogEntry>) {
        self.lock().extend(entries);
    }

    /// Number of entries recorded and not yet drained.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when no entries are pending.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the pending entries.
    pub fn snapshot(&self) -> Vec<InterpolationLogEntry> {
        self.lock().clone()
    }

    /// Take every pending entry, leaving the log empty (flush).
    pub fn drain(&self) -> Vec<InterpolationLogEntry> {
        std::mem::take(&mut *self.lock())
    }
}
