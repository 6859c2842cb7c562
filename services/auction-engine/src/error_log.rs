//! Error sink
//!
//! Every caught failure in the engine is appended to an error-log
//! collection in the document store as `{kind, auction_id?, error,
//! timestamp_ms}`. The sink itself is best-effort: if the append
//! fails, the record is only traced.

use serde::{Deserialize, Serialize};
use types::ids::AuctionId;

/// Where in the engine a failure was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Snapshot assembly on join failed; join still succeeded.
    Snapshot,
    /// Broadcast assembly read failed; a degraded event was sent.
    Broadcast,
    /// Cascade evaluation failed; the triggering bid's broadcast was
    /// already delivered.
    Cascade,
    /// Per-auction settlement failed after the status commit.
    Finalize,
    /// The overdue-auction query itself failed; nothing was processed.
    Sweep,
    /// A notifier call failed.
    Notify,
}

/// One captured failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub auction_id: Option<AuctionId>,
    pub error: String,
    pub timestamp_ms: i64,
}

impl ErrorRecord {
    pub fn new(
        kind: ErrorKind,
        auction_id: Option<AuctionId>,
        error: impl Into<String>,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            kind,
            auction_id,
            error: error.into(),
            timestamp_ms,
        }
    }
}
