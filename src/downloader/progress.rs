//! Outcome classification and aggregate result accounting.
//!
//! Workers report exactly one [`Outcome`] per descriptor to the
//! [`ResultAggregator`], which tallies counters under a single lock and
//! emits one [`ProgressEvent`] per completion. Rendering is the caller's
//! concern; the engine only produces structured events.

use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Terminal classification of a single resource fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Payload downloaded, checksum verified, file in place
    Success,
    /// Upstream has no data for this slice (XML error payload or
    /// absent/placeholder checksum)
    NotFound,
    /// Computed digest did not match the published checksum
    ChecksumMismatch,
    /// Network-level failure on either request
    TransportError(String),
    /// Local persistence failure (temp write, rename)
    IoError(String),
}

impl Outcome {
    /// Short reason shown next to the filename, `None` for success.
    pub fn reason(&self) -> Option<String> {
        match self {
            Outcome::Success => None,
            Outcome::NotFound => Some("no data".to_string()),
            Outcome::ChecksumMismatch => Some("checksum does not match".to_string()),
            Outcome::TransportError(detail) => Some(format!("network error: {detail}")),
            Outcome::IoError(detail) => Some(format!("error saving on disk: {detail}")),
        }
    }
}

/// Progress event emitted once per completed descriptor.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Completions so far, including this one
    pub completed: usize,
    /// Total planned descriptors
    pub total: usize,
    /// Local filename of the resource
    pub file_name: String,
    /// How the fetch ended
    pub outcome: Outcome,
}

/// Per-class completion counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressCounters {
    /// Verified downloads
    pub success: usize,
    /// Slices with no upstream data
    pub no_data: usize,
    /// Checksum, transport, and IO failures
    pub failed: usize,
}

impl ProgressCounters {
    /// Total completions.
    pub fn completed(&self) -> usize {
        self.success + self.no_data + self.failed
    }
}

/// Final run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadSummary {
    /// Planned descriptors
    pub total: usize,
    /// Verified downloads
    pub success: usize,
    /// Slices with no upstream data
    pub no_data: usize,
    /// Checksum, transport, and IO failures
    pub failed: usize,
}

impl DownloadSummary {
    /// The run counts as failed only when nothing at all succeeded.
    pub fn is_failure(&self) -> bool {
        self.success == 0 && self.total > 0
    }
}

/// Tallies worker outcomes and emits progress events.
///
/// Counters are owned exclusively here and mutated only through [`record`],
/// so a reader can never observe a class counter incremented without
/// `completed` reflecting it. Events are sent while the lock is held, which
/// keeps their `completed` counts strictly increasing.
///
/// [`record`]: ResultAggregator::record
#[derive(Debug)]
pub struct ResultAggregator {
    total: usize,
    counters: Mutex<ProgressCounters>,
    events: UnboundedSender<ProgressEvent>,
}

impl ResultAggregator {
    /// Create an aggregator for `total` planned descriptors.
    pub fn new(total: usize, events: UnboundedSender<ProgressEvent>) -> Self {
        Self {
            total,
            counters: Mutex::new(ProgressCounters::default()),
            events,
        }
    }

    /// Record one outcome and emit the matching progress event.
    pub fn record(&self, file_name: &str, outcome: Outcome) {
        let mut counters = self.counters.lock().expect("counter lock poisoned");
        match outcome {
            Outcome::Success => counters.success += 1,
            Outcome::NotFound => counters.no_data += 1,
            Outcome::ChecksumMismatch | Outcome::TransportError(_) | Outcome::IoError(_) => {
                counters.failed += 1
            }
        }

        let event = ProgressEvent {
            completed: counters.completed(),
            total: self.total,
            file_name: file_name.to_string(),
            outcome,
        };
        // The receiver may already be gone when the renderer shut down early.
        if self.events.send(event).is_err() {
            debug!("progress receiver dropped, event discarded");
        }
    }

    /// Snapshot of the counters.
    pub fn counters(&self) -> ProgressCounters {
        *self.counters.lock().expect("counter lock poisoned")
    }

    /// Final summary. Meaningful once all outcomes are recorded.
    pub fn summary(&self) -> DownloadSummary {
        let counters = self.counters();
        DownloadSummary {
            total: self.total,
            success: counters.success,
            no_data: counters.no_data,
            failed: counters.failed,
        }
    }
}
