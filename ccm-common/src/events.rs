//! Event types for CCM event system
//!
//! Provides the ingest event definitions and the EventBus used to observe
//! long-running archive scans.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Ingest event types
///
/// Events are broadcast via EventBus and serialize with a `type` tag so a
/// front end can consume them as JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum IngestEvent {
    /// Archive scan began
    ScanStarted {
        /// Scan session identifier
        session_id: Uuid,
        /// Archive path as given by the caller
        archive: String,
        /// When the scan started
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Periodic scan progress
    ///
    /// Emitted every `progress_interval` enumerated entries.
    ScanProgress {
        session_id: Uuid,
        /// Entries enumerated so far, including skipped ones
        entries_seen: usize,
        /// Content items accepted so far
        items_found: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Archive scan finished successfully
    ///
    /// Mutually exclusive with `ScanFailed` for one session.
    ScanCompleted {
        session_id: Uuid,
        items_found: usize,
        /// Distinct creator names, including the "Unknown" sentinel
        creators_found: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Archive scan failed; no items were produced
    ScanFailed {
        session_id: Uuid,
        /// Human-readable failure
        error: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Creator reconciliation finished
    ReconcileCompleted {
        session_id: Uuid,
        /// Exact (case-insensitive) registry matches
        exact: usize,
        /// Fuzzy candidates awaiting confirmation
        fuzzy: usize,
        /// Names with no viable registry candidate
        new: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl IngestEvent {
    /// Session the event belongs to
    pub fn session_id(&self) -> Uuid {
        match self {
            IngestEvent::ScanStarted { session_id, .. }
            | IngestEvent::ScanProgress { session_id, .. }
            | IngestEvent::ScanCompleted { session_id, .. }
            | IngestEvent::ScanFailed { session_id, .. }
            | IngestEvent::ReconcileCompleted { session_id, .. } => *session_id,
        }
    }

    /// True for events that end a scan (completed or failed)
    pub fn is_scan_terminal(&self) -> bool {
        matches!(
            self,
            IngestEvent::ScanCompleted { .. } | IngestEvent::ScanFailed { .. }
        )
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// Publishing is synchronous, so the bus can be used from blocking threads
/// as well as async tasks.
///
/// # Examples
///
/// ```
/// use ccm_common::events::{EventBus, IngestEvent};
/// use uuid::Uuid;
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(IngestEvent::ScanFailed {
///     session_id: Uuid::new_v4(),
///     error: "not a zip".to_string(),
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(matches!(rx.try_recv(), Ok(IngestEvent::ScanFailed { .. })));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<IngestEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to receive all future events
    pub fn subscribe(&self) -> broadcast::Receiver<IngestEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error when nobody is listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: IngestEvent,
    ) -> Result<usize, broadcast::error::SendError<IngestEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: IngestEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
