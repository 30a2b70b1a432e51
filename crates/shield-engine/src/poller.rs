//! Resilience feed polling state
//!
//! The poll loop itself lives in the coordinator; this module holds the
//! pure parts: change detection on the snapshot's opaque timestamp, the
//! last-accepted snapshot, and the bounded newest-first shield log.

use shield_core::ResilienceSnapshot;
use std::collections::VecDeque;

/// Accept a snapshot only when its identity stamp moved.
///
/// Identity is the opaque `timestamp` field alone; an unchanged stamp means
/// the feed has not advanced and must produce zero downstream updates.
pub fn should_accept(last: Option<&str>, next: &str) -> bool {
    last != Some(next)
}

/// Bounded newest-first log trail
#[derive(Debug, Clone)]
pub struct RollingLog {
    entries: VecDeque<String>,
    capacity: usize,
}

impl RollingLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Prepend one line, dropping the oldest past capacity
    pub fn push(&mut self, line: impl Into<String>) {
        self.entries.push_front(line.into());
        self.entries.truncate(self.capacity);
    }

    /// Prepend a block of lines keeping their given order at the head
    pub fn push_block(&mut self, lines: &[&str]) {
        for line in lines.iter().rev() {
            self.push(*line);
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Poller bookkeeping between fetches
#[derive(Debug, Default)]
pub struct PollerState {
    last_timestamp: Option<String>,
    latest: Option<ResilienceSnapshot>,
    accepted_count: u64,
}

impl PollerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn should_accept(&self, snapshot: &ResilienceSnapshot) -> bool {
        should_accept(self.last_timestamp.as_deref(), &snapshot.timestamp)
    }

    pub fn accept(&mut self, snapshot: ResilienceSnapshot) {
        self.last_timestamp = Some(snapshot.timestamp.clone());
        self.latest = Some(snapshot);
        self.accepted_count += 1;
    }

    pub fn latest(&self) -> Option<&ResilienceSnapshot> {
        self.latest.as_ref()
    }

    pub fn accepted_count(&self) -> u64 {
        self.accepted_count
    }

    pub fn reset(&mut self) {
        self.last_timestamp = None;
        self.latest = None;
        self.accepted_count = 0;
    }
}

// ============================================================================
// TESTS
// ============================================================================
