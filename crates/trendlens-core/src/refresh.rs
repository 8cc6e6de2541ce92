//! Last-writer-by-generation coordination for overlapping refreshes.
//!
//! A refresh takes a ticket before it starts fetching and commits its
//! snapshot with that ticket when done. Only the holder of the newest
//! ticket may commit, so a slow refresh that was superseded while its fetch
//! was in flight can never replace a newer result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::report::TrendSnapshot;

/// Proof that a refresh was started, carrying its generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

impl RefreshTicket {
    /// Generation number of this refresh.
    pub const fn generation(self) -> u64 {
        self.0
    }
}

/// Holds the latest committed snapshot.
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    issued: AtomicU64,
    latest: Mutex<Option<Arc<TrendSnapshot>>>,
}

impl RefreshCoordinator {
    /// Create an empty coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a refresh. Supersedes every earlier ticket.
    pub fn begin(&self) -> RefreshTicket {
        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(generation, "refresh started");
        RefreshTicket(generation)
    }

    /// Whether no newer refresh has started since `ticket` was issued.
    pub fn is_current(&self, ticket: RefreshTicket) -> bool {
        self.issued.load(Ordering::SeqCst) == ticket.0
    }

    /// Store `snapshot` if `ticket` is still the newest.
    ///
    /// Returns `false` and drops the snapshot when the ticket is stale.
    pub fn commit(&self, ticket: RefreshTicket, snapshot: TrendSnapshot) -> bool {
        let mut latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        if !self.is_current(ticket) {
            tracing::warn!(
                generation = ticket.0,
                newest = self.issued.load(Ordering::SeqCst),
                "discarding superseded refresh"
            );
            return false;
        }
        tracing::info!(generation = ticket.0, "refresh committed");
        *latest = Some(Arc::new(snapshot));
        true
    }

    /// The most recently committed snapshot, if any.
    pub fn latest(&self) -> Option<Arc<TrendSnapshot>> {
        self.latest
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
