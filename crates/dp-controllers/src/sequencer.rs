//! Request tickets.
//!
//! Every fetch a screen issues takes a ticket. When the response arrives the
//! screen applies it only if no newer ticket was issued in the meantime, so
//! the result of the most recently *issued* request is what ends up on screen
//! regardless of the order responses resolve in.

use std::sync::atomic::{AtomicU64, Ordering};

use dp_core::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_latest(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

/// What happened to a fetch a screen started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refresh {
    /// The response was committed to the screen state
    Applied,
    /// The request failed; the screen now shows its empty/error state
    Failed(AppError),
    /// A newer request was issued before this one resolved; result dropped
    Superseded,
    /// Nothing was requested (no change, or no credential for an optional call)
    Skipped,
}

impl Refresh {
    pub fn is_applied(&self) -> bool {
        matches!(self, Refresh::Applied)
    }

    /// True when the screen state was replaced, either by data or by the
    /// empty state that follows a failure.
    pub fn committed(&self) -> bool {
        matches!(self, Refresh::Applied | Refresh::Failed(_))
    }
}
