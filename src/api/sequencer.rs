use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::errors::{PlannerError, PlannerResult};
use crate::invalidation::ViewKey;

/// Identifies one load of one view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    key: ViewKey,
    seq: u64,
}

impl Ticket {
    pub fn key(&self) -> &ViewKey {
        &self.key
    }
}

/// Hands out monotonic tickets per view so a late response to a superseded
/// load can be recognised and dropped.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: HashMap<ViewKey, u64>,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, key: ViewKey) -> Ticket {
        let seq = self.latest.entry(key.clone()).or_insert(0);
        *seq += 1;
        Ticket { key, seq: *seq }
    }

    /// True while no newer load of the same view has started.
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.latest.get(&ticket.key) == Some(&ticket.seq)
    }
}

/// Per-view load state. A failure is terminal until the next load.
#[derive(Debug)]
pub enum ViewState<T> {
    Idle,
    Loading {
        since: Instant,
    },
    Ready(T),
    Failed(PlannerError),
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        ViewState::Idle
    }
}

impl<T> ViewState<T> {
    pub fn begin(
        &mut self,
        sequencer: &mut RequestSequencer,
        key: ViewKey,
        now: Instant,
    ) -> Ticket {
        *self = ViewState::Loading { since: now };
        sequencer.begin(key)
    }

    /// Applies a response unless a newer load superseded it. Returns whether
    /// the state changed.
    pub fn complete(
        &mut self,
        sequencer: &RequestSequencer,
        ticket: &Ticket,
        result: PlannerResult<T>,
    ) -> bool {
        if !sequencer.is_current(ticket) {
            warn!(
                view = ?ticket.key.view,
                account = ticket.key.account.as_deref(),
                "discarding stale response"
            );
            return false;
        }
        *self = match result {
            Ok(value) => ViewState::Ready(value),
            Err(err) => ViewState::Failed(err),
        };
        true
    }

    /// The loading indicator only shows once a load outlasts `debounce`.
    pub fn shows_loading(&self, now: Instant, debounce: Duration) -> bool {
        match self {
            ViewState::Loading { since } => now.saturating_duration_since(*since) >= debounce,
            _ => false,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            ViewState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&PlannerError> {
        match self {
            ViewState::Failed(err) => Some(err),
            _ => None,
        }
    }
}
