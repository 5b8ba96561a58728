use std::fmt;

use crate::ice::candidate_pair::SelectedCandidatePair;

/// Connection milestones derived from ICE connection-state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionEvent {
    Connecting,
    Established,
    Degraded,
    Lost,
    Closed,
}

impl fmt::Display for ConnectionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionEvent::Connecting => "connecting",
            ConnectionEvent::Established => "established",
            ConnectionEvent::Degraded => "degraded",
            ConnectionEvent::Lost => "lost",
            ConnectionEvent::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// What the monitor publishes. `selected_pair` is only filled for
/// `Established`, and only when the engine's statistics named one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorReport {
    pub event: ConnectionEvent,
    pub selected_pair: Option<SelectedCandidatePair>,
}

impl MonitorReport {
    #[must_use]
    pub fn new(event: ConnectionEvent) -> Self {
        Self {
            event,
            selected_pair: None,
        }
    }
}
