use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use super::connection_event::{ConnectionEvent, MonitorReport};
use crate::{
    engine::media_engine::MediaEngine,
    ice::{candidate_pair::SelectedCandidatePair, ice_connection_state::IceConnectionState},
    log::log_sink::LogSink,
    negotiation::{negotiation_event::NegotiationEvent, signaling_state::SignalingState},
    sink_debug, sink_info, sink_warn,
};

/// Watches a negotiator's event stream for connectivity changes.
///
/// Purely an observer: it reads events and statistics and never calls back
/// into the negotiation.
pub struct ConnectionMonitor {
    logger: Arc<dyn LogSink>,
    stall_timeout: Duration,
    last_state: IceConnectionState,
    since: Instant,
    established: bool,
    stall_reported: bool,
    closed: bool,
}

impl ConnectionMonitor {
    pub fn new(stall_timeout: Duration, logger: Arc<dyn LogSink>) -> Self {
        Self {
            logger,
            stall_timeout,
            last_state: IceConnectionState::New,
            since: Instant::now(),
            established: false,
            stall_reported: false,
            closed: false,
        }
    }

    /// Maps a state change to a milestone. Repeats, `New`, and a move
    /// between `Connected` and `Completed` produce nothing; after `Closed`
    /// everything is ignored.
    pub fn classify(&mut self, state: IceConnectionState, now: Instant) -> Option<ConnectionEvent> {
        if self.closed || state == self.last_state {
            return None;
        }
        self.last_state = state;
        self.since = now;
        self.stall_reported = false;

        let event = match state {
            IceConnectionState::New => None,
            IceConnectionState::Checking => Some(ConnectionEvent::Connecting),
            IceConnectionState::Connected | IceConnectionState::Completed => {
                (!self.established).then_some(ConnectionEvent::Established)
            }
            IceConnectionState::Disconnected => Some(ConnectionEvent::Degraded),
            IceConnectionState::Failed => Some(ConnectionEvent::Lost),
            IceConnectionState::Closed => {
                self.closed = true;
                Some(ConnectionEvent::Closed)
            }
        };
        self.established = state.is_connected();
        event
    }

    /// True while the agent has sat in `New`, `Checking` or `Disconnected`
    /// for longer than the stall timeout.
    #[must_use]
    pub fn is_stalled(&self, now: Instant) -> bool {
        self.stall_deadline()
            .is_some_and(|deadline| now.saturating_duration_since(deadline) > Duration::ZERO)
    }

    #[must_use]
    pub fn last_state(&self) -> IceConnectionState {
        self.last_state
    }

    /// Builds the report for `event`, fetching statistics on `Established`.
    pub async fn report(&self, event: ConnectionEvent, engine: &dyn MediaEngine) -> MonitorReport {
        let mut report = MonitorReport::new(event);
        if event == ConnectionEvent::Established {
            report.selected_pair = self.selected_pair(engine).await;
        }
        report
    }

    /// Consumes negotiation events until the stream ends, publishing a
    /// report per milestone. Returns early if `out` has no receiver left.
    pub async fn run(
        mut self,
        mut events: UnboundedReceiver<NegotiationEvent>,
        engine: Arc<dyn MediaEngine>,
        out: UnboundedSender<MonitorReport>,
    ) {
        loop {
            let next = match self.unreported_deadline() {
                Some(deadline) => {
                    tokio::select! {
                        ev = events.recv() => ev,
                        () = tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)) => {
                            self.stall_reported = true;
                            sink_warn!(
                                self.logger,
                                "[Monitor] ICE stuck in {} for more than {:?}",
                                self.last_state,
                                self.stall_timeout
                            );
                            continue;
                        }
                    }
                }
                None => events.recv().await,
            };
            let Some(event) = next else {
                break;
            };

            let state = match event {
                NegotiationEvent::IceConnectionStateChanged(state) => state,
                // The agent stops reporting once the negotiator is closed.
                NegotiationEvent::SignalingStateChanged(SignalingState::Closed) => {
                    IceConnectionState::Closed
                }
                _ => continue,
            };
            let Some(milestone) = self.classify(state, Instant::now()) else {
                continue;
            };
            sink_info!(self.logger, "[Monitor] Connection {} (ICE {})", milestone, state);

            let report = self.report(milestone, engine.as_ref()).await;
            if out.send(report).is_err() {
                break;
            }
        }
        sink_debug!(self.logger, "[Monitor] Event stream ended");
    }

    async fn selected_pair(&self, engine: &dyn MediaEngine) -> Option<SelectedCandidatePair> {
        match engine.get_statistics_snapshot().await {
            Ok(snapshot) => {
                let pair = snapshot.succeeded_pair();
                match &pair {
                    Some(p) => sink_info!(
                        self.logger,
                        "[Monitor] Selected pair {}: {} -> {}",
                        p.pair_id,
                        p.local_candidate_id,
                        p.remote_candidate_id
                    ),
                    None => sink_warn!(self.logger, "[Monitor] No succeeded candidate pair in stats"),
                }
                pair
            }
            Err(e) => {
                sink_warn!(self.logger, "[Monitor] Could not read stats: {}", e);
                None
            }
        }
    }

    fn stall_deadline(&self) -> Option<Instant> {
        let stall_prone = matches!(
            self.last_state,
            IceConnectionState::New | IceConnectionState::Checking | IceConnectionState::Disconnected
        );
        (stall_prone && !self.closed).then(|| self.since + self.stall_timeout)
    }

    fn unreported_deadline(&self) -> Option<Instant> {
        if self.stall_reported {
            return None;
        }
        self.stall_deadline()
    }
}
