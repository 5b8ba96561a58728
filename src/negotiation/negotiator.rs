use std::{
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::sync::{
    Mutex as AsyncMutex,
    mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
    watch,
};

use super::{
    negotiation_context::NegotiationContext,
    negotiation_error::NegotiationError,
    negotiation_event::{CandidateAdmission, CandidateErrorReport, NegotiationEvent},
    operation::Operation,
    signaling_state::SignalingState,
};
use crate::{
    engine::{engine_error::EngineError, media_engine::MediaEngine, track::{LocalTrack, RemoteTrack}},
    ice::{candidate::Candidate, candidate_message::CandidateMessage, ice_connection_state::IceConnectionState},
    log::log_sink::LogSink,
    sdp::{sdp_kind::SdpKind, session_description::SessionDescription},
    sink_debug, sink_error, sink_info, sink_warn,
};

struct Inner {
    ctx: NegotiationContext,
    ice_state: IceConnectionState,
    subscribers: Vec<UnboundedSender<NegotiationEvent>>,
}

impl Inner {
    fn emit(&mut self, event: NegotiationEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn local_mid(&self) -> Option<String> {
        self.ctx
            .local_description()
            .and_then(SessionDescription::first_mid)
            .map(str::to_owned)
    }
}

/// Offer/answer state machine for one peer connection.
///
/// Operations are async and run one at a time; a second call waits for the
/// first. The `on_*` methods are the engine's notifications and never
/// change the signaling state. [`close`](Self::close) can be called from
/// anywhere: it cancels whatever engine call is in flight and nothing that
/// call returns is applied afterwards.
pub struct Negotiator {
    engine: Arc<dyn MediaEngine>,
    logger: Arc<dyn LogSink>,
    inner: Mutex<Inner>,
    op_gate: AsyncMutex<()>,
    closed_tx: watch::Sender<bool>,
}

impl Negotiator {
    pub fn new(engine: Arc<dyn MediaEngine>, logger: Arc<dyn LogSink>) -> Self {
        let (closed_tx, _) = watch::channel(false);
        Self {
            engine,
            logger,
            inner: Mutex::new(Inner {
                ctx: NegotiationContext::new(),
                ice_state: IceConnectionState::New,
                subscribers: Vec::new(),
            }),
            op_gate: AsyncMutex::new(()),
            closed_tx,
        }
    }

    /// Creates an offer, applies it locally and commits it.
    ///
    /// # Errors
    /// `InvalidStateTransition` outside `Stable`, `Cancelled` if closed
    /// meanwhile, `UnderlyingEngineFailure` if the engine refuses.
    pub async fn create_offer(&self) -> Result<SessionDescription, NegotiationError> {
        let operation = Operation::CreateOffer;
        let _gate = self.op_gate.lock().await;
        let result: Result<SessionDescription, NegotiationError> = async {
            self.lock().ctx.check(operation)?;
            let payload = self
                .guarded(operation, self.engine.create_offer_description())
                .await?;
            let offer = SessionDescription::new(SdpKind::Offer, payload)?;
            self.apply_local(operation, offer).await
        }
        .await;
        self.log_failure(operation, result)
    }

    /// Answers the committed remote offer, applies the answer locally and
    /// returns to `Stable`.
    pub async fn create_answer(&self) -> Result<SessionDescription, NegotiationError> {
        let operation = Operation::CreateAnswer;
        let _gate = self.op_gate.lock().await;
        let result: Result<SessionDescription, NegotiationError> = async {
            let remote_offer = self.committed_remote_offer()?;
            let payload = self
                .guarded(
                    operation,
                    self.engine.create_answer_description(&remote_offer),
                )
                .await?;
            let answer = SessionDescription::new(SdpKind::Answer, payload)?;
            self.apply_local(operation, answer).await
        }
        .await;
        self.log_failure(operation, result)
    }

    /// Applies the peer's offer; `Stable` to `HaveRemoteOffer`.
    pub async fn set_remote_offer(&self, desc: SessionDescription) -> Result<(), NegotiationError> {
        self.set_remote(Operation::SetRemoteOffer, desc).await
    }

    /// Applies the peer's answer; `HaveLocalOffer` to `Stable`.
    pub async fn set_remote_answer(&self, desc: SessionDescription) -> Result<(), NegotiationError> {
        self.set_remote(Operation::SetRemoteAnswer, desc).await
    }

    pub async fn add_local_track(&self, track: LocalTrack) -> Result<(), NegotiationError> {
        let operation = Operation::AddLocalTrack;
        let _gate = self.op_gate.lock().await;
        let result: Result<(), NegotiationError> = async {
            self.lock().ctx.check(operation)?;
            self.guarded(operation, self.engine.add_local_track(&track))
                .await?;
            self.ensure_open(operation)?;
            sink_info!(self.logger, "[Negotiation] Added local {} track {}", track.kind, track.id);
            Ok(())
        }
        .await;
        self.log_failure(operation, result)
    }

    /// Applies a trickled candidate from the peer.
    ///
    /// Stale and duplicate candidates are reported and not forwarded; the
    /// candidate is recorded only once the engine took it.
    pub async fn add_remote_candidate(
        &self,
        message: CandidateMessage,
    ) -> Result<CandidateAdmission, NegotiationError> {
        let operation = Operation::AddRemoteCandidate;
        let _gate = self.op_gate.lock().await;
        let result: Result<CandidateAdmission, NegotiationError> = async {
            self.lock().ctx.check(operation)?;
            let candidate = message.parse_candidate()?;
            let admission = self
                .lock()
                .ctx
                .classify_remote_candidate(candidate.as_ref())?;
            if !matches!(
                admission,
                CandidateAdmission::Accepted { .. } | CandidateAdmission::EndOfCandidates { .. }
            ) {
                sink_debug!(self.logger, "[Negotiation] Remote candidate ignored: {:?}", admission);
                return Ok(admission);
            }

            self.guarded(operation, self.engine.add_remote_candidate(candidate.as_ref()))
                .await?;

            let mut inner = self.lock();
            if inner.ctx.is_closed() {
                return Err(NegotiationError::Cancelled { operation });
            }
            inner.ctx.record_remote_candidate(candidate)
        }
        .await;
        self.log_failure(operation, result)
    }

    /// Candidate (or `None` for end-of-candidates) reported by the local
    /// ICE agent.
    ///
    /// Candidates for a description still being applied are held and
    /// published right after its `LocalDescription` event.
    pub fn on_local_candidate(
        &self,
        candidate: Option<Candidate>,
    ) -> Result<CandidateAdmission, NegotiationError> {
        let mut inner = self.lock();
        let admission = match inner.ctx.record_local_candidate(candidate.clone()) {
            Ok(admission) => admission,
            Err(e) => {
                drop(inner);
                return self.log_failure(Operation::AddLocalCandidate, Err(e));
            }
        };

        match (admission, candidate) {
            (CandidateAdmission::Accepted { generation }, Some(candidate)) => {
                let tagged = inner.ctx.tag_candidate(generation, candidate);
                inner.emit(NegotiationEvent::LocalCandidate(tagged));
            }
            (CandidateAdmission::EndOfCandidates { generation }, _)
                if generation == inner.ctx.local_generation() =>
            {
                let sdp_mid = inner.local_mid();
                inner.emit(NegotiationEvent::EndOfCandidates {
                    generation,
                    sdp_mid,
                });
            }
            (CandidateAdmission::Stale, _) => {
                sink_debug!(self.logger, "[Negotiation] Dropped stale local candidate");
            }
            _ => {}
        }
        Ok(admission)
    }

    /// Connectivity state from the ICE agent. Repeats and anything after
    /// `Closed` are ignored.
    pub fn on_ice_connection_state(&self, state: IceConnectionState) {
        let mut inner = self.lock();
        if inner.ice_state == state || inner.ice_state == IceConnectionState::Closed {
            return;
        }
        sink_info!(self.logger, "[ICE] Connection state {} -> {}", inner.ice_state, state);
        inner.ice_state = state;
        inner.emit(NegotiationEvent::IceConnectionStateChanged(state));
    }

    pub fn on_remote_track(&self, track: RemoteTrack) {
        sink_info!(self.logger, "[Negotiation] Remote {} track {}", track.kind, track.id);
        self.lock().emit(NegotiationEvent::RemoteTrack(track));
    }

    pub fn on_candidate_error(&self, report: CandidateErrorReport) {
        sink_warn!(
            self.logger,
            "[ICE] Candidate error {} from {}: {}",
            report.error_code,
            report.url.as_deref().unwrap_or("?"),
            report.error_text
        );
        self.lock().emit(NegotiationEvent::CandidateError(report));
    }

    /// Enters `Closed`. Idempotent.
    ///
    /// Publishes `SignalingStateChanged(Closed)` as the last event, then
    /// drops every subscriber.
    pub fn close(&self) {
        let mut inner = self.lock();
        if !inner.ctx.close() {
            return;
        }
        self.closed_tx.send_replace(true);
        inner.emit(NegotiationEvent::SignalingStateChanged(SignalingState::Closed));
        inner.subscribers.clear();
        sink_info!(self.logger, "[Negotiation] Closed");
    }

    /// Event stream; ends when the negotiator closes.
    pub fn subscribe(&self) -> UnboundedReceiver<NegotiationEvent> {
        let (tx, rx) = unbounded_channel();
        let mut inner = self.lock();
        if !inner.ctx.is_closed() {
            inner.subscribers.push(tx);
        }
        rx
    }

    pub fn signaling_state(&self) -> SignalingState {
        self.lock().ctx.state()
    }

    pub fn ice_connection_state(&self) -> IceConnectionState {
        self.lock().ice_state
    }

    pub fn local_description(&self) -> Option<SessionDescription> {
        self.lock().ctx.local_description().cloned()
    }

    pub fn remote_description(&self) -> Option<SessionDescription> {
        self.lock().ctx.remote_description().cloned()
    }

    pub fn local_generation(&self) -> u32 {
        self.lock().ctx.local_generation()
    }

    /// Candidates of the committed local generation, oldest first.
    pub fn local_candidates(&self) -> Vec<Candidate> {
        self.lock()
            .ctx
            .local_candidates()
            .map(|buf| buf.snapshot())
            .unwrap_or_default()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().ctx.is_closed()
    }

    async fn set_remote(
        &self,
        operation: Operation,
        desc: SessionDescription,
    ) -> Result<(), NegotiationError> {
        let _gate = self.op_gate.lock().await;
        let result: Result<(), NegotiationError> = async {
            self.lock().ctx.check_remote(operation, &desc)?;
            self.guarded(operation, self.engine.set_remote_description(&desc))
                .await?;

            let mut inner = self.lock();
            if inner.ctx.is_closed() {
                return Err(NegotiationError::Cancelled { operation });
            }
            let from = inner.ctx.state();
            let to = inner.ctx.commit_remote(desc);
            sink_info!(self.logger, "[Negotiation] Remote {} applied: {} -> {}", operation, from, to);
            inner.emit(NegotiationEvent::SignalingStateChanged(to));
            Ok(())
        }
        .await;
        self.log_failure(operation, result)
    }

    /// Hands `desc` to the engine under a reserved generation and commits it.
    async fn apply_local(
        &self,
        operation: Operation,
        desc: SessionDescription,
    ) -> Result<SessionDescription, NegotiationError> {
        {
            let mut inner = self.lock();
            if inner.ctx.is_closed() {
                return Err(NegotiationError::Cancelled { operation });
            }
            inner.ctx.reserve_local(desc.clone());
        }

        if let Err(e) = self
            .guarded(operation, self.engine.set_local_description(&desc))
            .await
        {
            self.lock().ctx.discard_pending();
            return Err(e);
        }

        let mut inner = self.lock();
        let Some(commit) = inner.ctx.commit_local() else {
            return Err(NegotiationError::Cancelled { operation });
        };
        let generation = commit.generation;
        sink_info!(
            self.logger,
            "[Negotiation] Local {} committed (generation {}): {} -> {}",
            desc.kind(),
            generation,
            commit.from,
            commit.to
        );

        if commit.from != commit.to {
            inner.emit(NegotiationEvent::SignalingStateChanged(commit.to));
        }
        inner.emit(NegotiationEvent::LocalDescription {
            generation,
            description: desc.clone(),
        });
        for candidate in commit.held {
            let tagged = inner.ctx.tag_candidate(generation, candidate);
            inner.emit(NegotiationEvent::LocalCandidate(tagged));
        }
        if commit.ended {
            let sdp_mid = inner.local_mid();
            inner.emit(NegotiationEvent::EndOfCandidates {
                generation,
                sdp_mid,
            });
        }
        Ok(desc)
    }

    fn committed_remote_offer(&self) -> Result<SessionDescription, NegotiationError> {
        let inner = self.lock();
        inner.ctx.check(Operation::CreateAnswer)?;
        inner
            .ctx
            .remote_description()
            .cloned()
            .ok_or(NegotiationError::InvalidStateTransition {
                state: inner.ctx.state(),
                operation: Operation::CreateAnswer,
            })
    }

    /// Awaits an engine call unless `close()` gets there first.
    async fn guarded<T, F>(&self, operation: Operation, call: F) -> Result<T, NegotiationError>
    where
        F: Future<Output = Result<T, EngineError>>,
    {
        let closed = self.closed_tx.subscribe();
        tokio::select! {
            biased;
            () = wait_closed(closed) => Err(NegotiationError::Cancelled { operation }),
            res = call => res.map_err(NegotiationError::from),
        }
    }

    fn ensure_open(&self, operation: Operation) -> Result<(), NegotiationError> {
        if self.is_closed() {
            return Err(NegotiationError::Cancelled { operation });
        }
        Ok(())
    }

    fn log_failure<T>(
        &self,
        operation: Operation,
        result: Result<T, NegotiationError>,
    ) -> Result<T, NegotiationError> {
        result.inspect_err(|e| match e {
            NegotiationError::UnderlyingEngineFailure(_) => {
                sink_error!(self.logger, "[Negotiation] {} failed: {}", operation, e);
            }
            NegotiationError::Cancelled { .. } => {
                sink_info!(self.logger, "[Negotiation] {}", e);
            }
            _ => {
                sink_warn!(self.logger, "[Negotiation] {} rejected: {}", operation, e);
            }
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn wait_closed(mut rx: watch::Receiver<bool>) {
    let sender_gone = rx.wait_for(|closed| *closed).await.is_err();
    if sender_gone {
        std::future::pending::<()>().await;
    }
}
