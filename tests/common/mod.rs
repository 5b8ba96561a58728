#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use async_trait::async_trait;
use sdp_handshake::{
    engine::{EngineCall, EngineError, LocalTrack, LoopbackEngine, MediaEngine},
    ice::{Candidate, StatsSnapshot},
    log::NoopLogSink,
    negotiation::{NegotiationEvent, Negotiator},
    sdp::SessionDescription,
};
use tokio::sync::{Notify, mpsc::UnboundedReceiver};

pub fn peer() -> (Arc<LoopbackEngine>, Negotiator) {
    let engine = Arc::new(LoopbackEngine::new(vec!["stun:stun.example.org:3478".into()]));
    let negotiator = Negotiator::new(engine.clone(), Arc::new(NoopLogSink));
    (engine, negotiator)
}

pub fn drain(rx: &mut UnboundedReceiver<NegotiationEvent>) -> Vec<NegotiationEvent> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

/// Wire round trip, as a signaling server would relay it.
pub fn over_the_wire(desc: &SessionDescription) -> SessionDescription {
    SessionDescription::parse(&desc.serialize().unwrap()).unwrap()
}

/// Loopback engine whose `gated` call parks until [`release`](Self::release).
pub struct GatedEngine {
    pub inner: LoopbackEngine,
    gated: EngineCall,
    entered: Notify,
    release: Notify,
}

impl GatedEngine {
    pub fn new(gated: EngineCall) -> Arc<Self> {
        Arc::new(Self {
            inner: LoopbackEngine::new(Vec::new()),
            gated,
            entered: Notify::new(),
            release: Notify::new(),
        })
    }

    /// Resolves once the gated call has started.
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    async fn gate(&self, call: EngineCall) {
        if call == self.gated {
            self.entered.notify_one();
            self.release.notified().await;
        }
    }
}

#[async_trait]
impl MediaEngine for GatedEngine {
    async fn add_local_track(&self, track: &LocalTrack) -> Result<(), EngineError> {
        self.gate(EngineCall::AddLocalTrack).await;
        self.inner.add_local_track(track).await
    }

    async fn create_offer_description(&self) -> Result<String, EngineError> {
        self.gate(EngineCall::CreateOffer).await;
        self.inner.create_offer_description().await
    }

    async fn create_answer_description(
        &self,
        remote_offer: &SessionDescription,
    ) -> Result<String, EngineError> {
        self.gate(EngineCall::CreateAnswer).await;
        self.inner.create_answer_description(remote_offer).await
    }

    async fn set_local_description(&self, desc: &SessionDescription) -> Result<(), EngineError> {
        self.gate(EngineCall::SetLocalDescription).await;
        self.inner.set_local_description(desc).await
    }

    async fn set_remote_description(&self, desc: &SessionDescription) -> Result<(), EngineError> {
        self.gate(EngineCall::SetRemoteDescription).await;
        self.inner.set_remote_description(desc).await
    }

    async fn add_remote_candidate(&self, candidate: Option<&Candidate>) -> Result<(), EngineError> {
        self.gate(EngineCall::AddRemoteCandidate).await;
        self.inner.add_remote_candidate(candidate).await
    }

    async fn get_statistics_snapshot(&self) -> Result<StatsSnapshot, EngineError> {
        self.gate(EngineCall::GetStatistics).await;
        self.inner.get_statistics_snapshot().await
    }
}
