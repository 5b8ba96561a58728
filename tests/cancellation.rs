#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;

use common::{GatedEngine, drain};
use sdp_handshake::{
    engine::EngineCall,
    ice::Candidate,
    log::NoopLogSink,
    negotiation::{CandidateAdmission, NegotiationError, NegotiationEvent, Negotiator, Operation, SignalingState},
};

fn negotiator(engine: &Arc<GatedEngine>) -> Arc<Negotiator> {
    Arc::new(Negotiator::new(engine.clone(), Arc::new(NoopLogSink)))
}

#[tokio::test]
async fn close_cancels_in_flight_offer() {
    let engine = GatedEngine::new(EngineCall::CreateOffer);
    let n = negotiator(&engine);
    let mut events = n.subscribe();

    let task = tokio::spawn({
        let n = n.clone();
        async move { n.create_offer().await }
    });
    engine.wait_entered().await;
    n.close();

    let result = task.await.unwrap();
    assert!(matches!(
        result,
        Err(NegotiationError::Cancelled {
            operation: Operation::CreateOffer
        })
    ));
    assert_eq!(n.signaling_state(), SignalingState::Closed);
    assert!(n.local_description().is_none());
    assert_eq!(n.local_generation(), 0);
    assert_eq!(
        drain(&mut events),
        vec![NegotiationEvent::SignalingStateChanged(SignalingState::Closed)]
    );
}

#[tokio::test]
async fn result_arriving_after_close_is_not_applied() {
    let engine = GatedEngine::new(EngineCall::SetLocalDescription);
    let n = negotiator(&engine);

    let task = tokio::spawn({
        let n = n.clone();
        async move { n.create_offer().await }
    });
    engine.wait_entered().await;
    n.close();
    engine.release();

    assert!(matches!(
        task.await.unwrap(),
        Err(NegotiationError::Cancelled { .. })
    ));
    assert!(n.local_description().is_none());
    assert_eq!(n.signaling_state(), SignalingState::Closed);
}

#[tokio::test]
async fn candidates_gathered_early_follow_their_description() {
    let engine = GatedEngine::new(EngineCall::SetLocalDescription);
    let n = negotiator(&engine);
    let mut events = n.subscribe();

    let task = tokio::spawn({
        let n = n.clone();
        async move { n.create_offer().await }
    });
    engine.wait_entered().await;

    let early = Candidate::host("127.0.0.1", 50_000, "udp", 1, None);
    assert_eq!(
        n.on_local_candidate(Some(early.clone())).unwrap(),
        CandidateAdmission::Held { generation: 1 }
    );
    assert_eq!(
        n.on_local_candidate(None).unwrap(),
        CandidateAdmission::EndOfCandidates { generation: 1 }
    );
    assert!(drain(&mut events).is_empty());
    assert_eq!(n.signaling_state(), SignalingState::Stable);

    engine.release();
    let offer = task.await.unwrap().unwrap();

    let events = drain(&mut events);
    assert_eq!(events.len(), 4, "{events:?}");
    assert_eq!(
        events[0],
        NegotiationEvent::SignalingStateChanged(SignalingState::HaveLocalOffer)
    );
    assert_eq!(
        events[1],
        NegotiationEvent::LocalDescription {
            generation: 1,
            description: offer
        }
    );
    let NegotiationEvent::LocalCandidate(tagged) = &events[2] else {
        panic!("expected the held candidate, got {:?}", events[2]);
    };
    assert_eq!(tagged.generation, 1);
    assert_eq!(tagged.candidate, early);
    assert!(matches!(
        events[3],
        NegotiationEvent::EndOfCandidates { generation: 1, .. }
    ));
}

#[tokio::test]
async fn engine_failure_drops_reserved_generation() {
    let engine = GatedEngine::new(EngineCall::CreateOffer);
    engine.inner.fail_next(EngineCall::SetLocalDescription);
    let n = negotiator(&engine);
    engine.release();

    let err = n.create_offer().await.unwrap_err();
    assert!(matches!(err, NegotiationError::UnderlyingEngineFailure(_)));
    assert_eq!(n.signaling_state(), SignalingState::Stable);
    assert_eq!(n.local_generation(), 0);
    assert!(matches!(
        n.on_local_candidate(None),
        Err(NegotiationError::InvalidStateTransition {
            operation: Operation::AddLocalCandidate,
            ..
        })
    ));
}

#[tokio::test]
async fn operations_run_one_at_a_time() {
    let engine = GatedEngine::new(EngineCall::CreateOffer);
    let n = negotiator(&engine);

    let first = tokio::spawn({
        let n = n.clone();
        async move { n.create_offer().await }
    });
    engine.wait_entered().await;

    // Queued behind the gate; runs once the offer committed.
    let second = tokio::spawn({
        let n = n.clone();
        async move { n.create_offer().await }
    });
    tokio::task::yield_now().await;
    engine.release();

    first.await.unwrap().unwrap();
    assert!(matches!(
        second.await.unwrap(),
        Err(NegotiationError::InvalidStateTransition {
            state: SignalingState::HaveLocalOffer,
            operation: Operation::CreateOffer
        })
    ));
}
