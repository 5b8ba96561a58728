#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{drain, over_the_wire, peer};
use sdp_handshake::{
    engine::{EngineCall, EngineError, LocalTrack, TrackKind},
    ice::{Candidate, CandidateMessage},
    negotiation::{CandidateAdmission, NegotiationError, NegotiationEvent, Operation, SignalingState},
    sdp::{SdpKind, SessionDescription},
};

#[tokio::test]
async fn offerer_round_trip_ends_stable() {
    let (_oe, offerer) = peer();
    let (_ae, answerer) = peer();

    let offer = offerer.create_offer().await.unwrap();
    assert_eq!(offerer.signaling_state(), SignalingState::HaveLocalOffer);

    answerer.set_remote_offer(over_the_wire(&offer)).await.unwrap();
    let answer = answerer.create_answer().await.unwrap();
    offerer.set_remote_answer(over_the_wire(&answer)).await.unwrap();

    assert_eq!(offerer.signaling_state(), SignalingState::Stable);
    assert_eq!(offerer.local_generation(), 1);
    assert_eq!(offerer.remote_description(), Some(answer));
}

#[tokio::test]
async fn answerer_commits_generation_one() {
    let (_oe, offerer) = peer();
    let (_ae, answerer) = peer();
    let mut events = answerer.subscribe();

    let offer = offerer.create_offer().await.unwrap();
    answerer.set_remote_offer(over_the_wire(&offer)).await.unwrap();
    assert_eq!(answerer.signaling_state(), SignalingState::HaveRemoteOffer);

    let answer = answerer.create_answer().await.unwrap();
    assert_eq!(answer.kind(), SdpKind::Answer);
    assert_eq!(answerer.signaling_state(), SignalingState::Stable);
    assert_eq!(answerer.local_generation(), 1);
    assert_eq!(
        drain(&mut events),
        vec![
            NegotiationEvent::SignalingStateChanged(SignalingState::HaveRemoteOffer),
            NegotiationEvent::SignalingStateChanged(SignalingState::Stable),
            NegotiationEvent::LocalDescription {
                generation: 1,
                description: answer
            },
        ]
    );
}

#[tokio::test]
async fn create_answer_in_stable_reports_stable() {
    let (_e, n) = peer();
    let err = n.create_answer().await.unwrap_err();
    assert!(matches!(
        err,
        NegotiationError::InvalidStateTransition {
            state: SignalingState::Stable,
            operation: Operation::CreateAnswer
        }
    ));
}

#[tokio::test]
async fn remote_answer_without_offer_is_rejected() {
    let (_oe, offerer) = peer();
    let (_ae, answerer) = peer();
    let offer = offerer.create_offer().await.unwrap();
    answerer.set_remote_offer(offer).await.unwrap();
    let answer = answerer.create_answer().await.unwrap();

    let (_e, fresh) = peer();
    assert!(matches!(
        fresh.set_remote_answer(answer).await,
        Err(NegotiationError::InvalidStateTransition {
            state: SignalingState::Stable,
            operation: Operation::SetRemoteAnswer
        })
    ));
    assert!(fresh.remote_description().is_none());
}

#[tokio::test]
async fn second_remote_offer_is_a_duplicate() {
    let (_oe, offerer) = peer();
    let (_ae, answerer) = peer();
    let offer = offerer.create_offer().await.unwrap();

    answerer.set_remote_offer(offer.clone()).await.unwrap();
    assert!(matches!(
        answerer.set_remote_offer(offer.clone()).await,
        Err(NegotiationError::DuplicateRemoteDescription {
            state: SignalingState::HaveRemoteOffer
        })
    ));
    assert_eq!(answerer.signaling_state(), SignalingState::HaveRemoteOffer);
    assert_eq!(answerer.remote_description(), Some(offer));
}

#[tokio::test]
async fn wrong_kind_is_rejected() {
    let (_e, n) = peer();
    let answer = SessionDescription::new(SdpKind::Answer, "v=0\r\n").unwrap();
    assert!(matches!(
        n.set_remote_offer(answer).await,
        Err(NegotiationError::WrongDescriptionKind {
            expected: SdpKind::Offer,
            found: SdpKind::Answer
        })
    ));
    assert_eq!(n.signaling_state(), SignalingState::Stable);
}

#[tokio::test]
async fn engine_failure_on_remote_description_changes_nothing() {
    let (_oe, offerer) = peer();
    let (ae, answerer) = peer();
    let offer = offerer.create_offer().await.unwrap();

    ae.fail_next(EngineCall::SetRemoteDescription);
    let err = answerer.set_remote_offer(offer.clone()).await.unwrap_err();
    assert!(matches!(err, NegotiationError::UnderlyingEngineFailure(_)));
    assert!(std::error::Error::source(&err).is_some());
    assert_eq!(answerer.signaling_state(), SignalingState::Stable);
    assert!(answerer.remote_description().is_none());

    answerer.set_remote_offer(offer).await.unwrap();
}

#[tokio::test]
async fn trickled_candidates_reach_the_peer_engine() {
    let (oe, offerer) = peer();
    let (ae, answerer) = peer();
    offerer
        .add_local_track(LocalTrack::new("cam", TrackKind::Video))
        .await
        .unwrap();
    let mut offerer_events = offerer.subscribe();

    let offer = offerer.create_offer().await.unwrap();
    answerer.set_remote_offer(over_the_wire(&offer)).await.unwrap();

    for cand in oe.gather_host_candidates() {
        offerer.on_local_candidate(Some(cand)).unwrap();
    }
    offerer.on_local_candidate(None).unwrap();

    let mut admissions = Vec::new();
    for event in drain(&mut offerer_events) {
        let message = match event {
            NegotiationEvent::LocalCandidate(tagged) => tagged.to_message(),
            NegotiationEvent::EndOfCandidates { sdp_mid, .. } => {
                CandidateMessage::end_of_candidates(sdp_mid, Some(0))
            }
            _ => continue,
        };
        let wire = CandidateMessage::parse(&message.serialize().unwrap()).unwrap();
        admissions.push(answerer.add_remote_candidate(wire).await.unwrap());
    }

    assert_eq!(
        admissions,
        vec![
            CandidateAdmission::Accepted { generation: 1 },
            CandidateAdmission::EndOfCandidates { generation: 1 },
        ]
    );
    assert_eq!(ae.remote_candidates(), offerer.local_candidates());
    assert!(ae.remote_gathering_done());
}

#[tokio::test]
async fn bad_remote_candidates_are_filtered() {
    let (oe, offerer) = peer();
    let (ae, answerer) = peer();
    let offer = offerer.create_offer().await.unwrap();
    answerer.set_remote_offer(offer).await.unwrap();

    let garbage = CandidateMessage::new(Some("candidate:1 1 udp".into()), Some("0".into()), Some(0));
    assert!(matches!(
        answerer.add_remote_candidate(garbage).await,
        Err(NegotiationError::MalformedCandidate(_))
    ));

    let stale = Candidate::host("127.0.0.1", 50_000, "udp", 1, Some("oldfrag1".into()));
    let stale = CandidateMessage::new(Some(stale.to_string()), Some("0".into()), Some(0));
    assert_eq!(
        answerer.add_remote_candidate(stale).await.unwrap(),
        CandidateAdmission::Stale
    );

    let good = oe.gather_host_candidates().remove(0);
    let good = CandidateMessage::new(Some(good.to_string()), Some("0".into()), Some(0));
    assert_eq!(
        answerer.add_remote_candidate(good.clone()).await.unwrap(),
        CandidateAdmission::Accepted { generation: 1 }
    );
    assert_eq!(
        answerer.add_remote_candidate(good).await.unwrap(),
        CandidateAdmission::Duplicate
    );
    assert_eq!(ae.remote_candidates().len(), 1);
}

#[tokio::test]
async fn renegotiation_bumps_generation_and_retires_old_candidates() {
    let (oe, offerer) = peer();
    let (_ae, answerer) = peer();

    let offer = offerer.create_offer().await.unwrap();
    let first_gen = oe.gather_host_candidates().remove(0);
    answerer.set_remote_offer(offer).await.unwrap();
    let answer = answerer.create_answer().await.unwrap();
    offerer.set_remote_answer(answer).await.unwrap();

    let second = offerer.create_offer().await.unwrap();
    assert_eq!(offerer.local_generation(), 2);
    assert_eq!(offerer.local_description(), Some(second));
    assert_eq!(
        offerer.on_local_candidate(Some(first_gen)).unwrap(),
        CandidateAdmission::Stale
    );
}

#[tokio::test]
async fn closed_negotiator_rejects_everything() {
    let (_e, n) = peer();
    n.create_offer().await.unwrap();
    n.close();
    n.close();

    assert_eq!(n.signaling_state(), SignalingState::Closed);
    assert!(n.local_candidates().is_empty());
    assert!(matches!(
        n.add_local_track(LocalTrack::new("mic", TrackKind::Audio)).await,
        Err(NegotiationError::InvalidStateTransition {
            state: SignalingState::Closed,
            ..
        })
    ));
    assert!(matches!(
        n.on_local_candidate(None),
        Err(NegotiationError::InvalidStateTransition {
            state: SignalingState::Closed,
            ..
        })
    ));
    let mut rx = n.subscribe();
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn distinct_offer_after_completed_round_is_a_duplicate() {
    let (_oe, first) = peer();
    let (_oe2, second) = peer();
    let (_ae, answerer) = peer();

    let offer = first.create_offer().await.unwrap();
    answerer.set_remote_offer(over_the_wire(&offer)).await.unwrap();
    answerer.create_answer().await.unwrap();

    let other_offer = second.create_offer().await.unwrap();
    assert_ne!(other_offer, offer);
    let err = answerer.set_remote_offer(other_offer).await.unwrap_err();
    assert!(matches!(
        err,
        NegotiationError::DuplicateRemoteDescription {
            state: SignalingState::Stable
        }
    ));
    assert_eq!(answerer.signaling_state(), SignalingState::Stable);
    assert_eq!(answerer.remote_description(), Some(offer));
}

#[tokio::test]
async fn distinct_second_answer_is_a_duplicate() {
    let (_oe, offerer) = peer();
    let (_ae, answerer) = peer();
    let (_ae2, other_answerer) = peer();

    let offer = offerer.create_offer().await.unwrap();
    answerer.set_remote_offer(offer.clone()).await.unwrap();
    other_answerer.set_remote_offer(offer).await.unwrap();
    let answer = answerer.create_answer().await.unwrap();
    let other_answer = other_answerer.create_answer().await.unwrap();
    assert_ne!(answer, other_answer);

    offerer.set_remote_answer(answer.clone()).await.unwrap();
    let err = offerer.set_remote_answer(other_answer).await.unwrap_err();
    assert!(matches!(
        err,
        NegotiationError::DuplicateRemoteDescription {
            state: SignalingState::Stable
        }
    ));
    assert_eq!(offerer.signaling_state(), SignalingState::Stable);
    assert_eq!(offerer.remote_description(), Some(answer));
}

#[tokio::test]
async fn offerer_buffers_three_candidates_then_completes() {
    let (_oe, offerer) = peer();
    let (_ae, answerer) = peer();

    let offer = offerer.create_offer().await.unwrap();
    let ufrag = offer.ice_ufrag().map(str::to_owned);
    let gathered: Vec<Candidate> = [50_010, 50_020, 50_030]
        .into_iter()
        .map(|port| Candidate::host("127.0.0.1", port, "udp", 1, ufrag.clone()))
        .collect();

    for candidate in &gathered {
        assert_eq!(
            offerer.on_local_candidate(Some(candidate.clone())).unwrap(),
            CandidateAdmission::Accepted { generation: 1 }
        );
    }
    assert_eq!(
        offerer.on_local_candidate(None).unwrap(),
        CandidateAdmission::EndOfCandidates { generation: 1 }
    );
    assert_eq!(offerer.local_candidates(), gathered);

    let late = Candidate::host("127.0.0.1", 50_040, "udp", 1, ufrag);
    assert!(matches!(
        offerer.on_local_candidate(Some(late)),
        Err(NegotiationError::BufferClosed { generation: 1 })
    ));
    assert_eq!(offerer.local_candidates(), gathered);

    answerer.set_remote_offer(over_the_wire(&offer)).await.unwrap();
    let answer = answerer.create_answer().await.unwrap();
    offerer.set_remote_answer(over_the_wire(&answer)).await.unwrap();
    assert_eq!(offerer.signaling_state(), SignalingState::Stable);
}

#[tokio::test]
async fn shut_down_engine_surfaces_as_engine_failure() {
    let (oe, offerer) = peer();
    oe.shutdown();

    assert!(matches!(
        offerer.create_offer().await,
        Err(NegotiationError::UnderlyingEngineFailure(EngineError::Unavailable))
    ));
    assert_eq!(offerer.signaling_state(), SignalingState::Stable);
    assert_eq!(offerer.local_generation(), 0);
    assert!(offerer.local_description().is_none());
}
