use super::signaling_state::SignalingState;
use crate::{
    engine::track::RemoteTrack,
    ice::{ice_connection_state::IceConnectionState, tagged_candidate::TaggedCandidate},
    sdp::session_description::SessionDescription,
};

/// Notifications published to every subscriber, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationEvent {
    SignalingStateChanged(SignalingState),
    /// A local description was committed; always precedes its candidates.
    LocalDescription {
        generation: u32,
        description: SessionDescription,
    },
    LocalCandidate(TaggedCandidate),
    EndOfCandidates {
        generation: u32,
        sdp_mid: Option<String>,
    },
    IceConnectionStateChanged(IceConnectionState),
    RemoteTrack(RemoteTrack),
    CandidateError(CandidateErrorReport),
}

/// The agent failed to gather against a STUN/TURN server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateErrorReport {
    pub host_candidate: Option<String>,
    pub url: Option<String>,
    pub error_code: u16,
    pub error_text: String,
}

/// What happened to a candidate handed to the negotiator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateAdmission {
    /// Recorded and published (local) or applied to the engine (remote).
    Accepted { generation: u32 },
    /// Recorded for a local description that is still being applied;
    /// published once it commits.
    Held { generation: u32 },
    /// End-of-candidates recorded for the generation.
    EndOfCandidates { generation: u32 },
    /// Already recorded; nothing changed.
    Duplicate,
    /// Its ufrag belongs to another description generation; discarded.
    Stale,
}
