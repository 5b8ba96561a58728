use super::{candidate::Candidate, candidate_message::CandidateMessage};

/// A local candidate stamped with the local-description generation it was
/// gathered for, plus the media section it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedCandidate {
    pub generation: u32,
    pub sdp_mid: Option<String>,
    pub sdp_mline_index: Option<u16>,
    pub candidate: Candidate,
}

impl TaggedCandidate {
    /// Trickle record for the signaling transport.
    #[must_use]
    pub fn to_message(&self) -> CandidateMessage {
        CandidateMessage::new(
            Some(self.candidate.to_string()),
            self.sdp_mid.clone(),
            self.sdp_mline_index,
        )
    }
}
