use serde::{Deserialize, Serialize};

use super::{candidate::Candidate, candidate_parse_error::CandidateParseError};

/// Trickle record exchanged over the signaling channel:
/// `{"candidate": .., "sdpMid": .., "sdpMLineIndex": ..}`.
///
/// A null, absent or empty `candidate` means end-of-candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateMessage {
    #[serde(default)]
    pub candidate: Option<String>,
    #[serde(rename = "sdpMid", default)]
    pub sdp_mid: Option<String>,
    #[serde(rename = "sdpMLineIndex", default)]
    pub sdp_mline_index: Option<u16>,
}

impl CandidateMessage {
    #[must_use]
    pub fn new(candidate: Option<String>, sdp_mid: Option<String>, sdp_mline_index: Option<u16>) -> Self {
        Self {
            candidate,
            sdp_mid,
            sdp_mline_index,
        }
    }

    #[must_use]
    pub fn end_of_candidates(sdp_mid: Option<String>, sdp_mline_index: Option<u16>) -> Self {
        Self::new(None, sdp_mid, sdp_mline_index)
    }

    #[must_use]
    pub fn is_end_of_candidates(&self) -> bool {
        self.candidate.as_deref().is_none_or(|c| c.trim().is_empty())
    }

    /// The carried candidate, `None` for end-of-candidates.
    pub fn parse_candidate(&self) -> Result<Option<Candidate>, CandidateParseError> {
        if self.is_end_of_candidates() {
            return Ok(None);
        }
        self.candidate.as_deref().map(str::parse).transpose()
    }

    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn serialize(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
