use super::candidate_type::CandidateType;

/// Check-list state of a candidate pair (RFC 8445 §6.1.2.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidatePairState {
    Frozen,
    Waiting,
    InProgress,
    Succeeded,
    Failed,
}

/// One candidate entry of a statistics snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateStats {
    pub id: String,
    pub address: String,
    pub port: u16,
    pub protocol: String,
    pub candidate_type: CandidateType,
}

/// One candidate-pair entry of a statistics snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePairStats {
    pub id: String,
    pub local_candidate_id: String,
    pub remote_candidate_id: String,
    pub state: CandidatePairState,
    pub nominated: bool,
}

/// The pair the agent is sending on, with whichever candidate entries the
/// snapshot carried for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedCandidatePair {
    pub pair_id: String,
    pub local_candidate_id: String,
    pub remote_candidate_id: String,
    pub local: Option<CandidateStats>,
    pub remote: Option<CandidateStats>,
}
