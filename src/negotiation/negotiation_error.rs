use std::fmt;

use super::{operation::Operation, signaling_state::SignalingState};
use crate::{
    engine::engine_error::EngineError,
    ice::{buffer_error::BufferError, candidate_parse_error::CandidateParseError},
    sdp::{sdp_error::SdpError, sdp_kind::SdpKind},
};

/// Every way a negotiation operation can fail. A failed operation leaves
/// the context exactly as it was.
#[derive(Debug)]
pub enum NegotiationError {
    /// The wire record or the engine's payload is not a usable description.
    MalformedDescription(SdpError),
    /// The operation is not allowed in the current signaling state.
    InvalidStateTransition {
        state: SignalingState,
        operation: Operation,
    },
    /// The same remote description was delivered again.
    DuplicateRemoteDescription { state: SignalingState },
    /// A remote description of the wrong kind for this operation.
    WrongDescriptionKind { expected: SdpKind, found: SdpKind },
    /// End-of-candidates was already recorded for this generation.
    BufferClosed { generation: u32 },
    /// A trickled candidate string could not be parsed.
    MalformedCandidate(CandidateParseError),
    /// `close()` ran while the operation was waiting on the engine.
    Cancelled { operation: Operation },
    /// The engine reported a failure.
    UnderlyingEngineFailure(EngineError),
}

impl From<SdpError> for NegotiationError {
    fn from(e: SdpError) -> Self {
        Self::MalformedDescription(e)
    }
}

impl From<EngineError> for NegotiationError {
    fn from(e: EngineError) -> Self {
        Self::UnderlyingEngineFailure(e)
    }
}

impl From<CandidateParseError> for NegotiationError {
    fn from(e: CandidateParseError) -> Self {
        Self::MalformedCandidate(e)
    }
}

impl From<BufferError> for NegotiationError {
    fn from(e: BufferError) -> Self {
        match e {
            BufferError::Closed { generation } => Self::BufferClosed { generation },
        }
    }
}

impl fmt::Display for NegotiationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegotiationError::MalformedDescription(e) => write!(f, "Malformed description: {e}"),
            NegotiationError::InvalidStateTransition { state, operation } => {
                write!(f, "{operation} is not allowed in state {state}")
            }
            NegotiationError::DuplicateRemoteDescription { state } => {
                write!(f, "Remote description already set (state {state})")
            }
            NegotiationError::WrongDescriptionKind { expected, found } => {
                write!(f, "Expected an {expected} description, got an {found}")
            }
            NegotiationError::BufferClosed { generation } => {
                write!(f, "Candidates for generation {generation} already ended")
            }
            NegotiationError::MalformedCandidate(e) => write!(f, "Malformed candidate: {e}"),
            NegotiationError::Cancelled { operation } => {
                write!(f, "{operation} cancelled by close()")
            }
            NegotiationError::UnderlyingEngineFailure(e) => write!(f, "Engine failure: {e}"),
        }
    }
}

impl std::error::Error for NegotiationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NegotiationError::MalformedDescription(e) => Some(e),
            NegotiationError::MalformedCandidate(e) => Some(e),
            NegotiationError::UnderlyingEngineFailure(e) => Some(e),
            _ => None,
        }
    }
}
