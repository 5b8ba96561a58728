use std::fmt;

/// Engine entry points, used to say which call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineCall {
    AddLocalTrack,
    CreateOffer,
    CreateAnswer,
    SetLocalDescription,
    SetRemoteDescription,
    AddRemoteCandidate,
    GetStatistics,
}

impl fmt::Display for EngineCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EngineCall::AddLocalTrack => "addLocalTrack",
            EngineCall::CreateOffer => "createOfferDescription",
            EngineCall::CreateAnswer => "createAnswerDescription",
            EngineCall::SetLocalDescription => "setLocalDescription",
            EngineCall::SetRemoteDescription => "setRemoteDescription",
            EngineCall::AddRemoteCandidate => "addRemoteCandidate",
            EngineCall::GetStatistics => "getStatisticsSnapshot",
        };
        f.write_str(s)
    }
}

/// Failure reported by the media/connectivity engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The engine refused or failed the call.
    Rejected { call: EngineCall, reason: String },
    /// The engine has been shut down.
    Unavailable,
}

impl EngineError {
    pub fn rejected(call: EngineCall, reason: impl Into<String>) -> Self {
        Self::Rejected {
            call,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Rejected { call, reason } => write!(f, "{call} failed: {reason}"),
            EngineError::Unavailable => write!(f, "engine unavailable"),
        }
    }
}

impl std::error::Error for EngineError {}
