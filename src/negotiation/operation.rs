use std::fmt;

/// Caller-facing operations, named in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateOffer,
    SetRemoteOffer,
    CreateAnswer,
    SetRemoteAnswer,
    AddLocalTrack,
    AddLocalCandidate,
    AddRemoteCandidate,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::CreateOffer => "createOffer",
            Operation::SetRemoteOffer => "setRemoteOffer",
            Operation::CreateAnswer => "createAnswer",
            Operation::SetRemoteAnswer => "setRemoteAnswer",
            Operation::AddLocalTrack => "addLocalTrack",
            Operation::AddLocalCandidate => "addLocalCandidate",
            Operation::AddRemoteCandidate => "addRemoteCandidate",
        };
        f.write_str(s)
    }
}
