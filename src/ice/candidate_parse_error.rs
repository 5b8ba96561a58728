use std::fmt;
use std::num::ParseIntError;

/// Why a `candidate:` attribute string could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateParseError {
    /// Fewer than the eight mandatory tokens.
    TooShort(String),
    Missing(&'static str),
    Invalid(&'static str),
    ParseInt(ParseIntError),
    UnknownType(String),
}

impl From<ParseIntError> for CandidateParseError {
    fn from(e: ParseIntError) -> Self {
        Self::ParseInt(e)
    }
}

impl fmt::Display for CandidateParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateParseError::TooShort(s) => write!(f, "Invalid candidate string: '{s}'"),
            CandidateParseError::Missing(what) => write!(f, "Missing field: {what}"),
            CandidateParseError::Invalid(what) => write!(f, "Invalid field: {what}"),
            CandidateParseError::ParseInt(e) => write!(f, "Parse int error: {e}"),
            CandidateParseError::UnknownType(t) => write!(f, "Unknown candidate type: {t}"),
        }
    }
}

impl std::error::Error for CandidateParseError {}
