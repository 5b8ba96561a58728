use std::fmt;

/// Reasons a session description is rejected as malformed.
#[derive(Debug)]
pub enum SdpError {
    /// The wire record has no `type` field.
    MissingKind,
    /// `type` is present but is not exactly `offer` or `answer`.
    UnknownKind(String),
    /// `sdp` is missing or empty.
    EmptyPayload,
    /// The wire record is not valid JSON of the expected shape.
    Json(serde_json::Error),
}

impl From<serde_json::Error> for SdpError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl fmt::Display for SdpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SdpError::MissingKind => write!(f, "Missing field: type"),
            SdpError::UnknownKind(k) => write!(f, "Invalid field: type {k:?}"),
            SdpError::EmptyPayload => write!(f, "Missing field: sdp"),
            SdpError::Json(e) => write!(f, "Invalid description record: {e}"),
        }
    }
}

impl std::error::Error for SdpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SdpError::Json(e) => Some(e),
            _ => None,
        }
    }
}
