use serde::{Deserialize, Serialize};

use super::{sdp_error::SdpError, sdp_kind::SdpKind};

const ICE_UFRAG_PREFIX: &str = "a=ice-ufrag:";
const MID_PREFIX: &str = "a=mid:";

/// An offer or answer: a kind tag plus an opaque SDP blob.
///
/// Immutable once built. The payload is never inspected for grammar; only
/// the ICE username fragment and the first media id are read out of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDescription")]
pub struct SessionDescription {
    #[serde(rename = "type")]
    kind: SdpKind,
    sdp: String,
}

/// Wire record before validation; every field may be absent.
#[derive(Deserialize)]
struct RawDescription {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    sdp: Option<String>,
}

impl TryFrom<RawDescription> for SessionDescription {
    type Error = SdpError;

    fn try_from(raw: RawDescription) -> Result<Self, Self::Error> {
        let kind = match raw.kind.as_deref() {
            None => return Err(SdpError::MissingKind),
            Some("offer") => SdpKind::Offer,
            Some("answer") => SdpKind::Answer,
            Some(other) => return Err(SdpError::UnknownKind(other.to_owned())),
        };
        Self::new(kind, raw.sdp.unwrap_or_default())
    }
}

impl SessionDescription {
    /// Builds a description, rejecting an empty payload.
    pub fn new(kind: SdpKind, payload: impl Into<String>) -> Result<Self, SdpError> {
        let sdp = payload.into();
        if sdp.is_empty() {
            return Err(SdpError::EmptyPayload);
        }
        Ok(Self { kind, sdp })
    }

    /// Parses the `{"type": .., "sdp": ..}` wire record.
    ///
    /// # Errors
    /// [`SdpError`] when the text is not JSON, `type` is missing or not
    /// exactly `offer`/`answer`, or `sdp` is missing or empty.
    pub fn parse(text: &str) -> Result<Self, SdpError> {
        let raw: RawDescription = serde_json::from_str(text)?;
        Self::try_from(raw)
    }

    /// Renders the wire record. The payload is carried byte-for-byte.
    pub fn serialize(&self) -> Result<String, SdpError> {
        Ok(serde_json::to_string(self)?)
    }

    #[must_use]
    pub fn kind(&self) -> SdpKind {
        self.kind
    }

    #[must_use]
    pub fn payload(&self) -> &str {
        &self.sdp
    }

    /// Value of the first `a=ice-ufrag:` line, if any.
    #[must_use]
    pub fn ice_ufrag(&self) -> Option<&str> {
        self.attribute(ICE_UFRAG_PREFIX)
    }

    /// Value of the first `a=mid:` line, if any.
    #[must_use]
    pub fn first_mid(&self) -> Option<&str> {
        self.attribute(MID_PREFIX)
    }

    fn attribute(&self, prefix: &str) -> Option<&str> {
        self.sdp
            .lines()
            .find_map(|l| l.trim_end().strip_prefix(prefix))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}
