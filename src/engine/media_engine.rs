use async_trait::async_trait;

use super::{engine_error::EngineError, track::LocalTrack};
use crate::{
    ice::{candidate::Candidate, stats_snapshot::StatsSnapshot},
    sdp::session_description::SessionDescription,
};

/// The media/connectivity engine the negotiator drives.
///
/// Only the request half lives here. The engine's notifications (local
/// candidates, connection-state changes, remote tracks, candidate errors)
/// are delivered by its glue code calling the matching `Negotiator::on_*`
/// method.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    async fn add_local_track(&self, track: &LocalTrack) -> Result<(), EngineError>;

    /// Returns the SDP payload of a fresh offer.
    async fn create_offer_description(&self) -> Result<String, EngineError>;

    /// Returns the SDP payload of an answer to `remote_offer`.
    async fn create_answer_description(
        &self,
        remote_offer: &SessionDescription,
    ) -> Result<String, EngineError>;

    async fn set_local_description(&self, desc: &SessionDescription) -> Result<(), EngineError>;

    async fn set_remote_description(&self, desc: &SessionDescription) -> Result<(), EngineError>;

    /// `None` signals end-of-candidates from the remote peer.
    async fn add_remote_candidate(&self, candidate: Option<&Candidate>) -> Result<(), EngineError>;

    async fn get_statistics_snapshot(&self) -> Result<StatsSnapshot, EngineError>;
}
