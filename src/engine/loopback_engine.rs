use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rand::{Rng, RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};

use super::{
    engine_error::{EngineCall, EngineError},
    media_engine::MediaEngine,
    track::{LocalTrack, TrackKind},
};
use crate::{
    ice::{
        candidate::Candidate,
        candidate_pair::{CandidatePairState, CandidatePairStats, CandidateStats},
        stats_snapshot::{StatsReport, StatsSnapshot},
    },
    sdp::session_description::SessionDescription,
};

const LOOPBACK_ADDR: &str = "127.0.0.1";
const DEFAULT_PROTO: &str = "UDP/TLS/RTP/SAVPF";
const DISCARD_PORT: u16 = 9;
const EPHEMERAL_PORTS: std::ops::RangeInclusive<u16> = 49_152..=65_535;
const AUDIO_PT: u8 = 111;
const AUDIO_CODEC: &str = "opus/48000/2";
const VIDEO_PT: u8 = 96;
const VIDEO_CODEC: &str = "VP8/90000";
const SETUP_OFFER: &str = "actpass";
const SETUP_ANSWER: &str = "active";
const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
// ICE: ufrag >= 4 chars; pwd >= 22 chars
const UFRAG_LEN: usize = 8;
const PWD_LEN: usize = 24;
const COMPONENT_RTP: u16 = 1;

#[derive(Debug, Default)]
struct LoopbackState {
    tracks: Vec<LocalTrack>,
    local: Option<SessionDescription>,
    remote: Option<SessionDescription>,
    local_candidates: Vec<Candidate>,
    remote_candidates: Vec<Candidate>,
    remote_gathering_done: bool,
    sdp_version: u64,
    fail_next: HashSet<EngineCall>,
    shut_down: bool,
}

/// In-process engine: writes plausible SDP, "gathers" loopback host
/// candidates and reports the first local/remote pair as succeeded.
///
/// Lets two negotiators complete a full handshake without sockets or
/// capture devices.
#[derive(Debug)]
pub struct LoopbackEngine {
    ice_servers: Vec<String>,
    session_id: u64,
    fingerprint: String,
    state: Mutex<LoopbackState>,
}

impl LoopbackEngine {
    #[must_use]
    pub fn new(ice_servers: Vec<String>) -> Self {
        // Stand-in for a DTLS certificate: only its digest ever leaves the engine.
        let mut cert = [0u8; 64];
        OsRng.fill_bytes(&mut cert);

        Self {
            ice_servers,
            session_id: OsRng.next_u64() >> 1,
            fingerprint: fingerprint_of(&cert),
            state: Mutex::new(LoopbackState::default()),
        }
    }

    #[must_use]
    pub fn ice_servers(&self) -> &[String] {
        &self.ice_servers
    }

    /// Makes the next call of kind `call` fail once.
    pub fn fail_next(&self, call: EngineCall) {
        self.lock().fail_next.insert(call);
    }

    /// Stops the engine; every later call fails with [`EngineError::Unavailable`].
    pub fn shutdown(&self) {
        let mut st = self.lock();
        st.shut_down = true;
        st.local_candidates.clear();
        st.remote_candidates.clear();
    }

    /// Produces one host candidate for the applied local description.
    ///
    /// Empty until `set_local_description` has run.
    pub fn gather_host_candidates(&self) -> Vec<Candidate> {
        let mut st = self.lock();
        if st.shut_down {
            return Vec::new();
        }
        let Some(ufrag) = st
            .local
            .as_ref()
            .and_then(|d| d.ice_ufrag())
            .map(str::to_owned)
        else {
            return Vec::new();
        };
        let port = OsRng.gen_range(EPHEMERAL_PORTS);
        let mut cand = Candidate::host(LOOPBACK_ADDR, port, "udp", COMPONENT_RTP, Some(ufrag));
        cand.extensions.push(("generation".to_owned(), "0".to_owned()));
        st.local_candidates.push(cand.clone());
        vec![cand]
    }

    #[must_use]
    pub fn remote_candidates(&self) -> Vec<Candidate> {
        self.lock().remote_candidates.clone()
    }

    #[must_use]
    pub fn remote_gathering_done(&self) -> bool {
        self.lock().remote_gathering_done
    }

    fn lock(&self) -> MutexGuard<'_, LoopbackState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_injected(&self, call: EngineCall) -> Result<(), EngineError> {
        let mut st = self.lock();
        if st.shut_down {
            return Err(EngineError::Unavailable);
        }
        if st.fail_next.remove(&call) {
            return Err(EngineError::rejected(call, "injected failure"));
        }
        Ok(())
    }

    fn build_sdp(&self, kinds: &[TrackKind], setup: &str, version: u64) -> String {
        let ufrag = gen_token(UFRAG_LEN);
        let pwd = gen_token(PWD_LEN);
        let mids: Vec<String> = (0..kinds.len()).map(|i| i.to_string()).collect();

        let mut sdp = String::new();
        let _ = write!(
            sdp,
            "v=0\r\no=- {} {version} IN IP4 {LOOPBACK_ADDR}\r\ns=-\r\nt=0 0\r\na=group:BUNDLE {}\r\n",
            self.session_id,
            mids.join(" ")
        );
        for (mid, kind) in mids.iter().zip(kinds) {
            let (pt, codec) = match kind {
                TrackKind::Audio => (AUDIO_PT, AUDIO_CODEC),
                TrackKind::Video => (VIDEO_PT, VIDEO_CODEC),
            };
            let _ = write!(
                sdp,
                "m={kind} {DISCARD_PORT} {DEFAULT_PROTO} {pt}\r\nc=IN IP4 0.0.0.0\r\n\
                 a=mid:{mid}\r\na=ice-ufrag:{ufrag}\r\na=ice-pwd:{pwd}\r\n\
                 a=fingerprint:sha-256 {}\r\na=setup:{setup}\r\na=rtcp-mux\r\n\
                 a=rtpmap:{pt} {codec}\r\na=sendrecv\r\n",
                self.fingerprint
            );
        }
        sdp
    }

    fn next_version(&self) -> u64 {
        let mut st = self.lock();
        st.sdp_version += 1;
        st.sdp_version
    }
}

#[async_trait]
impl MediaEngine for LoopbackEngine {
    async fn add_local_track(&self, track: &LocalTrack) -> Result<(), EngineError> {
        self.check_injected(EngineCall::AddLocalTrack)?;
        let mut st = self.lock();
        if st.tracks.iter().any(|t| t.id == track.id) {
            return Err(EngineError::rejected(
                EngineCall::AddLocalTrack,
                format!("track {} already added", track.id),
            ));
        }
        st.tracks.push(track.clone());
        Ok(())
    }

    async fn create_offer_description(&self) -> Result<String, EngineError> {
        self.check_injected(EngineCall::CreateOffer)?;
        let mut kinds: Vec<TrackKind> = self.lock().tracks.iter().map(|t| t.kind).collect();
        if kinds.is_empty() {
            kinds.push(TrackKind::Audio);
        }
        let version = self.next_version();
        Ok(self.build_sdp(&kinds, SETUP_OFFER, version))
    }

    async fn create_answer_description(
        &self,
        remote_offer: &SessionDescription,
    ) -> Result<String, EngineError> {
        self.check_injected(EngineCall::CreateAnswer)?;
        let kinds: Vec<TrackKind> = remote_offer
            .payload()
            .lines()
            .filter_map(|l| l.strip_prefix("m="))
            .filter_map(|m| match m.split_whitespace().next() {
                Some("audio") => Some(TrackKind::Audio),
                Some("video") => Some(TrackKind::Video),
                _ => None,
            })
            .collect();
        if kinds.is_empty() {
            return Err(EngineError::rejected(
                EngineCall::CreateAnswer,
                "offer has no audio or video section",
            ));
        }
        let version = self.next_version();
        Ok(self.build_sdp(&kinds, SETUP_ANSWER, version))
    }

    async fn set_local_description(&self, desc: &SessionDescription) -> Result<(), EngineError> {
        self.check_injected(EngineCall::SetLocalDescription)?;
        let mut st = self.lock();
        st.local = Some(desc.clone());
        st.local_candidates.clear();
        Ok(())
    }

    async fn set_remote_description(&self, desc: &SessionDescription) -> Result<(), EngineError> {
        self.check_injected(EngineCall::SetRemoteDescription)?;
        let mut st = self.lock();
        st.remote = Some(desc.clone());
        st.remote_candidates.clear();
        st.remote_gathering_done = false;
        Ok(())
    }

    async fn add_remote_candidate(&self, candidate: Option<&Candidate>) -> Result<(), EngineError> {
        self.check_injected(EngineCall::AddRemoteCandidate)?;
        let mut st = self.lock();
        if st.remote.is_none() {
            return Err(EngineError::rejected(
                EngineCall::AddRemoteCandidate,
                "no remote description",
            ));
        }
        match candidate {
            Some(c) => st.remote_candidates.push(c.clone()),
            None => st.remote_gathering_done = true,
        }
        Ok(())
    }

    async fn get_statistics_snapshot(&self) -> Result<StatsSnapshot, EngineError> {
        self.check_injected(EngineCall::GetStatistics)?;
        let st = self.lock();
        let mut reports = Vec::new();
        for (i, c) in st.local_candidates.iter().enumerate() {
            reports.push(StatsReport::LocalCandidate(stats_entry(format!("L{i}"), c)));
        }
        for (i, c) in st.remote_candidates.iter().enumerate() {
            reports.push(StatsReport::RemoteCandidate(stats_entry(format!("R{i}"), c)));
        }
        if !st.local_candidates.is_empty() && !st.remote_candidates.is_empty() {
            reports.push(StatsReport::CandidatePair(CandidatePairStats {
                id: "CP0-0".to_owned(),
                local_candidate_id: "L0".to_owned(),
                remote_candidate_id: "R0".to_owned(),
                state: CandidatePairState::Succeeded,
                nominated: true,
            }));
        }
        Ok(StatsSnapshot::new(reports))
    }
}

fn stats_entry(id: String, c: &Candidate) -> CandidateStats {
    CandidateStats {
        id,
        address: c.address.clone(),
        port: c.port,
        protocol: c.protocol.clone(),
        candidate_type: c.cand_type,
    }
}

fn gen_token(len: usize) -> String {
    (0..len)
        .map(|_| TOKEN_ALPHABET[OsRng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

/// `AB:CD:..` form used by `a=fingerprint:sha-256`.
fn fingerprint_of(der: &[u8]) -> String {
    Sha256::digest(der)
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(":")
}
