use super::{
    negotiation_error::NegotiationError, negotiation_event::CandidateAdmission,
    operation::Operation, signaling_state::SignalingState,
};
use crate::{
    ice::{candidate::Candidate, candidate_buffer::CandidateBuffer, tagged_candidate::TaggedCandidate},
    sdp::{sdp_kind::SdpKind, session_description::SessionDescription},
};

/// A local description handed to the engine but not yet committed.
#[derive(Debug)]
struct PendingLocal {
    description: SessionDescription,
    buffer: CandidateBuffer,
}

/// What a local commit changed, for the caller to publish.
#[derive(Debug)]
pub struct LocalCommit {
    pub generation: u32,
    pub from: SignalingState,
    pub to: SignalingState,
    /// Candidates reported while the description was being applied.
    pub held: Vec<Candidate>,
    /// End-of-candidates was reported while it was being applied.
    pub ended: bool,
}

/// Aggregate root of one negotiation: signaling state, descriptions and
/// candidate buffers.
///
/// Every method either fully applies or returns an error without touching
/// anything. It does no I/O; [`Negotiator`](super::negotiator::Negotiator)
/// drives it around the engine calls.
#[derive(Debug)]
pub struct NegotiationContext {
    state: SignalingState,
    local: Option<SessionDescription>,
    remote: Option<SessionDescription>,
    local_candidates: Option<CandidateBuffer>,
    remote_candidates: Option<CandidateBuffer>,
    pending: Option<PendingLocal>,
    local_generation: u32,
    remote_generation: u32,
}

impl Default for NegotiationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl NegotiationContext {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SignalingState::Stable,
            local: None,
            remote: None,
            local_candidates: None,
            remote_candidates: None,
            pending: None,
            local_generation: 0,
            remote_generation: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> SignalingState {
        self.state
    }

    #[must_use]
    pub fn local_description(&self) -> Option<&SessionDescription> {
        self.local.as_ref()
    }

    #[must_use]
    pub fn remote_description(&self) -> Option<&SessionDescription> {
        self.remote.as_ref()
    }

    /// Number of local descriptions committed so far.
    #[must_use]
    pub fn local_generation(&self) -> u32 {
        self.local_generation
    }

    #[must_use]
    pub fn remote_generation(&self) -> u32 {
        self.remote_generation
    }

    /// Buffer of the committed local generation.
    #[must_use]
    pub fn local_candidates(&self) -> Option<&CandidateBuffer> {
        self.local_candidates.as_ref()
    }

    #[must_use]
    pub fn remote_candidates(&self) -> Option<&CandidateBuffer> {
        self.remote_candidates.as_ref()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state == SignalingState::Closed
    }

    /// Checks `operation`'s precondition against the current state.
    ///
    /// Remote-description operations go through [`check_remote`](Self::check_remote).
    pub fn check(&self, operation: Operation) -> Result<(), NegotiationError> {
        let allowed = match operation {
            Operation::CreateOffer => self.state == SignalingState::Stable,
            Operation::CreateAnswer => self.state == SignalingState::HaveRemoteOffer,
            Operation::SetRemoteOffer => self.state == SignalingState::Stable,
            Operation::SetRemoteAnswer => self.state == SignalingState::HaveLocalOffer,
            Operation::AddLocalTrack => !self.is_closed(),
            Operation::AddLocalCandidate => {
                !self.is_closed() && (self.pending.is_some() || self.local_candidates.is_some())
            }
            Operation::AddRemoteCandidate => !self.is_closed() && self.remote.is_some(),
        };
        if allowed {
            Ok(())
        } else {
            Err(self.invalid(operation))
        }
    }

    /// Validates a remote description for `set_remote_offer` or
    /// `set_remote_answer`.
    ///
    /// A second remote description is a duplicate rather than a state
    /// error: while an offer is outstanding, while a committed one sits in
    /// `Stable` with no local offer round open, or when it equals the
    /// committed one.
    pub fn check_remote(
        &self,
        operation: Operation,
        desc: &SessionDescription,
    ) -> Result<(), NegotiationError> {
        let expected = match operation {
            Operation::SetRemoteOffer => SdpKind::Offer,
            Operation::SetRemoteAnswer => SdpKind::Answer,
            other => return Err(self.invalid(other)),
        };
        if self.is_closed() {
            return Err(self.invalid(operation));
        }

        let redelivered = self.remote.as_ref() == Some(desc);
        let settled = self.state == SignalingState::Stable && self.remote.is_some();
        let duplicate = redelivered
            || settled
            || (operation == Operation::SetRemoteOffer
                && self.state == SignalingState::HaveRemoteOffer);
        if duplicate {
            return Err(NegotiationError::DuplicateRemoteDescription { state: self.state });
        }

        self.check(operation)?;

        if desc.kind() != expected {
            return Err(NegotiationError::WrongDescriptionKind {
                expected,
                found: desc.kind(),
            });
        }
        Ok(())
    }

    /// Opens the next local generation for `desc` while the engine applies it.
    pub fn reserve_local(&mut self, desc: SessionDescription) -> u32 {
        let generation = self.local_generation + 1;
        self.pending = Some(PendingLocal {
            description: desc,
            buffer: CandidateBuffer::new(generation),
        });
        generation
    }

    /// Drops the reserved generation after the engine refused it.
    pub fn discard_pending(&mut self) {
        self.pending = None;
    }

    /// Commits the reserved local description.
    ///
    /// An offer moves `Stable` to `HaveLocalOffer`; an answer completes the
    /// round and returns to `Stable`.
    pub fn commit_local(&mut self) -> Option<LocalCommit> {
        if self.is_closed() {
            return None;
        }
        let PendingLocal {
            description,
            buffer,
        } = self.pending.take()?;

        let from = self.state;
        let to = match description.kind() {
            SdpKind::Offer => SignalingState::HaveLocalOffer,
            SdpKind::Answer => SignalingState::Stable,
        };
        let commit = LocalCommit {
            generation: buffer.generation(),
            from,
            to,
            held: buffer.snapshot(),
            ended: buffer.is_closed(),
        };

        self.local_generation = buffer.generation();
        self.local = Some(description);
        self.local_candidates = Some(buffer);
        self.state = to;
        Some(commit)
    }

    /// Commits a validated remote description; returns the new state.
    pub fn commit_remote(&mut self, desc: SessionDescription) -> SignalingState {
        self.state = match desc.kind() {
            SdpKind::Offer => SignalingState::HaveRemoteOffer,
            SdpKind::Answer => SignalingState::Stable,
        };
        self.remote_generation += 1;
        self.remote_candidates = Some(CandidateBuffer::new(self.remote_generation));
        self.remote = Some(desc);
        self.state
    }

    /// Records a candidate (or end-of-candidates) reported by the agent for
    /// the newest local generation, the reserved one if any.
    pub fn record_local_candidate(
        &mut self,
        candidate: Option<Candidate>,
    ) -> Result<CandidateAdmission, NegotiationError> {
        self.check(Operation::AddLocalCandidate)?;
        let not_ready = NegotiationError::InvalidStateTransition {
            state: self.state,
            operation: Operation::AddLocalCandidate,
        };

        let (description, buffer, held) =
            match (&mut self.pending, &mut self.local_candidates, &self.local) {
                (Some(p), _, _) => (&p.description, &mut p.buffer, true),
                (None, Some(buf), Some(desc)) => (desc, buf, false),
                _ => return Err(not_ready),
            };
        let generation = buffer.generation();

        let Some(candidate) = candidate else {
            return Ok(if buffer.close() {
                CandidateAdmission::EndOfCandidates { generation }
            } else {
                CandidateAdmission::Duplicate
            });
        };

        if is_stale(&candidate, description) {
            return Ok(CandidateAdmission::Stale);
        }
        if !buffer.add(candidate)? {
            return Ok(CandidateAdmission::Duplicate);
        }
        Ok(if held {
            CandidateAdmission::Held { generation }
        } else {
            CandidateAdmission::Accepted { generation }
        })
    }

    /// Decides what a remote candidate would do, without recording it.
    pub fn classify_remote_candidate(
        &self,
        candidate: Option<&Candidate>,
    ) -> Result<CandidateAdmission, NegotiationError> {
        self.check(Operation::AddRemoteCandidate)?;
        let (Some(desc), Some(buffer)) = (&self.remote, &self.remote_candidates) else {
            return Err(self.invalid(Operation::AddRemoteCandidate));
        };
        let generation = buffer.generation();

        match candidate {
            None if buffer.is_closed() => Ok(CandidateAdmission::Duplicate),
            None => Ok(CandidateAdmission::EndOfCandidates { generation }),
            Some(_) if buffer.is_closed() => Err(NegotiationError::BufferClosed { generation }),
            Some(c) if is_stale(c, desc) => Ok(CandidateAdmission::Stale),
            Some(c) if buffer.drain().any(|seen| seen == c) => Ok(CandidateAdmission::Duplicate),
            Some(_) => Ok(CandidateAdmission::Accepted { generation }),
        }
    }

    /// Records a remote candidate the engine accepted.
    pub fn record_remote_candidate(
        &mut self,
        candidate: Option<Candidate>,
    ) -> Result<CandidateAdmission, NegotiationError> {
        let admission = self.classify_remote_candidate(candidate.as_ref())?;
        if let Some(buffer) = self.remote_candidates.as_mut() {
            match (admission, candidate) {
                (CandidateAdmission::Accepted { .. }, Some(c)) => {
                    buffer.add(c)?;
                }
                (CandidateAdmission::EndOfCandidates { .. }, None) => {
                    buffer.close();
                }
                _ => {}
            }
        }
        Ok(admission)
    }

    /// Tags a committed local candidate with its generation and media section.
    #[must_use]
    pub fn tag_candidate(&self, generation: u32, candidate: Candidate) -> TaggedCandidate {
        let sdp_mid = self
            .local
            .as_ref()
            .and_then(|d| d.first_mid())
            .map(str::to_owned);
        TaggedCandidate {
            generation,
            sdp_mline_index: sdp_mid.as_ref().map(|_| 0),
            sdp_mid,
            candidate,
        }
    }

    /// Enters `Closed`, releasing buffers and descriptions.
    ///
    /// Returns `false` if it was already closed.
    pub fn close(&mut self) -> bool {
        if self.is_closed() {
            return false;
        }
        self.state = SignalingState::Closed;
        self.pending = None;
        self.local = None;
        self.remote = None;
        self.local_candidates = None;
        self.remote_candidates = None;
        true
    }

    fn invalid(&self, operation: Operation) -> NegotiationError {
        NegotiationError::InvalidStateTransition {
            state: self.state,
            operation,
        }
    }
}

/// A candidate carrying a ufrag different from the description's belongs to
/// another ICE generation.
fn is_stale(candidate: &Candidate, description: &SessionDescription) -> bool {
    match (candidate.ufrag.as_deref(), description.ice_ufrag()) {
        (Some(theirs), Some(ours)) => theirs != ours,
        _ => false,
    }
}
