use super::{buffer_error::BufferError, candidate::Candidate};

/// Candidates gathered for one local-description generation.
///
/// Append-only until [`close`](Self::close) records end-of-candidates.
/// Reading never consumes, so a relay that reconnects can replay the whole
/// sequence.
#[derive(Debug, Clone)]
pub struct CandidateBuffer {
    generation: u32,
    candidates: Vec<Candidate>,
    closed: bool,
}

impl CandidateBuffer {
    #[must_use]
    pub fn new(generation: u32) -> Self {
        Self {
            generation,
            candidates: Vec::new(),
            closed: false,
        }
    }

    /// Appends `candidate`.
    ///
    /// Returns `Ok(false)` without appending when an identical candidate is
    /// already recorded.
    ///
    /// # Errors
    /// [`BufferError::Closed`] once end-of-candidates has been recorded.
    pub fn add(&mut self, candidate: Candidate) -> Result<bool, BufferError> {
        if self.closed {
            return Err(BufferError::Closed {
                generation: self.generation,
            });
        }
        if self.candidates.contains(&candidate) {
            return Ok(false);
        }
        self.candidates.push(candidate);
        Ok(true)
    }

    /// Records end-of-candidates. Returns `true` only on the call that closed it.
    pub fn close(&mut self) -> bool {
        !std::mem::replace(&mut self.closed, true)
    }

    /// Every candidate recorded so far, oldest first.
    pub fn drain(&self) -> impl Iterator<Item = &Candidate> + '_ {
        self.candidates.iter()
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<Candidate> {
        self.candidates.clone()
    }

    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
