use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    /// End-of-candidates was already recorded for this generation.
    Closed { generation: u32 },
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferError::Closed { generation } => {
                write!(f, "candidate buffer for generation {generation} is closed")
            }
        }
    }
}

impl std::error::Error for BufferError {}
