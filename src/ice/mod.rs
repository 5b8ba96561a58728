pub mod buffer_error;
pub mod candidate;
pub mod candidate_buffer;
pub mod candidate_message;
pub mod candidate_pair;
pub mod candidate_parse_error;
pub mod candidate_type;
pub mod ice_connection_state;
pub mod stats_snapshot;
pub mod tagged_candidate;

pub use buffer_error::BufferError;
pub use candidate::Candidate;
pub use candidate_buffer::CandidateBuffer;
pub use candidate_message::CandidateMessage;
pub use candidate_parse_error::CandidateParseError;
pub use candidate_type::CandidateType;
pub use ice_connection_state::IceConnectionState;
pub use stats_snapshot::{StatsReport, StatsSnapshot};
pub use tagged_candidate::TaggedCandidate;
