pub mod negotiation_context;
pub mod negotiation_error;
pub mod negotiation_event;
pub mod negotiator;
pub mod operation;
pub mod signaling_state;

pub use negotiation_context::NegotiationContext;
pub use negotiation_error::NegotiationError;
pub use negotiation_event::{CandidateAdmission, CandidateErrorReport, NegotiationEvent};
pub use negotiator::Negotiator;
pub use operation::Operation;
pub use signaling_state::SignalingState;
