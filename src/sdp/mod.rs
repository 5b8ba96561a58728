pub mod sdp_error;
pub mod sdp_kind;
pub mod session_description;

pub use sdp_error::SdpError;
pub use sdp_kind::SdpKind;
pub use session_description::SessionDescription;
