//! Contract for the underlying media/connectivity engine, and a loopback
//! implementation that needs no network or capture device.
pub mod engine_error;
pub mod loopback_engine;
pub mod media_engine;
pub mod track;

pub use engine_error::{EngineCall, EngineError};
pub use loopback_engine::LoopbackEngine;
pub use media_engine::MediaEngine;
pub use track::{LocalTrack, RemoteTrack, TrackKind};
