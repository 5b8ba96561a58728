//! sdp-handshake drives the SDP offer/answer exchange and ICE candidate
//! trickling for one peer connection on top of a pluggable media engine.
//!
//! It provides one binary:
//! - `sdp_handshake`: runs an offerer and an answerer over the loopback
//!   engine and prints the signaling records they exchange.
//!
//! The negotiation core lives in [`negotiation`]; everything it talks to is
//! split into its own module.

/// Handles configuration loading and management.
pub mod config;
/// The media/connectivity engine contract and a loopback implementation.
pub mod engine;
/// ICE candidates, candidate buffers and statistics snapshots.
pub mod ice;
/// Logging utilities for the application.
pub mod log;
/// Connectivity observer built on negotiation events.
pub mod monitor;
/// Offer/answer state machine.
pub mod negotiation;
/// Session description wire model.
pub mod sdp;
