//! Read-only observer of connectivity: turns ICE state changes into
//! connection milestones and resolves the selected candidate pair.
pub mod connection_event;
pub mod connection_monitor;

pub use connection_event::{ConnectionEvent, MonitorReport};
pub use connection_monitor::ConnectionMonitor;
