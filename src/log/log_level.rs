/// Defines the severity levels for log messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Per-candidate and per-event chatter.
    Trace,
    /// Engine round-trips and buffered candidate bookkeeping.
    Debug,
    /// Signaling transitions and connection health changes.
    Info,
    /// Rejected operations and discarded candidates.
    Warn,
    /// Engine failures.
    Error,
}
