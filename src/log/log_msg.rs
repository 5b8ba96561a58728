use std::time::SystemTime;

use crate::log::log_level::LogLevel;

/// A single queued log line.
///
/// Carries the severity, a millisecond wall-clock timestamp, the emitting
/// module path and the formatted text.
#[derive(Debug, Clone)]
pub struct LogMsg {
    /// Severity of the line.
    pub level: LogLevel,
    /// Milliseconds since the UNIX epoch.
    pub ts_ms: u128,
    /// Formatted message.
    pub text: String,
    /// Module path of the emitter.
    pub target: &'static str,
}

impl LogMsg {
    /// Creates a new `LogMsg` instance.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sdp_handshake::log::{log_level::LogLevel, log_msg::LogMsg};
    ///
    /// let msg = LogMsg::new(
    ///     LogLevel::Info,
    ///     "signaling state: Stable -> HaveLocalOffer",
    ///     module_path!(),
    ///     1_678_900_000_000,
    /// );
    /// assert_eq!(msg.level, LogLevel::Info);
    /// ```
    pub fn new(
        level: LogLevel,
        text: impl Into<String>,
        target: &'static str,
        ts_ms: u128,
    ) -> Self {
        Self {
            level,
            ts_ms,
            text: text.into(),
            target,
        }
    }
}

/// Milliseconds since the UNIX epoch, `0` if the clock is before it.
#[must_use]
pub fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}
