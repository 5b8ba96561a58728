use std::sync::mpsc;

use crate::log::{
    log_level::LogLevel,
    log_msg::{LogMsg, now_millis},
    log_sink::LogSink,
};

/// Lightweight, cloneable handle to the process logger.
///
/// `LoggerHandle` enqueues `LogMsg` into the logger's bounded `SyncSender`.
/// Calls to [`try_log`](Self::try_log) never block: if the queue is full the
/// line is dropped and an error is returned. The negotiation core only sees
/// it through the [`LogSink`] trait.
///
/// # Examples
/// ```ignore
/// let handle = logger.handle();
/// handle.try_log(LogLevel::Info, "offer created", module_path!())?;
/// ```
#[derive(Clone)]
pub struct LoggerHandle {
    pub(super) tx: mpsc::SyncSender<LogMsg>,
}

impl LogSink for LoggerHandle {
    #[inline]
    fn log(&self, level: LogLevel, msg: &str, target: &'static str) {
        let _ = self.try_log(level, msg, target);
    }
}

impl LoggerHandle {
    /// Attempts to enqueue a log line without blocking.
    ///
    /// # Errors
    /// - `TrySendError::Full(_)` when the bounded queue is at capacity.
    /// - `TrySendError::Disconnected(_)` when the logger worker is gone.
    pub fn try_log<S: Into<String>>(
        &self,
        level: LogLevel,
        text: S,
        target: &'static str,
    ) -> Result<(), mpsc::TrySendError<LogMsg>> {
        let msg = LogMsg::new(level, text, target, now_millis());
        self.tx.try_send(msg)
    }
}
