use crate::{
    config::LogSettings,
    log::{log_level::LogLevel, log_msg::LogMsg, logger_handle::LoggerHandle},
};

use std::{
    fs::{self, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    sync::mpsc::{self, TrySendError},
    thread,
    time::{SystemTime, UNIX_EPOCH},
};

/// Flush every 100 lines when debugging so a crash loses little.
#[cfg(feature = "log-debug")]
const FLUSH_BATCH_SIZE: u32 = 100;

#[cfg(not(feature = "log-debug"))]
const FLUSH_BATCH_SIZE: u32 = 1_000;

const FALLBACK_FILE_NAME: &str = "sdp-handshake-fallback.log";

/// Bounded, non-blocking logger that writes to a per-process log file.
///
/// A background worker thread drains a bounded channel into the file. Warn
/// and Error lines, plus one out of every `sample_every` lower-severity
/// lines, are mirrored into a second bounded "console" channel so a binary
/// can echo negotiation progress without flooding its terminal.
///
/// # Architecture
///
/// 1. **Producers**: the negotiator and monitor log through [`LoggerHandle`].
/// 2. **Queue**: a bounded `mpsc::sync_channel` buffers lines.
/// 3. **Consumer**: the worker writes and flushes in batches.
/// 4. **Sampler**: the worker forwards a sample to the console channel.
pub struct Logger {
    handle: LoggerHandle,
    console_rx: mpsc::Receiver<String>,
    thread: Option<thread::JoinHandle<()>>,
    file_path: PathBuf,
}

impl Logger {
    /// Starts the logger from the `[Logging]` settings.
    ///
    /// Uses `log_path` when configured, otherwise a `logs/` directory next
    /// to the executable.
    #[must_use]
    pub fn start(settings: &LogSettings) -> Self {
        let dir = settings
            .log_path
            .as_deref()
            .map_or_else(|| exe_dir_fallback_cwd().join("logs"), expand_path);
        Self::start_in_dir(
            dir,
            settings.log_filename.as_deref(),
            settings.queue_capacity,
            settings.console_capacity,
            settings.console_sample_every,
        )
    }

    /// Starts the logger in a specific directory.
    ///
    /// Creates the directory if missing, picks a file name from the app
    /// name, the current UNIX time and the PID, and spawns the worker.
    ///
    /// # Arguments
    ///
    /// * `dir` - Directory for the log file.
    /// * `app_name` - Optional file name prefix.
    /// * `cap` - Capacity of the main queue.
    /// * `console_cap` - Capacity of the console channel.
    /// * `sample_every` - One out of every N Trace/Debug/Info lines reaches the console.
    pub fn start_in_dir<D: AsRef<Path>>(
        dir: D,
        app_name: Option<&str>,
        cap: usize,
        console_cap: usize,
        sample_every: u32,
    ) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let _ = fs::create_dir_all(&dir);

        let sample_every = sample_every.max(1);
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let pid = std::process::id();
        let fname = match app_name {
            Some(name) => format!("{name}-{secs}-pid{pid}.log"),
            None => format!("{secs}-pid{pid}.log"),
        };
        let file_path = dir.join(fname);

        let (tx, rx) = mpsc::sync_channel::<LogMsg>(cap.max(1));
        let (console_tx, console_rx) = mpsc::sync_channel::<String>(console_cap.max(1));
        let worker_path = file_path.clone();

        let thread = thread::Builder::new()
            .name("logger-worker".into())
            .spawn(move || run_worker(&worker_path, &rx, &console_tx, sample_every))
            .ok();

        Self {
            handle: LoggerHandle { tx },
            console_rx,
            thread,
            file_path,
        }
    }

    /// Attempts to enqueue a line without blocking; drops it if the queue is full.
    ///
    /// # Errors
    /// Returns the rejected [`LogMsg`] when the queue is full or the worker is gone.
    pub fn try_log<S: Into<String>>(
        &self,
        level: LogLevel,
        text: S,
        target: &'static str,
    ) -> Result<(), TrySendError<LogMsg>> {
        self.handle.try_log(level, text, target)
    }

    /// Returns a cloneable handle usable as an `Arc<dyn LogSink>`.
    #[must_use]
    pub fn handle(&self) -> LoggerHandle {
        self.handle.clone()
    }

    /// Pops one sampled line for console display, if any.
    #[must_use]
    pub fn try_recv_console(&self) -> Option<String> {
        self.console_rx.try_recv().ok()
    }

    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Closes the queue and waits for the worker to flush.
    ///
    /// Blocks until every other [`LoggerHandle`] clone has been dropped.
    pub fn shutdown(self) {
        let Self { handle, thread, .. } = self;
        drop(handle);
        if let Some(t) = thread {
            let _ = t.join();
        }
    }
}

fn run_worker(
    path: &Path,
    rx: &mpsc::Receiver<LogMsg>,
    console_tx: &mpsc::SyncSender<String>,
    sample_every: u32,
) {
    // Target file, then a temp file, then a sink.
    let writer: Box<dyn Write + Send> =
        if let Ok(f) = OpenOptions::new().create(true).append(true).open(path) {
            Box::new(f)
        } else {
            let fallback = std::env::temp_dir().join(FALLBACK_FILE_NAME);
            match OpenOptions::new().create(true).append(true).open(&fallback) {
                Ok(f) => Box::new(f),
                Err(_) => Box::new(io::sink()),
            }
        };
    let mut out = BufWriter::new(writer);

    let mut sampled: u32 = 0;
    let mut lines_written: u32 = 0;
    let mut dropped: usize = 0;

    while let Ok(m) = rx.recv() {
        let _ = writeln!(
            &mut out,
            "[{:?}] {} {} | {}",
            m.level, m.ts_ms, m.target, m.text
        );
        lines_written = lines_written.wrapping_add(1);
        if lines_written.is_multiple_of(FLUSH_BATCH_SIZE) {
            let _ = out.flush();
        }

        let forward = matches!(m.level, LogLevel::Warn | LogLevel::Error) || {
            sampled = sampled.wrapping_add(1);
            sampled.is_multiple_of(sample_every)
        };
        if forward
            && console_tx
                .try_send(format!("[{:?}] {}", m.level, m.text))
                .is_err()
        {
            dropped += 1;
        }
        if dropped >= 10 {
            let _ = console_tx.try_send(format!("(logger) console queue dropped {dropped} lines"));
            dropped = 0;
        }
    }

    let _ = out.flush();
}

/// `logs/` lives next to the executable, or under the working directory.
fn exe_dir_fallback_cwd() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Expands a leading `~` to the home directory.
fn expand_path(path_str: &str) -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok()
        .map(PathBuf::from);
    match (path_str, home) {
        ("~", Some(home)) => home,
        (p, Some(home)) if p.starts_with("~/") || p.starts_with("~\\") => home.join(&p[2..]),
        (p, _) => PathBuf::from(p),
    }
}
