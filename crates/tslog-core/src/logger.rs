//! Logger lifecycle: init, log, flush, shutdown.
//!
//! ```text
//!            init ok                 shutdown
//! Stopped ───────────▶ Running ───────────────▶ Stopped
//!    ▲  init err (no thread,                        │
//!    └─ running stays false)          init again ◀──┘
//! ```
//!
//! A `Logger` is an ordinary value: create one at startup and share it with
//! `Arc<Logger>`. Each lifecycle gets a fresh queue and exactly one writer
//! thread. Dropping a running logger shuts it down.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use crate::config::LoggerConfig;
use crate::error::{InitError, UsageError};
use crate::format::LogLine;
use crate::level::LogLevel;
use crate::queue::LineQueue;
use crate::sink::FileSink;
use crate::worker::{Writer, WriterCounters, WRITER_THREAD_NAME};

/// Snapshot of the writer's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoggerStats {
    /// Lines confirmed on disk by a successful flush of the sink
    pub lines_written: u64,
    /// Sink writes or flushes that failed
    pub write_failures: u64,
}

/// State that exists only while running.
struct Active {
    queue: Arc<LineQueue>,
    writer: JoinHandle<()>,
    path: PathBuf,
}

/// Asynchronous file logger.
pub struct Logger {
    /// Fast-path flag checked by producers before touching any lock
    running: Arc<AtomicBool>,

    /// The sink, present only while running; shared with the writer thread
    sink: Arc<Mutex<Option<FileSink>>>,

    /// Producers hold the read side while pushing, so `shutdown` (write side)
    /// cannot close the queue underneath an in-flight push.
    active: RwLock<Option<Active>>,

    /// Serializes init and shutdown so a draining writer never overlaps a new one
    transition: Mutex<()>,

    counters: Arc<WriterCounters>,
}

impl Logger {
    /// A stopped logger. Call [`init`](Self::init) before logging.
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            sink: Arc::new(Mutex::new(None)),
            active: RwLock::new(None),
            transition: Mutex::new(()),
            counters: Arc::new(WriterCounters::default()),
        }
    }

    /// Open the sink and start the writer thread.
    ///
    /// Fails with [`InitError::AlreadyRunning`] if a lifecycle is active; the
    /// running lifecycle is left untouched. On any failure the logger stays
    /// stopped.
    pub fn init(&self, path: impl AsRef<Path>, append: bool) -> Result<(), InitError> {
        let path = path.as_ref();
        let _transition = self.transition.lock();

        if let Some(active) = self.active.read().as_ref() {
            return Err(InitError::AlreadyRunning {
                path: active.path.clone(),
            });
        }

        let sink = FileSink::open(path, append).map_err(|source| InitError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        *self.sink.lock() = Some(sink);

        let queue = Arc::new(LineQueue::new());
        self.running.store(true, Ordering::Release);

        let writer = Writer {
            queue: Arc::clone(&queue),
            sink: Arc::clone(&self.sink),
            running: Arc::clone(&self.running),
            counters: Arc::clone(&self.counters),
        };
        let handle = match thread::Builder::new()
            .name(WRITER_THREAD_NAME.to_string())
            .spawn(move || writer.run())
        {
            Ok(handle) => handle,
            Err(error) => {
                self.running.store(false, Ordering::Release);
                self.sink.lock().take();
                return Err(InitError::Spawn(error));
            }
        };

        *self.active.write() = Some(Active {
            queue,
            writer: handle,
            path: path.to_path_buf(),
        });

        info!(path = %path.display(), append, "logger initialized");
        Ok(())
    }

    /// [`init`](Self::init) from a validated [`LoggerConfig`].
    pub fn init_with(&self, config: &LoggerConfig) -> Result<(), InitError> {
        config.validate()?;
        self.init(&config.path, config.append)
    }

    /// Queue one line. Returns as soon as the line is queued.
    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) -> Result<(), UsageError> {
        if !self.running.load(Ordering::Acquire) {
            return Err(UsageError::NotRunning);
        }

        // Format outside any lock so producers only contend on the push.
        let line = LogLine::capture(level, message.as_ref());

        let active = self.active.read();
        let Some(active) = active.as_ref() else {
            return Err(UsageError::NotRunning);
        };
        active.queue.push(line);
        Ok(())
    }

    /// [`log`](Self::log) at `DEBUG`.
    pub fn debug(&self, message: impl AsRef<str>) -> Result<(), UsageError> {
        self.log(LogLevel::Debug, message)
    }

    /// [`log`](Self::log) at `INFO`.
    pub fn info(&self, message: impl AsRef<str>) -> Result<(), UsageError> {
        self.log(LogLevel::Info, message)
    }

    /// [`log`](Self::log) at `WARN`.
    pub fn warn(&self, message: impl AsRef<str>) -> Result<(), UsageError> {
        self.log(LogLevel::Warn, message)
    }

    /// [`log`](Self::log) at `ERROR`.
    pub fn error(&self, message: impl AsRef<str>) -> Result<(), UsageError> {
        self.log(LogLevel::Error, message)
    }

    /// Flush bytes the writer has already handed to the sink.
    ///
    /// Lines still waiting in the queue are not awaited; use
    /// [`shutdown`](Self::shutdown) when every prior call must be on disk.
    pub fn flush(&self) {
        if let Some(sink) = self.sink.lock().as_mut() {
            if let Err(error) = sink.flush() {
                self.counters.record_failure();
                warn!(path = %sink.path().display(), %error, "failed to flush log file");
            }
        }
    }

    /// Stop accepting lines, drain the queue, then flush and close the sink.
    ///
    /// Blocks until the writer has written everything queued before the call.
    /// A no-op on a stopped logger.
    pub fn shutdown(&self) {
        let _transition = self.transition.lock();

        let active = {
            let mut slot = self.active.write();
            let Some(active) = slot.take() else {
                return;
            };
            self.running.store(false, Ordering::Release);
            active.queue.close();
            active
        };

        if active.writer.join().is_err() {
            warn!("log writer thread panicked");
        }

        if let Some(sink) = self.sink.lock().take() {
            if let Err(error) = sink.close() {
                self.counters.record_failure();
                warn!(path = %active.path.display(), %error, "failed to close log file");
            }
        }

        info!(
            path = %active.path.display(),
            lines_written = self.counters.written.load(Ordering::Relaxed),
            "logger shut down"
        );
    }

    /// Whether a lifecycle is active and accepting lines.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Path of the open sink, if running.
    pub fn path(&self) -> Option<PathBuf> {
        self.active.read().as_ref().map(|active| active.path.clone())
    }

    /// Counters accumulated over every lifecycle of this logger.
    pub fn stats(&self) -> LoggerStats {
        LoggerStats {
            lines_written: self.counters.written.load(Ordering::Relaxed),
            write_failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("running", &self.is_running())
            .field("path", &self.path())
            .field("stats", &self.stats())
            .finish()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.shutdown();
    }
}
