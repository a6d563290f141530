//! tslog core library
//!
//! Thread-safe asynchronous logging to a single file.
//!
//! ## Overview
//!
//! Any number of producer threads call [`Logger::info`] (or one of its
//! siblings). Each call formats its line on the calling thread, capturing the
//! wall-clock time and a [`ThreadTag`], and pushes it onto an unbounded FIFO
//! queue. One dedicated writer thread drains that queue into the sink file, so
//! producers never wait on disk I/O.
//!
//! ```text
//! caller ──format──▶ LineQueue::push ──▶ writer thread ──▶ FileSink
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tslog_core::Logger;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let logger = Arc::new(Logger::new());
//! logger.init("app.log", false)?;
//!
//! let handles: Vec<_> = (0..4)
//!     .map(|id| {
//!         let logger = Arc::clone(&logger);
//!         std::thread::spawn(move || {
//!             for i in 0..10 {
//!                 logger.info(format!("worker {id} message {i}")).unwrap();
//!             }
//!         })
//!     })
//!     .collect();
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//!
//! // Blocks until every queued line is on disk.
//! logger.shutdown();
//! # Ok(())
//! # }
//! ```
//!
//! ## Sink format
//!
//! ```text
//! 2026-01-21 14:30:45 [T3] [INFO] worker 2 message 7
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod level;
pub mod logger;
pub mod queue;
pub mod sink;
mod worker;

// Re-exports
pub use config::LoggerConfig;
pub use error::{ConfigError, InitError, LevelParseError, LineParseError, UsageError};
pub use format::{format_line, LogLine, ParsedLine, ThreadTag, TIMESTAMP_FORMAT};
pub use level::LogLevel;
pub use logger::{Logger, LoggerStats};
pub use queue::{LineQueue, Popped};
pub use sink::{read_lines, FileSink};
