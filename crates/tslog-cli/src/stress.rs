//! Stress driver: many producer threads hammering one logger.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use tracing::info;
use tslog_core::{read_lines, Logger};

/// Parameters of one stress run.
#[derive(Debug, Clone)]
pub struct StressOptions {
    pub threads: usize,
    pub messages: usize,
    /// Base pause between messages; producer `i` adds `i % 5` ms
    pub delay: Duration,
}

/// Outcome of a stress run, verified against the sink file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StressReport {
    pub path: PathBuf,
    pub expected: usize,
    pub written: usize,
    pub elapsed: Duration,
}

/// Spawn producers, wait for them, shut the logger down and count the lines.
///
/// `logger` must already be initialized; it is stopped on return.
pub fn run(logger: Arc<Logger>, path: &Path, options: &StressOptions) -> Result<StressReport> {
    let start = Instant::now();

    let handles: Vec<_> = (0..options.threads)
        .map(|id| {
            let logger = Arc::clone(&logger);
            let pause = producer_pause(options.delay, id);
            let messages = options.messages;
            thread::Builder::new()
                .name(format!("producer-{id}"))
                .spawn(move || -> Result<()> {
                    for i in 0..messages {
                        logger.info(format!("worker {id} message {i}"))?;
                        if !pause.is_zero() {
                            thread::sleep(pause);
                        }
                    }
                    Ok(())
                })
                .context("failed to spawn producer thread")
        })
        .collect::<Result<_>>()?;

    for handle in handles {
        match handle.join() {
            Ok(result) => result?,
            Err(_) => bail!("producer thread panicked"),
        }
    }

    logger.shutdown();
    let elapsed = start.elapsed();

    let written = read_lines(path)
        .with_context(|| format!("failed to read back {}", path.display()))?
        .len();
    let expected = options.threads * options.messages;
    info!(expected, written, ?elapsed, "stress run finished");

    Ok(StressReport {
        path: path.to_path_buf(),
        expected,
        written,
        elapsed,
    })
}

/// `base + id % 5` ms; a zero base disables pausing, stagger included.
fn producer_pause(base: Duration, id: usize) -> Duration {
    if base.is_zero() {
        return Duration::ZERO;
    }
    base + Duration::from_millis((id % 5) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_producer_pause_staggers_threads() {
        let base = Duration::from_millis(5);
        assert_eq!(producer_pause(base, 0), Duration::from_millis(5));
        assert_eq!(producer_pause(base, 3), Duration::from_millis(8));
        assert_eq!(producer_pause(base, 7), Duration::from_millis(7));
        assert_eq!(producer_pause(Duration::ZERO, 3), Duration::ZERO);
    }

    #[test]
    fn test_run_writes_every_message() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test.log");
        let logger = Arc::new(Logger::new());
        logger.init(&path, false).unwrap();

        let options = StressOptions {
            threads: 8,
            messages: 100,
            delay: Duration::ZERO,
        };
        let report = run(Arc::clone(&logger), &path, &options).unwrap();

        assert_eq!(report.expected, 800);
        assert_eq!(report.written, 800);
        assert!(!logger.is_running());
    }

    #[test]
    fn test_run_fails_on_stopped_logger() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test.log");
        let logger = Arc::new(Logger::new());

        let options = StressOptions {
            threads: 2,
            messages: 1,
            delay: Duration::ZERO,
        };
        let err = run(logger, &path, &options).unwrap_err();
        assert!(err.to_string().contains("not running"));
    }
}
