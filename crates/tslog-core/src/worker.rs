//! The single writer thread that drains the queue into the sink.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::format::LogLine;
use crate::queue::{LineQueue, Popped};
use crate::sink::FileSink;

/// Name given to the writer thread.
pub(crate) const WRITER_THREAD_NAME: &str = "tslog-writer";

/// Counters shared between the writer and the logger.
#[derive(Debug, Default)]
pub(crate) struct WriterCounters {
    pub(crate) written: AtomicU64,
    pub(crate) failures: AtomicU64,
}

impl WriterCounters {
    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }
}

/// Everything the writer thread needs, moved onto it at spawn.
pub(crate) struct Writer {
    pub(crate) queue: Arc<LineQueue>,
    pub(crate) sink: Arc<Mutex<Option<FileSink>>>,
    pub(crate) running: Arc<AtomicBool>,
    pub(crate) counters: Arc<WriterCounters>,
}

impl Writer {
    /// Drain until the queue is closed, empty, and the logger is stopped.
    ///
    /// Lines count as written only once a flush that covers them succeeds.
    pub(crate) fn run(self) {
        debug!("log writer started");
        let mut buffered = 0u64;

        loop {
            match self.queue.wait_pop() {
                Popped::Item(line) => {
                    if self.write(&line) {
                        buffered += 1;
                    }
                    if self.queue.is_empty() {
                        self.flush(&mut buffered);
                    }
                }
                Popped::Closed => {
                    if !self.running.load(Ordering::Acquire) && self.queue.is_empty() {
                        break;
                    }
                    // The queue is only closed after `running` is cleared.
                    std::thread::yield_now();
                }
            }
        }

        self.flush(&mut buffered);
        debug!(
            lines_written = self.counters.written.load(Ordering::Relaxed),
            "log writer stopped"
        );
    }

    /// Hand one line to the sink buffer. Returns false if it was dropped.
    fn write(&self, line: &LogLine) -> bool {
        let mut guard = self.sink.lock();
        let Some(sink) = guard.as_mut() else {
            self.counters.record_failure();
            warn!("log sink missing while writer is running; line dropped");
            return false;
        };

        match sink.write_line(line) {
            Ok(()) => true,
            Err(error) => {
                self.counters.record_failure();
                warn!(path = %sink.path().display(), %error, "failed to write log line");
                false
            }
        }
    }

    /// Flush the sink and move `buffered` into the written counter on success.
    ///
    /// On failure the buffered lines are given up on; they are not counted
    /// even if a later flush happens to push some of their bytes out.
    fn flush(&self, buffered: &mut u64) {
        let mut guard = self.sink.lock();
        let Some(sink) = guard.as_mut() else {
            *buffered = 0;
            return;
        };

        match sink.flush() {
            Ok(()) => {
                self.counters
                    .written
                    .fetch_add(std::mem::take(buffered), Ordering::Relaxed);
            }
            Err(error) => {
                *buffered = 0;
                self.counters.record_failure();
                warn!(path = %sink.path().display(), %error, "failed to flush log file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::LogLevel;
    use crate::sink::read_lines;
    use tempfile::TempDir;

    fn writer_for(path: &std::path::Path) -> (Writer, Arc<LineQueue>, Arc<AtomicBool>) {
        let queue = Arc::new(LineQueue::new());
        let running = Arc::new(AtomicBool::new(true));
        let writer = Writer {
            queue: Arc::clone(&queue),
            sink: Arc::new(Mutex::new(Some(FileSink::open(path, false).unwrap()))),
            running: Arc::clone(&running),
            counters: Arc::new(WriterCounters::default()),
        };
        (writer, queue, running)
    }

    #[test]
    fn test_writer_drains_queue_before_exiting() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("writer.log");
        let (writer, queue, running) = writer_for(&path);
        let counters = Arc::clone(&writer.counters);

        for i in 0..20 {
            queue.push(LogLine::capture(LogLevel::Info, &format!("line {i}")));
        }
        running.store(false, Ordering::Release);
        queue.close();

        // Runs inline: everything is queued and closed, so it must return.
        writer.run();

        let lines = read_lines(&path).unwrap();
        assert_eq!(lines.len(), 20);
        assert_eq!(lines[0].message, "line 0");
        assert_eq!(lines[19].message, "line 19");
        assert_eq!(counters.written.load(Ordering::Relaxed), 20);
        assert_eq!(counters.failures.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_writer_counts_missing_sink_as_failure() {
        let queue = Arc::new(LineQueue::new());
        let counters = Arc::new(WriterCounters::default());
        let writer = Writer {
            queue: Arc::clone(&queue),
            sink: Arc::new(Mutex::new(None)),
            running: Arc::new(AtomicBool::new(false)),
            counters: Arc::clone(&counters),
        };

        queue.push(LogLine::capture(LogLevel::Warn, "nowhere to go"));
        queue.close();
        writer.run();

        assert_eq!(counters.written.load(Ordering::Relaxed), 0);
        assert_eq!(counters.failures.load(Ordering::Relaxed), 1);
    }
}
