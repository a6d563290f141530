//! Lifecycle tests
//!
//! Init/shutdown transitions, error paths and the drain-before-close guarantee,
//! exercised through the public API against real files.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;
use tslog_core::{read_lines, InitError, LogLevel, Logger, LoggerConfig, UsageError};

// ============================================================================
// Test Utilities
// ============================================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}

fn messages(path: &Path) -> Vec<String> {
    read_lines(path)
        .unwrap()
        .into_iter()
        .map(|line| line.message)
        .collect()
}

// ============================================================================
// Init Tests
// ============================================================================

#[test]
fn test_init_failure_leaves_logger_stopped() {
    init_tracing();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("no-such-dir").join("app.log");

    let logger = Logger::new();
    let err = logger.init(&path, false).unwrap_err();

    assert!(matches!(err, InitError::Open { .. }));
    assert!(!logger.is_running());
    assert_eq!(logger.path(), None);
    assert_eq!(logger.info("after failed init"), Err(UsageError::NotRunning));

    // Shutdown after a failed init has nothing to tear down.
    logger.shutdown();
    assert!(!path.exists());
}

#[test]
fn test_init_failure_on_directory_path() {
    let temp = TempDir::new().unwrap();

    let logger = Logger::new();
    let err = logger.init(temp.path(), false).unwrap_err();

    assert!(matches!(err, InitError::Open { .. }));
    assert!(!logger.is_running());
}

#[test]
fn test_second_init_while_running_is_rejected() {
    let temp = TempDir::new().unwrap();
    let first = temp.path().join("first.log");
    let second = temp.path().join("second.log");

    let logger = Logger::new();
    logger.init(&first, false).unwrap();

    let err = logger.init(&second, false).unwrap_err();
    match err {
        InitError::AlreadyRunning { path } => assert_eq!(path, first),
        other => panic!("unexpected error: {other}"),
    }

    // The first lifecycle keeps working and still owns its sink.
    logger.info("still here").unwrap();
    logger.shutdown();

    assert_eq!(messages(&first), vec!["still here"]);
    assert!(!second.exists());
}

#[test]
fn test_reinit_after_shutdown() {
    init_tracing();
    let temp = TempDir::new().unwrap();
    let first = temp.path().join("first.log");
    let second = temp.path().join("second.log");

    let logger = Logger::new();
    logger.init(&first, false).unwrap();
    logger.info("one").unwrap();
    logger.shutdown();

    logger.init(&second, false).unwrap();
    logger.info("two").unwrap();
    logger.shutdown();

    assert_eq!(messages(&first), vec!["one"]);
    assert_eq!(messages(&second), vec!["two"]);
    assert_eq!(logger.stats().lines_written, 2);
}

#[test]
fn test_truncate_mode_discards_previous_content() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("app.log");

    let logger = Logger::new();
    logger.init(&path, false).unwrap();
    logger.info("old").unwrap();
    logger.shutdown();

    logger.init(&path, false).unwrap();
    logger.info("new").unwrap();
    logger.shutdown();

    assert_eq!(messages(&path), vec!["new"]);
}

#[test]
fn test_append_mode_keeps_previous_content() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("client.log");

    let logger = Logger::new();
    for message in ["first run", "second run"] {
        logger
            .init_with(&LoggerConfig::new(&path).append(true))
            .unwrap();
        logger.info(message).unwrap();
        logger.shutdown();
    }

    assert_eq!(messages(&path), vec!["first run", "second run"]);
}

// ============================================================================
// Logging Tests
// ============================================================================

#[test]
fn test_log_after_shutdown_is_usage_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("app.log");

    let logger = Logger::new();
    logger.init(&path, false).unwrap();
    logger.shutdown();

    assert_eq!(logger.info("too late"), Err(UsageError::NotRunning));
    assert_eq!(logger.error("too late"), Err(UsageError::NotRunning));
    assert_eq!(
        logger.log(LogLevel::Warn, "too late"),
        Err(UsageError::NotRunning)
    );
    assert!(messages(&path).is_empty());
}

#[test]
fn test_fifo_order_single_thread() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("app.log");

    let logger = Logger::new();
    logger.init(&path, false).unwrap();
    logger.info("A").unwrap();
    logger.info("B").unwrap();
    logger.info("C").unwrap();
    logger.shutdown();

    assert_eq!(messages(&path), vec!["A", "B", "C"]);
}

#[test]
fn test_empty_message_is_written() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("app.log");

    let logger = Logger::new();
    logger.init(&path, false).unwrap();
    logger.info("before").unwrap();
    logger.info("").unwrap();
    logger.info("after").unwrap();
    logger.shutdown();

    assert_eq!(messages(&path), vec!["before", "", "after"]);
}

#[test]
fn test_lines_carry_level_and_thread() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("app.log");

    let logger = Arc::new(Logger::new());
    logger.init(&path, false).unwrap();
    logger.warn("main thread").unwrap();
    {
        let logger = Arc::clone(&logger);
        std::thread::spawn(move || logger.error("other thread").unwrap())
            .join()
            .unwrap();
    }
    logger.shutdown();

    let lines = read_lines(&path).unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].level, LogLevel::Warn);
    assert_eq!(lines[1].level, LogLevel::Error);
    assert_ne!(lines[0].thread, lines[1].thread);

    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.lines().next().unwrap().contains("[WARN] main thread"));
}

// ============================================================================
// Flush and Shutdown Tests
// ============================================================================

#[test]
fn test_shutdown_drains_before_close() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("app.log");

    let logger = Logger::new();
    logger.init(&path, false).unwrap();
    for i in 0..50 {
        logger.info(format!("message {i}")).unwrap();
    }
    logger.shutdown();

    let got = messages(&path);
    let expected: Vec<_> = (0..50).map(|i| format!("message {i}")).collect();
    assert_eq!(got, expected);
}

#[test]
fn test_flush_makes_written_lines_visible() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("app.log");

    let logger = Logger::new();
    logger.init(&path, false).unwrap();
    logger.info("eventually visible").unwrap();

    // flush() does not wait for the queue, so poll until the writer catches up.
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
    loop {
        logger.flush();
        if fs::read_to_string(&path).unwrap().contains("eventually visible") {
            break;
        }
        assert!(std::time::Instant::now() < deadline, "line never reached the file");
        std::thread::sleep(std::time::Duration::from_millis(5));
    }

    assert!(logger.is_running());
    logger.shutdown();
}

#[test]
fn test_idle_writer_keeps_file_current() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("app.log");

    let logger = Logger::new();
    logger.init(&path, false).unwrap();
    logger.info("idle").unwrap();

    // No flush() and no shutdown(): the writer flushes once the queue drains.
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
    loop {
        let content = fs::read_to_string(&path).unwrap();
        if content.ends_with("[INFO] idle\n") && logger.stats().lines_written == 1 {
            break;
        }
        assert!(std::time::Instant::now() < deadline, "idle writer never flushed");
        std::thread::sleep(std::time::Duration::from_millis(5));
    }

    assert!(logger.is_running());
    logger.shutdown();
}

#[cfg(target_os = "linux")]
#[test]
fn test_sink_write_failures_are_counted_not_surfaced() {
    init_tracing();
    let logger = Logger::new();
    logger.init("/dev/full", true).unwrap();

    for i in 0..500 {
        logger.info(format!("message {i}")).unwrap();
    }
    logger.shutdown();

    let stats = logger.stats();
    assert!(stats.write_failures > 0);
    assert_eq!(stats.lines_written, 0);
    assert!(!logger.is_running());
    assert_eq!(logger.info("after"), Err(UsageError::NotRunning));
}

#[test]
fn test_drop_shuts_down_running_logger() {
    init_tracing();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("app.log");

    {
        let logger = Logger::new();
        logger.init(&path, false).unwrap();
        for i in 0..10 {
            logger.debug(format!("dropped {i}")).unwrap();
        }
    }

    assert_eq!(messages(&path).len(), 10);
}

#[test]
fn test_concurrent_shutdown_calls() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("app.log");

    let logger = Arc::new(Logger::new());
    logger.init(&path, false).unwrap();
    for i in 0..100 {
        logger.info(format!("line {i}")).unwrap();
    }

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let logger = Arc::clone(&logger);
            std::thread::spawn(move || logger.shutdown())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(!logger.is_running());
    assert_eq!(messages(&path).len(), 100);
}

#[test]
fn test_independent_instances() {
    let temp = TempDir::new().unwrap();
    let a_path = temp.path().join("a.log");
    let b_path = temp.path().join("b.log");

    let a = Logger::new();
    let b = Logger::new();
    a.init(&a_path, false).unwrap();
    b.init(&b_path, false).unwrap();

    a.info("to a").unwrap();
    b.info("to b").unwrap();
    a.shutdown();

    assert_eq!(b.info("b still running"), Ok(()));
    b.shutdown();

    assert_eq!(messages(&a_path), vec!["to a"]);
    assert_eq!(messages(&b_path), vec!["to b", "b still running"]);
}
