//! Line formatting.
//!
//! A [`LogLine`] is built once, on the thread that calls `log`, so the
//! timestamp and [`ThreadTag`] describe the call rather than the later write.

use std::cell::Cell;
use std::fmt::{self, Write as FmtWrite};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

use crate::error::LineParseError;
use crate::level::LogLevel;

/// `strftime` pattern of the sink timestamp (local time, second resolution).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Length of a formatted timestamp, e.g. `2026-01-21 14:30:45`.
const TIMESTAMP_LEN: usize = 19;

static NEXT_THREAD_TAG: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_TAG: Cell<u64> = const { Cell::new(0) };
}

/// Opaque identity of a producer thread.
///
/// Tags are small integers handed out in the order threads first log, and
/// stay fixed for the life of the thread. Rendered as `T<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadTag(u64);

impl ThreadTag {
    /// Tag of the calling thread, assigning one on first use.
    pub fn current() -> Self {
        THREAD_TAG.with(|tag| {
            if tag.get() == 0 {
                tag.set(NEXT_THREAD_TAG.fetch_add(1, Ordering::Relaxed));
            }
            ThreadTag(tag.get())
        })
    }

    /// Numeric value of the tag.
    pub fn get(self) -> u64 {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn from_raw(raw: u64) -> Self {
        ThreadTag(raw)
    }
}

impl fmt::Display for ThreadTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// One formatted, newline-terminated sink line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine(String);

impl LogLine {
    /// Format `message` for the calling thread at the current local time.
    pub fn capture(level: LogLevel, message: &str) -> Self {
        format_line(level, message, ThreadTag::current(), &Local::now())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for LogLine {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build `"<timestamp> [T<id>] [<LEVEL>] <message>\n"`.
///
/// The message is copied verbatim except for line feeds and carriage returns,
/// which are written as a backslash followed by `n` or `r` so every record
/// stays on one line.
/// An empty message yields a valid line.
pub fn format_line<Tz>(
    level: LogLevel,
    message: &str,
    thread: ThreadTag,
    time: &DateTime<Tz>,
) -> LogLine
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut line = String::with_capacity(TIMESTAMP_LEN + message.len() + 24);
    // Writing into a String cannot fail.
    let _ = write!(
        line,
        "{} [{}] [{}] ",
        time.format(TIMESTAMP_FORMAT),
        thread,
        level
    );
    push_single_line(&mut line, message);
    line.push('\n');
    LogLine(line)
}

fn push_single_line(line: &mut String, message: &str) {
    if !message.contains(['\n', '\r']) {
        line.push_str(message);
        return;
    }
    for c in message.chars() {
        match c {
            '\n' => line.push_str("\\n"),
            '\r' => line.push_str("\\r"),
            c => line.push(c),
        }
    }
}

/// A sink line split back into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub timestamp: NaiveDateTime,
    pub thread: u64,
    pub level: LogLevel,
    pub message: String,
}

impl ParsedLine {
    /// Parse one sink line, with or without its trailing newline.
    pub fn parse(line: &str) -> Result<Self, LineParseError> {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let timestamp_err = || LineParseError::Timestamp(line.to_string());
        let thread_err = || LineParseError::Thread(line.to_string());
        let level_err = || LineParseError::Level(line.to_string());

        let stamp = line.get(..TIMESTAMP_LEN).ok_or_else(timestamp_err)?;
        let timestamp =
            NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).map_err(|_| timestamp_err())?;

        let rest = line[TIMESTAMP_LEN..]
            .strip_prefix(" [T")
            .ok_or_else(thread_err)?;
        let (id, rest) = rest.split_once("] [").ok_or_else(thread_err)?;
        let thread = id.parse::<u64>().map_err(|_| thread_err())?;

        let (level, message) = rest.split_once("] ").ok_or_else(level_err)?;
        let level = LogLevel::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == level)
            .ok_or_else(level_err)?;

        Ok(Self {
            timestamp,
            thread,
            level,
            message: message.to_string(),
        })
    }
}
