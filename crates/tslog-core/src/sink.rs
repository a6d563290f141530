//! File sink for formatted log lines.
//!
//! The sink is owned by the logger and only ever touched under its mutex, so
//! the writer thread, `flush` and `shutdown` never race on the handle.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::format::{LogLine, ParsedLine};

/// Buffered writer over the log file.
#[derive(Debug)]
pub struct FileSink {
    /// Path the sink was opened with
    path: PathBuf,

    /// Buffered file writer
    writer: BufWriter<File>,
}

impl FileSink {
    /// Open (creating if needed) the log file.
    ///
    /// With `append` existing content is kept; otherwise the file is truncated.
    pub fn open(path: impl AsRef<Path>, append: bool) -> io::Result<Self> {
        let path = path.as_ref();

        let mut options = OpenOptions::new();
        options.create(true);
        if append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }
        let file = options.open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write one line verbatim.
    pub fn write_line(&mut self, line: &LogLine) -> io::Result<()> {
        self.writer.write_all(line.as_str().as_bytes())
    }

    /// Push buffered bytes to the OS.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Flush and release the file handle.
    pub fn close(mut self) -> io::Result<()> {
        self.writer.flush()?;
        let file = self.writer.into_inner().map_err(|e| e.into_error())?;
        drop(file);
        Ok(())
    }
}

/// Read and parse every line of a sink file, in file order.
///
/// Blank lines are skipped; any malformed line is reported as
/// [`io::ErrorKind::InvalidData`].
pub fn read_lines(path: impl AsRef<Path>) -> io::Result<Vec<ParsedLine>> {
    let content = fs::read_to_string(path.as_ref())?;

    content
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| {
            ParsedLine::parse(line).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
        })
        .collect()
}
