use std::fs::OpenOptions;
use std::io::{self, Write as _};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::trace;

/// A destination for rendered reports.
pub trait ReportSink: Send {
    /// Writes one rendered report.
    ///
    /// A report is written in full or not at all as far as the sink can tell; partial writes
    /// surface as errors.
    fn write_report(&mut self, report: &[u8]) -> io::Result<()>;
}

/// Appends reports to a file.
///
/// The file is opened, created if needed, for every report, so it can be rotated or removed
/// between reports.
#[derive(Clone, Debug)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    /// Creates a new `FileSink` appending to `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        FileSink { path: path.as_ref().to_path_buf() }
    }

    /// Path reports are written to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportSink for FileSink {
    fn write_report(&mut self, report: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(report)?;
        file.flush()
    }
}

/// Sends reports over a new TCP connection each time.
///
/// No acknowledgement is expected: the report is written, flushed, and the connection closed.
#[derive(Clone, Debug)]
pub struct TcpSink {
    addresses: Vec<SocketAddr>,
    connect_timeout: Duration,
    write_timeout: Duration,
}

impl TcpSink {
    /// Creates a new `TcpSink`.
    ///
    /// Each address is tried in order until a connection succeeds.
    pub fn new(addresses: Vec<SocketAddr>, connect_timeout: Duration, write_timeout: Duration) -> Self {
        TcpSink { addresses, connect_timeout, write_timeout }
    }

    fn connect(&self) -> io::Result<TcpStream> {
        let mut last_err = None;
        for address in &self.addresses {
            match TcpStream::connect_timeout(address, self.connect_timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    trace!(%address, error = %e, "failed to connect to report sink");
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "no remote addresses to connect to")
        }))
    }
}

impl ReportSink for TcpSink {
    fn write_report(&mut self, report: &[u8]) -> io::Result<()> {
        let mut stream = self.connect()?;
        stream.set_write_timeout(Some(self.write_timeout))?;
        stream.write_all(report)?;
        stream.flush()?;

        // The peer may already have gone away, which is fine once everything has been written.
        let _ = stream.shutdown(Shutdown::Both);
        Ok(())
    }
}
