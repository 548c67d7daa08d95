use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use metered::Metrics;

use crate::{BuildError, LineProtocolFormatter, Reporter, TcpSink};

const DEFAULT_REMOTE_ADDRESS: ([u8; 4], u16) = ([127, 0, 0, 1], 2003);
const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(1);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Builder for a [`Reporter`] that sends the line protocol to a Graphite server over TCP.
#[derive(Clone, Debug)]
pub struct GraphiteBuilder {
    remote_addrs: Vec<SocketAddr>,
    prefix: String,
    write_timeout: Duration,
    connect_timeout: Duration,
}

impl GraphiteBuilder {
    /// Creates a new [`GraphiteBuilder`] with default values.
    pub fn new() -> Self {
        GraphiteBuilder {
            remote_addrs: vec![SocketAddr::from(DEFAULT_REMOTE_ADDRESS)],
            prefix: String::new(),
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Set the remote address to send reports to.
    ///
    /// The address is given as `host:port`, and the host may be a name that resolves to several
    /// addresses, in which case they are tried in order on every report.
    ///
    /// Defaults to `127.0.0.1:2003`.
    ///
    /// ## Errors
    ///
    /// If the given address cannot be resolved, an error will be returned.
    pub fn with_remote_address<A>(mut self, addr: A) -> Result<Self, BuildError>
    where
        A: AsRef<str>,
    {
        let addrs = addr
            .as_ref()
            .to_socket_addrs()
            .map_err(|e| BuildError::InvalidRemoteAddress { reason: e.to_string() })?
            .collect::<Vec<_>>();
        if addrs.is_empty() {
            return Err(BuildError::InvalidRemoteAddress {
                reason: format!("'{}' did not resolve to any address", addr.as_ref()),
            });
        }

        self.remote_addrs = addrs;
        Ok(self)
    }

    /// Set the prefix prepended to every metric name.
    ///
    /// A `.` separator is added after the prefix if it does not already end with one.
    ///
    /// Defaults to no prefix.
    #[must_use]
    pub fn with_prefix<P>(mut self, prefix: P) -> Self
    where
        P: Into<String>,
    {
        self.prefix = prefix.into();
        self
    }

    /// Set the write timeout for sending reports.
    ///
    /// When the write timeout is reached, the report being sent is dropped without retrying.
    ///
    /// Defaults to 1 second.
    #[must_use]
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set the connect timeout for sending reports.
    ///
    /// Defaults to 1 second.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Builds an idle [`Reporter`] for `metrics`.
    pub fn build(self, metrics: Metrics) -> Reporter {
        let formatter = LineProtocolFormatter::with_prefix(self.prefix);
        let sink = TcpSink::new(self.remote_addrs, self.connect_timeout, self.write_timeout);
        Reporter::new(metrics, formatter, sink)
    }
}

impl Default for GraphiteBuilder {
    fn default() -> Self {
        Self::new()
    }
}
