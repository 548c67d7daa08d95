//! An embedded HTTP listener for `metered`.
//!
//! [`MetricsListener`] serves the current state of a [`Metrics`] registry over HTTP, from a
//! dedicated background thread:
//!
//! | Method | Path | Response |
//! |---|---|---|
//! | `GET` | `/` | an HTML index if the client accepts `text/html`, otherwise the JSON snapshot |
//! | `GET` | `/metrics` | the JSON snapshot, as served by [`Metrics::to_json`] |
//! | `GET` | `/ping` | `pong` |
//!
//! Anything else is answered with a `404`.  Every request reads its own snapshot of the registry.
//!
//! ```no_run
//! use metered::Metrics;
//! use metered_exporter_http::MetricsListener;
//!
//! # fn main() -> Result<(), metered_exporter_http::ListenerError> {
//! let metrics = Metrics::new();
//! let mut listener = MetricsListener::new(metrics.clone());
//! let address = listener.start(9090)?;
//! println!("serving metrics on http://{}", address);
//!
//! // ...
//!
//! listener.stop();
//! # Ok(())
//! # }
//! ```
#![deny(missing_docs)]
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::thread::{self, JoinHandle};

use metered::Metrics;
use thiserror::Error;
use tokio::{runtime, sync::oneshot};
use tracing::{debug, error};

mod http_listener;
use self::http_listener::HttpListeningExporter;

const DEFAULT_THREAD_NAME: &str = "metered-http-listener";

/// Errors that could occur while starting a [`MetricsListener`].
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Binding to the listen address did not succeed.
    #[error("failed to bind to listen address {address}: {source}")]
    Bind {
        /// Address that could not be bound.
        address: SocketAddr,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Creating the serving runtime or thread did not succeed.
    #[error("failed to spawn Tokio runtime for listener: {0}")]
    Runtime(#[source] io::Error),

    /// The listener is already running.
    #[error("listener is already running on {0}")]
    AlreadyStarted(SocketAddr),
}

/// Builder for [`MetricsListener`].
#[derive(Clone, Debug)]
pub struct ListenerBuilder {
    listen_address: IpAddr,
    thread_name: String,
}

impl ListenerBuilder {
    /// Creates a new [`ListenerBuilder`] with default values.
    pub fn new() -> Self {
        ListenerBuilder {
            listen_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }

    /// Sets the address the listener binds to.
    ///
    /// The port is chosen when the listener is started.  Defaults to `0.0.0.0`, which listens on
    /// every interface.
    #[must_use]
    pub fn with_listen_address<A>(mut self, address: A) -> Self
    where
        A: Into<IpAddr>,
    {
        self.listen_address = address.into();
        self
    }

    /// Sets the name of the thread that serves requests.
    ///
    /// Defaults to `metered-http-listener`.
    #[must_use]
    pub fn with_thread_name<N>(mut self, name: N) -> Self
    where
        N: Into<String>,
    {
        self.thread_name = name.into();
        self
    }

    /// Builds a stopped [`MetricsListener`] serving `metrics`.
    pub fn build(self, metrics: Metrics) -> MetricsListener {
        MetricsListener {
            metrics,
            listen_address: self.listen_address,
            thread_name: self.thread_name,
            running: None,
        }
    }
}

impl Default for ListenerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct Running {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Serves snapshots of a [`Metrics`] registry over HTTP.
///
/// A listener does nothing until [`start`](MetricsListener::start) is called, and serves until it
/// is stopped or dropped.
pub struct MetricsListener {
    metrics: Metrics,
    listen_address: IpAddr,
    thread_name: String,
    running: Option<Running>,
}

impl MetricsListener {
    /// Creates a stopped listener serving `metrics` with the default configuration.
    pub fn new(metrics: Metrics) -> Self {
        ListenerBuilder::new().build(metrics)
    }

    /// Creates a [`ListenerBuilder`].
    pub fn builder() -> ListenerBuilder {
        ListenerBuilder::new()
    }

    /// Starts serving on `port`, returning the bound address.
    ///
    /// A port of `0` binds to any available port; the chosen one is in the returned address.
    ///
    /// ## Errors
    ///
    /// Fails if the listener is already running, if the address cannot be bound, or if the
    /// serving thread cannot be started.
    pub fn start(&mut self, port: u16) -> Result<SocketAddr, ListenerError> {
        if let Some(running) = &self.running {
            return Err(ListenerError::AlreadyStarted(running.local_addr));
        }

        let address = SocketAddr::new(self.listen_address, port);
        let listener = std::net::TcpListener::bind(address)
            .and_then(|listener| {
                listener.set_nonblocking(true)?;
                Ok(listener)
            })
            .map_err(|source| ListenerError::Bind { address, source })?;
        let local_addr =
            listener.local_addr().map_err(|source| ListenerError::Bind { address, source })?;

        let runtime = runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ListenerError::Runtime)?;
        let listener = register_listener(&runtime, listener)
            .map_err(|source| ListenerError::Bind { address, source })?;

        let (shutdown, shutdown_rx) = oneshot::channel();
        let exporter = HttpListeningExporter::new(self.metrics.clone());
        let handle = thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || runtime.block_on(exporter.serve(listener, shutdown_rx)))
            .map_err(ListenerError::Runtime)?;

        debug!(address = %local_addr, "metrics listener started");
        self.running = Some(Running { local_addr, shutdown, handle });
        Ok(local_addr)
    }

    /// Address the listener is bound to, if it is running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|running| running.local_addr)
    }

    /// Returns `true` if the listener is serving.
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Stops serving and waits for the serving thread to exit.
    ///
    /// Stopping a listener that is not running does nothing.
    pub fn stop(&mut self) {
        if let Some(Running { local_addr, shutdown, handle }) = self.running.take() {
            let _ = shutdown.send(());
            if handle.join().is_err() {
                error!(address = %local_addr, "metrics listener thread panicked");
            }
            debug!(address = %local_addr, "metrics listener stopped");
        }
    }
}

/// Hands a bound socket over to `runtime`'s reactor.
fn register_listener(
    runtime: &runtime::Runtime,
    listener: std::net::TcpListener,
) -> io::Result<tokio::net::TcpListener> {
    let _guard = runtime.enter();
    tokio::net::TcpListener::from_std(listener)
}

impl Drop for MetricsListener {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::{register_listener, ListenerError, MetricsListener};
    use metered::Metrics;
    use std::io::{Read, Write};
    use std::net::{Ipv4Addr, TcpStream};
    use std::time::Duration;
    use tokio::runtime;

    #[test]
    fn test_start_twice_fails() {
        let mut listener =
            MetricsListener::builder().with_listen_address(Ipv4Addr::LOCALHOST).build(Metrics::new());
        let address = listener.start(0).expect("listener should start");
        assert!(address.ip().is_loopback());
        assert_ne!(address.port(), 0);
        assert_eq!(listener.local_addr(), Some(address));

        match listener.start(0) {
            Err(ListenerError::AlreadyStarted(running)) => assert_eq!(running, address),
            other => panic!("expected AlreadyStarted, got {:?}", other),
        }

        listener.stop();
        assert!(!listener.is_running());
        assert_eq!(listener.local_addr(), None);
    }

    #[test]
    fn test_bind_conflict() {
        let mut first =
            MetricsListener::builder().with_listen_address(Ipv4Addr::LOCALHOST).build(Metrics::new());
        let address = first.start(0).expect("listener should start");

        let mut second =
            MetricsListener::builder().with_listen_address(Ipv4Addr::LOCALHOST).build(Metrics::new());
        match second.start(address.port()) {
            Err(ListenerError::Bind { address: failed, .. }) => assert_eq!(failed, address),
            other => panic!("expected a bind error, got {:?}", other),
        }
        assert!(!second.is_running());
    }

    #[test]
    fn test_restart_after_stop() {
        let mut listener =
            MetricsListener::builder().with_listen_address(Ipv4Addr::LOCALHOST).build(Metrics::new());
        listener.start(0).expect("listener should start");
        listener.stop();
        listener.start(0).expect("listener should restart");
        assert!(listener.is_running());
    }

    #[test]
    fn test_register_listener_keeps_address() {
        let runtime = runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let std_listener = std::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        std_listener.set_nonblocking(true).unwrap();
        let address = std_listener.local_addr().unwrap();

        let listener = register_listener(&runtime, std_listener).expect("listener should register");
        assert_eq!(listener.local_addr().unwrap(), address);
    }

    #[test]
    fn test_serves_as_soon_as_started() {
        let mut listener =
            MetricsListener::builder().with_listen_address(Ipv4Addr::LOCALHOST).build(Metrics::new());
        let address = listener.start(0).expect("listener should start");

        let mut stream = TcpStream::connect(address).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        stream
            .write_all(b"GET /ping HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        assert!(response.starts_with("HTTP/1.1 200"), "unexpected response: {}", response);
        assert!(response.ends_with("pong"));
    }
}
