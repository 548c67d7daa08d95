use std::fmt;
use std::io;

use thiserror::Error;

/// Lifecycle state of a [`Reporter`](crate::Reporter).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReporterState {
    /// Created, not yet started.
    Idle,
    /// Reporting on a schedule.
    Running,
    /// Stopped; a stopped reporter cannot be started again.
    Stopped,
}

impl fmt::Display for ReporterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReporterState::Idle => "idle",
            ReporterState::Running => "running",
            ReporterState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// A lifecycle notification from a [`Reporter`](crate::Reporter).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReporterEvent {
    /// The reporter started its schedule.
    Started,
    /// The reporter stopped, and will not report again.
    Stopped,
}

/// Errors that could occur while reporting.
#[derive(Debug, Error)]
pub enum ReporterError {
    /// Writing to the sink failed.
    #[error("failed to write report: {0}")]
    Io(#[from] io::Error),

    /// Rendering the report failed.
    #[error("failed to render report: {0}")]
    Format(#[from] serde_json::Error),

    /// The reporter can only be started while idle.
    #[error("reporter cannot be started while {0}")]
    InvalidState(ReporterState),

    /// The reporting period must be longer than zero.
    #[error("reporting period must be longer than zero")]
    InvalidPeriod,

    /// The scheduling thread could not be spawned.
    #[error("failed to spawn reporter thread: {0}")]
    Spawn(#[source] io::Error),
}

/// Errors that could occur while building a reporter.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Failed to parse the remote address.
    #[error("invalid remote address: {reason}")]
    InvalidRemoteAddress {
        /// Details about the parsing failure.
        reason: String,
    },
}
