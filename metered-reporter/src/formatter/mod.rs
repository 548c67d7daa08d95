use metered::NamedSnapshot;

use crate::ReporterError;

mod json;
pub use self::json::JsonFormatter;

mod line;
pub use self::line::LineProtocolFormatter;

mod text;
pub use self::text::TextFormatter;

/// Renders registry snapshots into a report.
///
/// Snapshots are handed over ordered by name, and a formatter is expected to keep that order.
pub trait ReportFormatter: Send + Sync {
    /// Renders `snapshots` into a single report.
    fn format(&self, snapshots: &[NamedSnapshot]) -> Result<String, ReporterError>;
}

impl<F> ReportFormatter for Box<F>
where
    F: ReportFormatter + ?Sized,
{
    fn format(&self, snapshots: &[NamedSnapshot]) -> Result<String, ReporterError> {
        (**self).format(snapshots)
    }
}
