use metered::{snapshot, NamedSnapshot};

use super::ReportFormatter;
use crate::ReporterError;

/// Renders reports as the same JSON array served by the HTTP listener.
///
/// Every report is terminated by a newline, so consecutive reports appended to a file can be read
/// back one line at a time when not pretty-printed.
#[derive(Clone, Debug, Default)]
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new `JsonFormatter` producing compact output.
    pub fn new() -> Self {
        JsonFormatter { pretty: false }
    }

    /// Creates a new `JsonFormatter` producing indented output.
    pub fn pretty() -> Self {
        JsonFormatter { pretty: true }
    }
}

impl ReportFormatter for JsonFormatter {
    fn format(&self, snapshots: &[NamedSnapshot]) -> Result<String, ReporterError> {
        let mut output = snapshot::to_json(snapshots, self.pretty)?;
        output.push('\n');
        Ok(output)
    }
}
