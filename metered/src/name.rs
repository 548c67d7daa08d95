use std::fmt;

use serde::{Serialize, Serializer};

/// The name of a metric.
///
/// A name is made of a group, usually the type or module that owns the metric, and the metric's
/// own name within that group.  Names are ordered by group first and then by name, which is the
/// order snapshots are reported in.
///
/// Externally, a name is rendered as `group.name`, or simply `name` when the group is empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetricName {
    group: String,
    name: String,
}

impl MetricName {
    /// Creates a `MetricName` from a group and a name.
    pub fn new<G, N>(group: G, name: N) -> Self
    where
        G: Into<String>,
        N: Into<String>,
    {
        MetricName { group: group.into(), name: name.into() }
    }

    /// Creates a `MetricName` with no group.
    pub fn from_name<N>(name: N) -> Self
    where
        N: Into<String>,
    {
        MetricName { group: String::new(), name: name.into() }
    }

    /// Creates a `MetricName` grouped under the fully-qualified path of the type `T`.
    pub fn of<T: ?Sized>(name: impl Into<String>) -> Self {
        MetricName { group: std::any::type_name::<T>().to_string(), name: name.into() }
    }

    /// Group of this name.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Name within the group.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}.{}", self.group, self.name)
        }
    }
}

impl From<&str> for MetricName {
    fn from(name: &str) -> Self {
        MetricName::from_name(name)
    }
}

impl From<String> for MetricName {
    fn from(name: String) -> Self {
        MetricName::from_name(name)
    }
}

impl From<(&str, &str)> for MetricName {
    fn from((group, name): (&str, &str)) -> Self {
        MetricName::new(group, name)
    }
}

impl Serialize for MetricName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}
