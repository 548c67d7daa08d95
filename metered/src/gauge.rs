use std::fmt;

use serde::Serialize;

/// A scalar value produced by a gauge.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GaugeValue {
    /// A signed integer.
    Integer(i64),
    /// An unsigned integer.
    Unsigned(u64),
    /// A floating-point number.
    Float(f64),
    /// A boolean.
    Bool(bool),
    /// Free-form text.
    Text(String),
}

impl fmt::Display for GaugeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GaugeValue::Integer(v) => write!(f, "{}", v),
            GaugeValue::Unsigned(v) => write!(f, "{}", v),
            GaugeValue::Float(v) => write!(f, "{}", v),
            GaugeValue::Bool(v) => write!(f, "{}", v),
            GaugeValue::Text(v) => f.write_str(v),
        }
    }
}

macro_rules! impl_from {
    ($variant:ident, $($ty:ty => $conv:expr),+) => {
        $(
            impl From<$ty> for GaugeValue {
                fn from(value: $ty) -> Self {
                    GaugeValue::$variant($conv(value))
                }
            }
        )+
    };
}

impl_from!(Integer, i64 => |v| v, i32 => i64::from, i16 => i64::from, i8 => i64::from);
impl_from!(Unsigned, u64 => |v| v, u32 => u64::from, u16 => u64::from, u8 => u64::from, usize => |v| v as u64);
impl_from!(Float, f64 => |v| v, f32 => f64::from);
impl_from!(Bool, bool => |v| v);
impl_from!(Text, String => |v| v, &str => ToString::to_string);

type Callback = Box<dyn Fn() -> GaugeValue + Send + Sync>;

/// A metric whose value is produced on demand by a callback.
///
/// The callback is invoked on every read, so it should be cheap and tolerate being called from
/// any thread.
pub struct Gauge {
    callback: Callback,
}

impl Gauge {
    /// Creates a new `Gauge` backed by `f`.
    pub fn new<F, V>(f: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
        V: Into<GaugeValue>,
    {
        Gauge { callback: Box::new(move || f().into()) }
    }

    /// Reads the current value.
    pub fn value(&self) -> GaugeValue {
        (self.callback)()
    }
}

impl fmt::Debug for Gauge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gauge").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::{Gauge, GaugeValue};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_reads_invoke_callback() {
        let depth = Arc::new(AtomicUsize::new(0));
        let gauge = {
            let depth = Arc::clone(&depth);
            Gauge::new(move || depth.load(Ordering::Relaxed))
        };

        assert_eq!(gauge.value(), GaugeValue::Unsigned(0));
        depth.store(2, Ordering::Relaxed);
        assert_eq!(gauge.value(), GaugeValue::Unsigned(2));
    }

    #[test]
    fn test_value_serialization() {
        let values = vec![
            GaugeValue::from(-3i32),
            GaugeValue::from(7u8),
            GaugeValue::from(0.5),
            GaugeValue::from(true),
            GaugeValue::from("up"),
        ];
        assert_eq!(serde_json::to_string(&values).unwrap(), r#"[-3,7,0.5,true,"up"]"#);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(GaugeValue::from(42i64).to_string(), "42");
        assert_eq!(GaugeValue::from(1.25f64).to_string(), "1.25");
        assert_eq!(GaugeValue::from("idle").to_string(), "idle");
    }
}
