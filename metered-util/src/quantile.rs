/// The quantiles reported for every histogram and timer: median, 75th, 95th, 98th, 99th and
/// 99.9th percentiles.
pub const DEFAULT_QUANTILES: [f64; 6] = [0.5, 0.75, 0.95, 0.98, 0.99, 0.999];

/// A quantile paired with the label it is reported under.
///
/// Labels use the short percentile form: `0.99` is `p99` and `0.999` is `p999`.  The quantiles
/// `0.0`, `0.5` and `1.0` are labelled `min`, `median` and `max`.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantile {
    value: f64,
    label: String,
}

impl Quantile {
    /// Creates a new [`Quantile`], clamping `quantile` to `[0.0, 1.0]`.
    pub fn new(quantile: f64) -> Quantile {
        let value = quantile.clamp(0.0, 1.0);
        let label = if value == 0.0 {
            "min".to_string()
        } else if value == 0.5 {
            "median".to_string()
        } else if value == 1.0 {
            "max".to_string()
        } else {
            format!("p{}", value * 100.0).replace('.', "")
        };

        Quantile { value, label }
    }

    /// Label to report the quantile under.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The quantile, between `0.0` and `1.0`.
    pub fn value(&self) -> f64 {
        self.value
    }
}

/// Labels each of `quantiles`.
pub fn parse_quantiles(quantiles: &[f64]) -> Vec<Quantile> {
    quantiles.iter().copied().map(Quantile::new).collect()
}

#[cfg(test)]
mod tests {
    use super::{parse_quantiles, Quantile, DEFAULT_QUANTILES};

    #[test]
    fn test_quantiles() {
        let min = Quantile::new(0.0);
        assert_eq!(min.value(), 0.0);
        assert_eq!(min.label(), "min");

        let median = Quantile::new(0.5);
        assert_eq!(median.label(), "median");

        let max = Quantile::new(1.0);
        assert_eq!(max.value(), 1.0);
        assert_eq!(max.label(), "max");

        let p75 = Quantile::new(0.75);
        assert_eq!(p75.label(), "p75");

        let p999 = Quantile::new(0.999);
        assert_eq!(p999.value(), 0.999);
        assert_eq!(p999.label(), "p999");

        let under = Quantile::new(-1.0);
        assert_eq!(under.value(), 0.0);
        assert_eq!(under.label(), "min");

        let over = Quantile::new(1.2);
        assert_eq!(over.value(), 1.0);
        assert_eq!(over.label(), "max");
    }

    #[test]
    fn test_default_quantile_labels() {
        let labels = parse_quantiles(&DEFAULT_QUANTILES)
            .iter()
            .map(|q| q.label().to_string())
            .collect::<Vec<_>>();
        assert_eq!(labels, vec!["median", "p75", "p95", "p98", "p99", "p999"]);
    }
}
