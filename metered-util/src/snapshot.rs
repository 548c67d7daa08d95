use crate::Quantile;

/// A point-in-time, sorted copy of the values held by a sample.
///
/// Every statistic is computed from the copy, so a snapshot stays internally consistent no
/// matter how the sample it came from changes afterwards.  An empty snapshot reports zero for
/// every statistic.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    values: Vec<i64>,
}

impl Snapshot {
    /// Creates a new [`Snapshot`] from the given values, in any order.
    pub fn new(mut values: Vec<i64>) -> Snapshot {
        values.sort_unstable();
        Snapshot { values }
    }

    /// Number of values in the snapshot.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the snapshot holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The values, sorted ascending.
    pub fn values(&self) -> &[i64] {
        &self.values
    }

    /// Smallest value.
    pub fn min(&self) -> f64 {
        self.values.first().map_or(0.0, |v| *v as f64)
    }

    /// Largest value.
    pub fn max(&self) -> f64 {
        self.values.last().map_or(0.0, |v| *v as f64)
    }

    /// Arithmetic mean.
    pub fn mean(&self) -> f64 {
        self.moments().0
    }

    /// Sample standard deviation.
    ///
    /// Zero when fewer than two values are present.
    pub fn std_dev(&self) -> f64 {
        self.moments().1
    }

    /// Value at the given quantile, linearly interpolated between the two closest ranks.
    ///
    /// The quantile is clamped to `[0.0, 1.0]`.
    pub fn value(&self, quantile: f64) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }

        let quantile = quantile.clamp(0.0, 1.0);
        let pos = quantile * (self.values.len() - 1) as f64;
        let lower = self.values[pos.floor() as usize] as f64;
        let upper = self.values[pos.ceil() as usize] as f64;

        lower + (pos - pos.floor()) * (upper - lower)
    }

    /// Median value.
    pub fn median(&self) -> f64 {
        self.value(0.5)
    }

    /// Values at each of the given quantiles, in order.
    pub fn percentiles(&self, quantiles: &[f64]) -> Vec<f64> {
        quantiles.iter().map(|q| self.value(*q)).collect()
    }

    /// Value at a labeled [`Quantile`].
    pub fn quantile(&self, quantile: &Quantile) -> f64 {
        self.value(quantile.value())
    }

    // Mean and standard deviation in one pass (Welford).
    fn moments(&self) -> (f64, f64) {
        let mut count = 0.0;
        let mut mean = 0.0;
        let mut m2 = 0.0;
        for value in &self.values {
            let value = *value as f64;
            count += 1.0;
            let delta = value - mean;
            mean += delta / count;
            m2 += delta * (value - mean);
        }

        let std_dev = if count > 1.0 { (m2 / (count - 1.0)).sqrt() } else { 0.0 };
        (mean, std_dev)
    }
}

#[cfg(test)]
mod tests {
    use super::Snapshot;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty() {
        let snapshot = Snapshot::default();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.min(), 0.0);
        assert_eq!(snapshot.max(), 0.0);
        assert_eq!(snapshot.mean(), 0.0);
        assert_eq!(snapshot.std_dev(), 0.0);
        assert_eq!(snapshot.median(), 0.0);
        assert_eq!(snapshot.percentiles(&[0.75, 0.99]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_single_value() {
        let snapshot = Snapshot::new(vec![42]);
        assert_eq!(snapshot.min(), 42.0);
        assert_eq!(snapshot.max(), 42.0);
        assert_eq!(snapshot.mean(), 42.0);
        assert_eq!(snapshot.std_dev(), 0.0);
        assert_eq!(snapshot.value(0.0), 42.0);
        assert_eq!(snapshot.value(1.0), 42.0);
    }

    #[test]
    fn test_statistics() {
        let snapshot = Snapshot::new(vec![5, 1, 4, 2, 3]);
        assert_eq!(snapshot.values(), &[1, 2, 3, 4, 5]);
        assert_eq!(snapshot.min(), 1.0);
        assert_eq!(snapshot.max(), 5.0);
        assert_eq!(snapshot.mean(), 3.0);
        assert_relative_eq!(snapshot.std_dev(), 1.5811388300841898);
        assert_eq!(snapshot.median(), 3.0);
    }

    #[test]
    fn test_interpolated_percentiles() {
        let snapshot = Snapshot::new((1..=10).collect());

        // Positions are q * (n - 1), so 0.5 lands halfway between the 5th and 6th values.
        assert_eq!(snapshot.median(), 5.5);
        assert_eq!(snapshot.value(0.75), 7.75);
        assert_relative_eq!(snapshot.value(0.99), 9.91);
        assert_eq!(snapshot.value(0.0), 1.0);
        assert_eq!(snapshot.value(1.0), 10.0);
        assert_eq!(snapshot.value(2.0), 10.0);
    }
}
