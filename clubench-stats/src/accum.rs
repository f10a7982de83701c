//! Incremental statistics accumulator.

/// Running `{count, sum, min, max}` over one measurement series.
///
/// The average is deferred: callers stream an unknown number of samples and
/// call [`fix`](StatAccumulator::fix) once before reporting, separating the
/// "still accumulating" state from the finalized one.
#[derive(Debug, Clone)]
pub struct StatAccumulator {
    /// Diagnostic label of the series, `<alg>_<net>`.
    pub id: String,
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    avg: f64,
    fixed: bool,
}

impl StatAccumulator {
    /// New accumulator seeded with one sample.
    pub fn new(id: impl Into<String>, value: f64) -> Self {
        let mut acc = StatAccumulator {
            id: id.into(),
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            avg: 0.0,
            fixed: false,
        };
        acc.add(value);
        acc
    }

    /// Empty accumulator; at least one [`add`](StatAccumulator::add) is
    /// required before `fix`.
    pub fn empty(id: impl Into<String>) -> Self {
        StatAccumulator {
            id: id.into(),
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            avg: 0.0,
            fixed: false,
        }
    }

    /// Merge one sample, O(1). Invalidates a previously fixed average.
    pub fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.fixed = false;
    }

    /// Finalize the derived average. At least one sample must have been
    /// added; fixing an empty accumulator is a caller defect.
    pub fn fix(&mut self) {
        assert!(self.count > 0, "fix() on the empty accumulator '{}'", self.id);
        self.avg = self.sum / self.count as f64;
        self.fixed = true;
    }

    /// Whether the average has been finalized.
    pub fn fixed(&self) -> bool {
        self.fixed
    }

    /// Number of accumulated samples.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Running sum.
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Smallest sample seen. Requires at least one sample.
    pub fn min(&self) -> f64 {
        debug_assert!(self.count > 0, "min() before any sample in '{}'", self.id);
        self.min
    }

    /// Largest sample seen. Requires at least one sample.
    pub fn max(&self) -> f64 {
        debug_assert!(self.count > 0, "max() before any sample in '{}'", self.id);
        self.max
    }

    /// Finalized average; valid only after [`fix`](StatAccumulator::fix).
    pub fn avg(&self) -> f64 {
        assert!(self.fixed, "avg() before fix() in '{}'", self.id);
        self.avg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_sum_min_max_avg() {
        let mut acc = StatAccumulator::new("alg_net", 0.5);
        acc.add(0.7);
        acc.add(0.6);
        acc.fix();

        assert_eq!(acc.count(), 3);
        assert!((acc.sum() - 1.8).abs() < 1e-12);
        assert!((acc.min() - 0.5).abs() < 1e-12);
        assert!((acc.max() - 0.7).abs() < 1e-12);
        assert!((acc.avg() - 0.6).abs() < 1e-12);
        assert!(acc.fixed());
    }

    #[test]
    fn single_sample_series() {
        let mut acc = StatAccumulator::new("a", 1.2);
        acc.fix();
        assert_eq!(acc.count(), 1);
        assert!((acc.avg() - 1.2).abs() < 1e-12);
        assert_eq!(acc.min(), acc.max());
    }

    #[test]
    fn add_invalidates_fix() {
        let mut acc = StatAccumulator::new("a", 1.0);
        acc.fix();
        assert!(acc.fixed());
        acc.add(3.0);
        assert!(!acc.fixed());
        acc.fix();
        assert!((acc.avg() - 2.0).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "fix() on the empty accumulator")]
    fn fix_of_empty_panics() {
        StatAccumulator::empty("a").fix();
    }

    #[test]
    #[should_panic(expected = "avg() before fix()")]
    fn avg_before_fix_panics() {
        let acc = StatAccumulator::new("a", 1.0);
        let _ = acc.avg();
    }
}
