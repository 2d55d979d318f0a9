//! Numeric helpers for the accuracy analysis.

use serde::{Deserialize, Serialize};

/// Single-pass mean and variance (Welford).
///
/// # Examples
///
/// ```rust
/// use esolens::stats::RunningStats;
///
/// let stats: RunningStats = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0].into_iter().collect();
///
/// assert_eq!(stats.count(), 8);
/// assert!((stats.mean() - 5.0).abs() < 1e-12);
/// assert!((stats.sample_std_dev() - 2.138).abs() < 1e-3);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStats {
    count: usize,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Zero when empty.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample standard deviation (n − 1). Zero below two values.
    pub fn sample_std_dev(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / (self.count - 1) as f64).sqrt()
        }
    }

    /// `std_dev / mean`, zero when the mean is not positive.
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.mean > 0.0 {
            self.sample_std_dev() / self.mean
        } else {
            0.0
        }
    }

    pub fn min(&self) -> Option<f64> {
        (self.count > 0).then_some(self.min)
    }

    pub fn max(&self) -> Option<f64> {
        (self.count > 0).then_some(self.max)
    }

    /// Min, max and mean, falling back to `empty` for all three.
    pub fn range_or(&self, empty: f64) -> ValueRange {
        if self.count == 0 {
            ValueRange {
                min: empty,
                max: empty,
                mean: empty,
            }
        } else {
            ValueRange {
                min: self.min,
                max: self.max,
                mean: self.mean,
            }
        }
    }
}

impl Extend<f64> for RunningStats {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

impl FromIterator<f64> for RunningStats {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut stats = Self::new();
        stats.extend(iter);
        stats
    }
}

/// Observed range of a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Median of `values`; the mean of the two middle values for even lengths.
///
/// Returns `None` for an empty slice.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// `min / max × 100`; 100 when both are zero, 0 when only one is.
pub fn accuracy_between(predicted: f64, actual: f64) -> f64 {
    if predicted == 0.0 && actual == 0.0 {
        return 100.0;
    }
    if predicted == 0.0 || actual == 0.0 {
        return 0.0;
    }
    predicted.min(actual) / predicted.max(actual) * 100.0
}

/// `(a − b) / b × 100`, or `None` when `b` is zero.
pub fn percent_difference(a: f64, b: f64) -> Option<f64> {
    (b != 0.0).then(|| (a - b) / b * 100.0)
}
