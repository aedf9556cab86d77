//! Descriptive statistics over a sorted copy of the input values.

use crate::error::{ClassifyError, ClassifyResult};

/// Finite values sorted in ascending order.
#[derive(Debug, Clone)]
pub struct SortedValues {
    values: Vec<f64>,
}

impl SortedValues {
    /// Sort a copy of `values`, rejecting empty input and NaN/infinite values.
    pub fn new(values: &[f64]) -> ClassifyResult<Self> {
        if values.is_empty() {
            return Err(ClassifyError::EmptyInput);
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(ClassifyError::NonFiniteValue(*bad));
        }

        let mut values = values.to_vec();
        values.sort_by(f64::total_cmp);
        Ok(Self { values })
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn min(&self) -> f64 {
        self.values[0]
    }

    pub fn max(&self) -> f64 {
        self.values[self.values.len() - 1]
    }

    pub fn mean(&self) -> f64 {
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    /// Population standard deviation.
    pub fn std_dev(&self) -> f64 {
        let mean = self.mean();
        let var = self
            .values
            .iter()
            .map(|v| (v - mean) * (v - mean))
            .sum::<f64>()
            / self.values.len() as f64;
        var.sqrt()
    }

    /// Number of distinct values.
    pub fn unique_count(&self) -> usize {
        let mut count = 1;
        for pair in self.values.windows(2) {
            if pair[1] != pair[0] {
                count += 1;
            }
        }
        count
    }

    /// Distinct values in ascending order.
    pub fn unique(&self) -> Vec<f64> {
        let mut out = self.values.clone();
        out.dedup();
        out
    }

    /// Percentile with linear interpolation between closest ranks.
    ///
    /// `p` is on the 0-100 scale.
    pub fn percentile(&self, p: f64) -> ClassifyResult<f64> {
        if !(0.0..=100.0).contains(&p) {
            return Err(ClassifyError::PercentileOutOfRange(p));
        }

        let n = self.values.len();
        if n == 1 {
            return Ok(self.values[0]);
        }

        let h = (n - 1) as f64 * p / 100.0;
        let lo = h.floor() as usize;
        let hi = h.ceil() as usize;
        let lower = self.values[lo];
        let upper = self.values[hi];
        Ok(lower + (h - lo as f64) * (upper - lower))
    }
}
