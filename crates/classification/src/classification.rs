//! Classification results and the `classify` entry point.

use serde::Serialize;
use tracing::debug;

use crate::breaks;
use crate::error::{ClassifyError, ClassifyResult};
use crate::method::Method;
use crate::stats::SortedValues;

/// One class of a classification: its bounds and how many values it holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassBreak {
    /// Zero-based class index.
    pub index: usize,
    /// Lower bound (inclusive for the first class, exclusive otherwise).
    pub low: f64,
    /// Upper bound (inclusive).
    pub high: f64,
    /// Number of values assigned to this class.
    pub count: usize,
}

impl ClassBreak {
    pub fn range(&self) -> [f64; 2] {
        [self.low, self.high]
    }
}

/// The outcome of classifying a sequence of values.
#[derive(Debug, Clone)]
pub struct Classification {
    method: Method,
    bins: Vec<f64>,
    assignments: Vec<usize>,
    counts: Vec<usize>,
    min: f64,
}

impl Classification {
    /// Assign `values` to the classes bounded above by `bins`.
    ///
    /// When the data maximum lies above the last bound, the maximum becomes
    /// an extra bound so that every value lands in a class.
    fn from_bins(
        method: Method,
        values: &[f64],
        sorted: &SortedValues,
        mut bins: Vec<f64>,
    ) -> Self {
        let max = sorted.max();
        if bins.last().map_or(true, |last| max > *last) {
            bins.push(max);
        }

        let mut counts = vec![0usize; bins.len()];
        let assignments: Vec<usize> = values
            .iter()
            .map(|v| {
                let class = bins.partition_point(|b| b < v).min(bins.len() - 1);
                counts[class] += 1;
                class
            })
            .collect();

        Self {
            method,
            bins,
            assignments,
            counts,
            min: sorted.min(),
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Class upper bounds in ascending order.
    pub fn bins(&self) -> &[f64] {
        &self.bins
    }

    /// Number of classes.
    pub fn k(&self) -> usize {
        self.bins.len()
    }

    /// Class index of each input value, in input order.
    pub fn assignments(&self) -> &[usize] {
        &self.assignments
    }

    /// Member count of each class.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Per-class bounds and counts in class order.
    pub fn classes(&self) -> Vec<ClassBreak> {
        self.bins
            .iter()
            .enumerate()
            .map(|(index, high)| {
                let low = if index == 0 {
                    self.min.min(*high)
                } else {
                    self.bins[index - 1]
                };
                ClassBreak {
                    index,
                    low,
                    high: *high,
                    count: self.counts[index],
                }
            })
            .collect()
    }

    /// Human-readable legend labels, e.g. `[1.00, 3.67]` then `(3.67, 6.33]`.
    ///
    /// Numbers are right-aligned to the widest bound, so `[  1.00,  10.00]`
    /// lines up with `( 10.00, 150.00]`.
    pub fn legend_labels(&self) -> Vec<String> {
        let classes = self.classes();
        let formatted: Vec<(String, String)> = classes
            .iter()
            .map(|c| (format!("{:.2}", c.low), format!("{:.2}", c.high)))
            .collect();
        let width = formatted
            .iter()
            .flat_map(|(lo, hi)| [lo.len(), hi.len()])
            .max()
            .unwrap_or(0);

        formatted
            .iter()
            .enumerate()
            .map(|(i, (lo, hi))| {
                let open = if i == 0 { '[' } else { '(' };
                format!("{open}{lo:>width$}, {hi:>width$}]")
            })
            .collect()
    }
}

/// Classify `values` with `method`.
///
/// `k` is read by class-count methods and `edges` by `Percentiles` and
/// `UserDefined`; data-driven methods ignore both.
pub fn classify(
    values: &[f64],
    method: Method,
    k: Option<usize>,
    edges: Option<&[f64]>,
) -> ClassifyResult<Classification> {
    let sorted = SortedValues::new(values)?;

    let bins = match method {
        Method::EqualInterval => breaks::equal_interval(&sorted, class_count(method, k)?)?,
        Method::Quantiles => breaks::quantiles(&sorted, class_count(method, k)?)?,
        Method::FisherJenks => breaks::fisher_jenks(&sorted, class_count(method, k)?)?,
        Method::FisherJenksSampled => {
            breaks::fisher_jenks_sampled(&sorted, class_count(method, k)?)?
        }
        Method::NaturalBreaks => breaks::natural_breaks(&sorted, class_count(method, k)?)?,
        Method::JenksCaspall => breaks::jenks_caspall(&sorted, class_count(method, k)?)?,
        Method::JenksCaspallForced => {
            breaks::jenks_caspall_forced(&sorted, class_count(method, k)?)?
        }
        Method::JenksCaspallSampled => {
            breaks::jenks_caspall_sampled(&sorted, class_count(method, k)?)?
        }
        Method::MaxP => breaks::max_p(&sorted, class_count(method, k)?)?,
        Method::MaximumBreaks => breaks::maximum_breaks(&sorted, class_count(method, k)?)?,
        Method::PrettyBreaks => breaks::pretty_breaks(&sorted, class_count(method, k)?)?,
        Method::Percentiles => breaks::percentiles(&sorted, required_edges(method, edges)?)?,
        Method::UserDefined => breaks::user_defined(required_edges(method, edges)?)?,
        Method::HeadTailBreaks => breaks::head_tail_breaks(&sorted)?,
        Method::StdMean => breaks::std_mean(&sorted)?,
        Method::BoxPlot => breaks::box_plot(&sorted)?,
    };

    let classification = Classification::from_bins(method, values, &sorted, bins);
    debug!(
        method = %method,
        values = values.len(),
        classes = classification.k(),
        "Classified values"
    );
    Ok(classification)
}

fn class_count(method: Method, k: Option<usize>) -> ClassifyResult<usize> {
    k.ok_or(ClassifyError::MissingParameter {
        method: method.as_str(),
        parameter: "K_classes",
    })
}

fn required_edges(method: Method, edges: Option<&[f64]>) -> ClassifyResult<&[f64]> {
    edges.ok_or(ClassifyError::MissingParameter {
        method: method.as_str(),
        parameter: "bins",
    })
}
