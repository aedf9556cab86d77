//! Break computation for each classification method.
//!
//! Every function returns class upper bounds in ascending order. A value `y`
//! belongs to the first class whose bound satisfies `y <= bound`.

use std::ops::Range;

use crate::error::{ClassifyError, ClassifyResult};
use crate::stats::SortedValues;

/// Iteration cap for the k-means / k-medians refinements.
const MAX_ITERATIONS: usize = 100;

/// Starting partitions tried by the iterative methods.
const INITIAL_SOLUTIONS: usize = 10;

/// Share of the data kept by the sampled methods.
const SAMPLE_FRACTION: f64 = 0.10;

/// Upper bound on the FisherJenksSampled sample size.
const SAMPLE_CAP: usize = 1000;

/// Multiples of the standard deviation used by StdMean.
const STD_MULTIPLES: [f64; 4] = [-2.0, -1.0, 1.0, 2.0];

/// Whisker length, in interquartile ranges, used by BoxPlot.
const HINGE: f64 = 1.5;

fn require_k(k: usize) -> ClassifyResult<()> {
    if k == 0 {
        return Err(ClassifyError::InvalidK(k));
    }
    Ok(())
}

fn require_unique(values: &SortedValues, k: usize) -> ClassifyResult<()> {
    let unique = values.unique_count();
    if unique < k {
        return Err(ClassifyError::NotEnoughUniqueValues { k, unique });
    }
    Ok(())
}

fn require_ordered(edges: &[f64]) -> ClassifyResult<()> {
    if edges.is_empty() {
        return Err(ClassifyError::EmptyBins);
    }
    if edges.iter().any(|e| !e.is_finite()) || edges.windows(2).any(|w| w[1] < w[0]) {
        return Err(ClassifyError::UnorderedBins);
    }
    Ok(())
}

/// Equal-width bands between the minimum and maximum.
pub fn equal_interval(values: &SortedValues, k: usize) -> ClassifyResult<Vec<f64>> {
    require_k(k)?;
    let (min, max) = (values.min(), values.max());
    if k > 1 && min == max {
        return Err(ClassifyError::NotEnoughUniqueValues { k, unique: 1 });
    }

    let width = (max - min) / k as f64;
    let mut bins: Vec<f64> = (1..k).map(|i| min + width * i as f64).collect();
    bins.push(max);
    Ok(bins)
}

/// Bounds at `k` evenly spaced percentiles; repeated bounds collapse.
pub fn quantiles(values: &SortedValues, k: usize) -> ClassifyResult<Vec<f64>> {
    require_k(k)?;
    let mut bins = Vec::with_capacity(k);
    for i in 1..=k {
        let p = 100.0 * i as f64 / k as f64;
        bins.push(values.percentile(p.min(100.0))?);
    }
    bins.dedup();
    Ok(bins)
}

/// Bounds at caller-supplied percentiles.
pub fn percentiles(values: &SortedValues, pct: &[f64]) -> ClassifyResult<Vec<f64>> {
    require_ordered(pct)?;
    pct.iter().map(|p| values.percentile(*p)).collect()
}

/// Caller-supplied bounds, used as-is.
pub fn user_defined(edges: &[f64]) -> ClassifyResult<Vec<f64>> {
    require_ordered(edges)?;
    Ok(edges.to_vec())
}

/// Head/tail breaks: split at the mean, then recurse into the head.
pub fn head_tail_breaks(values: &SortedValues) -> ClassifyResult<Vec<f64>> {
    let mut head = values.as_slice().to_vec();
    let mut bins = Vec::new();

    loop {
        let first = head[0];
        let last = head[head.len() - 1];
        if first == last {
            bins.push(last);
            break;
        }
        let mean = head.iter().sum::<f64>() / head.len() as f64;
        bins.push(mean);
        head.retain(|v| *v > mean);
        if head.is_empty() {
            break;
        }
    }

    Ok(bins)
}

/// Bounds at fixed multiples of the standard deviation around the mean.
pub fn std_mean(values: &SortedValues) -> ClassifyResult<Vec<f64>> {
    let mean = values.mean();
    let std = values.std_dev();
    Ok(STD_MULTIPLES.iter().map(|m| mean + m * std).collect())
}

/// Box plot fences: lower whisker, quartiles and upper whisker.
pub fn box_plot(values: &SortedValues) -> ClassifyResult<Vec<f64>> {
    let q1 = values.percentile(25.0)?;
    let q2 = values.percentile(50.0)?;
    let q3 = values.percentile(75.0)?;
    let iqr = q3 - q1;
    Ok(vec![q1 - HINGE * iqr, q1, q2, q3, q3 + HINGE * iqr])
}

/// Fisher-Jenks optimal classification.
///
/// Dynamic program over the sorted values minimising the summed squared
/// deviation from each class mean. `O(k * n^2)` time and `O(k * n)` memory.
pub fn fisher_jenks(values: &SortedValues, k: usize) -> ClassifyResult<Vec<f64>> {
    require_k(k)?;
    require_unique(values, k)?;

    let data = values.as_slice();
    let n = data.len();

    // 1-based tables: lower[l][j] is the 1-based index where class j starts
    // in the best partition of the first l values into j classes.
    let mut lower = vec![vec![0usize; k + 1]; n + 1];
    let mut cost = vec![vec![0.0f64; k + 1]; n + 1];

    for j in 1..=k {
        lower[1][j] = 1;
        for row in cost.iter_mut().skip(2) {
            row[j] = f64::INFINITY;
        }
    }
    // A single value cannot fill more than one class.
    for j in 2..=k {
        cost[1][j] = f64::INFINITY;
    }

    for l in 2..=n {
        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        let mut variance = 0.0;

        for m in 1..=l {
            let start = l - m + 1;
            let val = data[start - 1];
            sum += val;
            sum_sq += val * val;
            variance = sum_sq - sum * sum / m as f64;

            let prev = start - 1;
            if prev != 0 {
                for j in 2..=k {
                    let candidate = variance + cost[prev][j - 1];
                    if cost[l][j] >= candidate {
                        lower[l][j] = start;
                        cost[l][j] = candidate;
                    }
                }
            }
        }

        lower[l][1] = 1;
        cost[l][1] = variance;
    }

    let mut bins = vec![0.0; k];
    bins[k - 1] = data[n - 1];
    let mut end = n;
    for class in (2..=k).rev() {
        let start = lower[end][class];
        bins[class - 2] = data[start - 2];
        end = start - 1;
    }

    Ok(bins)
}

/// Natural breaks: one-dimensional k-means.
///
/// Several initial partitions are refined and the one with the lowest
/// within-class sum of squares is kept.
pub fn natural_breaks(values: &SortedValues, k: usize) -> ClassifyResult<Vec<f64>> {
    require_k(k)?;
    require_unique(values, k)?;
    Ok(best_partition(values, k, Fit::Mean, lloyd))
}

/// Jenks-Caspall: one-dimensional k-medians, best of several starts.
pub fn jenks_caspall(values: &SortedValues, k: usize) -> ClassifyResult<Vec<f64>> {
    require_k(k)?;
    require_unique(values, k)?;
    Ok(best_partition(values, k, Fit::Median, lloyd))
}

/// Jenks-Caspall with forced moves: starting from quantile classes, single
/// values are moved across class boundaries while that lowers the fit.
pub fn jenks_caspall_forced(values: &SortedValues, k: usize) -> ClassifyResult<Vec<f64>> {
    require_k(k)?;
    require_unique(values, k)?;
    let data = values.as_slice();
    let cuts = cut_points(data);
    let start = seed(&cuts, data.len(), k, &quantile_targets(data.len(), k, 0.0));
    Ok(bins_of(data, &forced_moves(data, start, k, Fit::Median)))
}

/// Fisher-Jenks on an evenly spaced sample of at most `SAMPLE_CAP` values.
pub fn fisher_jenks_sampled(values: &SortedValues, k: usize) -> ClassifyResult<Vec<f64>> {
    require_k(k)?;
    require_unique(values, k)?;
    fisher_jenks(&sample(values, k, Some(SAMPLE_CAP))?, k)
}

/// Jenks-Caspall on an evenly spaced sample.
pub fn jenks_caspall_sampled(values: &SortedValues, k: usize) -> ClassifyResult<Vec<f64>> {
    require_k(k)?;
    require_unique(values, k)?;
    jenks_caspall(&sample(values, k, None)?, k)
}

/// Max-p on a line: every initial partition is improved by boundary swaps
/// and the lowest within-class sum of squares wins.
pub fn max_p(values: &SortedValues, k: usize) -> ClassifyResult<Vec<f64>> {
    require_k(k)?;
    require_unique(values, k)?;
    Ok(best_partition(values, k, Fit::Mean, forced_moves))
}

/// Evenly spaced round-number bounds ("pretty" breaks).
///
/// The step is 1, 2 or 5 times a power of ten, so the class count is close
/// to `k` but not always equal to it.
pub fn pretty_breaks(values: &SortedValues, k: usize) -> ClassifyResult<Vec<f64>> {
    require_k(k)?;
    let (min, max) = (values.min(), values.max());
    if min == max {
        return Ok(vec![max]);
    }

    let step = nice_step((max - min) / k as f64);
    let first = (min / step).floor() * step;
    let count = ((max - first) / step).ceil().max(1.0) as usize;
    Ok((1..=count).map(|i| round_to_step(first + step * i as f64, step)).collect())
}

fn nice_step(raw: f64) -> f64 {
    let magnitude = 10f64.powf(raw.log10().floor());
    let fraction = raw / magnitude;
    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

/// Strip accumulated float error, e.g. `0.30000000000000004` -> `0.3`.
fn round_to_step(value: f64, step: f64) -> f64 {
    let decimals = (-step.log10().floor()).max(0.0) as i32;
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}


/// Midpoints of the `k - 1` widest gaps between consecutive values.
pub fn maximum_breaks(values: &SortedValues, k: usize) -> ClassifyResult<Vec<f64>> {
    require_k(k)?;
    require_unique(values, k)?;

    let data = values.as_slice();
    let mut gaps: Vec<(usize, f64)> = data
        .windows(2)
        .enumerate()
        .map(|(i, w)| (i, w[1] - w[0]))
        .filter(|(_, gap)| *gap > 0.0)
        .collect();
    gaps.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut bins: Vec<f64> = gaps
        .iter()
        .take(k - 1)
        .map(|(i, _)| (data[*i] + data[*i + 1]) / 2.0)
        .collect();
    bins.sort_by(f64::total_cmp);
    bins.push(values.max());
    Ok(bins)
}


/// How a class is summarised and scored.
#[derive(Debug, Clone, Copy)]
enum Fit {
    /// Class mean, squared deviations.
    Mean,
    /// Class median, absolute deviations.
    Median,
}

impl Fit {
    fn center(self, run: &[f64]) -> f64 {
        match self {
            Fit::Mean => mean_of(run),
            Fit::Median => median_of(run),
        }
    }

    fn cost(self, run: &[f64]) -> f64 {
        let center = self.center(run);
        match self {
            Fit::Mean => run.iter().map(|v| (v - center) * (v - center)).sum(),
            Fit::Median => run.iter().map(|v| (v - center).abs()).sum(),
        }
    }
}

fn mean_of(slice: &[f64]) -> f64 {
    slice.iter().sum::<f64>() / slice.len() as f64
}

fn median_of(slice: &[f64]) -> f64 {
    let mid = slice.len() / 2;
    if slice.len() % 2 == 0 {
        (slice[mid - 1] + slice[mid]) / 2.0
    } else {
        slice[mid]
    }
}

// Partitions of sorted 1-D data are contiguous runs, stored as the end
// offset of each run. The last end is always `data.len()` and no run is
// empty.

fn runs(ends: &[usize]) -> impl Iterator<Item = Range<usize>> + '_ {
    ends.iter().scan(0, |start, &end| {
        let run = *start..end;
        *start = end;
        Some(run)
    })
}

fn total_cost(data: &[f64], ends: &[usize], fit: Fit) -> f64 {
    runs(ends).map(|run| fit.cost(&data[run])).sum()
}

fn bins_of(data: &[f64], ends: &[usize]) -> Vec<f64> {
    ends.iter().map(|end| data[end - 1]).collect()
}

/// Offsets where a run may end: between two distinct values.
fn cut_points(data: &[f64]) -> Vec<usize> {
    (1..data.len()).filter(|&p| data[p - 1] < data[p]).collect()
}

/// `k` non-empty runs whose ends sit at the cut points nearest `targets`.
///
/// Requires at least `k - 1` cut points.
fn seed(cuts: &[usize], n: usize, k: usize, targets: &[f64]) -> Vec<usize> {
    let mut ends = Vec::with_capacity(k);
    let mut previous: Option<usize> = None;
    for (i, target) in (1..k).zip(targets) {
        let mut idx = cuts.partition_point(|c| (*c as f64) < *target);
        let nearer_below = idx == cuts.len()
            || (idx > 0 && target - cuts[idx - 1] as f64 <= cuts[idx] as f64 - target);
        if idx > 0 && nearer_below {
            idx -= 1;
        }
        let lowest = previous.map_or(0, |p| p + 1);
        let highest = cuts.len() - (k - i);
        idx = idx.clamp(lowest, highest);
        ends.push(cuts[idx]);
        previous = Some(idx);
    }
    ends.push(n);
    ends
}

/// Run ends at the `i/k` quantiles, shifted by `offset` classes.
fn quantile_targets(n: usize, k: usize, offset: f64) -> Vec<f64> {
    (1..k)
        .map(|i| (i as f64 + offset) / k as f64 * n as f64)
        .collect()
}

/// Initial partitions: quantile classes (plain and shifted) and equal
/// intervals.
fn seeds(data: &[f64], cuts: &[usize], k: usize) -> Vec<Vec<usize>> {
    let n = data.len();
    let mut seeds: Vec<Vec<usize>> = (0..INITIAL_SOLUTIONS)
        .map(|t| {
            let offset = if t == 0 {
                0.0
            } else {
                t as f64 / INITIAL_SOLUTIONS as f64 - 0.5
            };
            seed(cuts, n, k, &quantile_targets(n, k, offset))
        })
        .collect();

    let (min, max) = (data[0], data[n - 1]);
    let width = (max - min) / k as f64;
    let equal: Vec<f64> = (1..k)
        .map(|i| data.partition_point(|v| *v <= min + width * i as f64) as f64)
        .collect();
    seeds.push(seed(cuts, n, k, &equal));

    seeds.dedup();
    seeds
}

/// Refine every seed and keep the partition with the lowest cost.
fn best_partition(
    values: &SortedValues,
    k: usize,
    fit: Fit,
    refine: fn(&[f64], Vec<usize>, usize, Fit) -> Vec<usize>,
) -> Vec<f64> {
    let data = values.as_slice();
    let cuts = cut_points(data);
    let best = seeds(data, &cuts, k)
        .into_iter()
        .map(|start| {
            let ends = refine(data, start, k, fit);
            (total_cost(data, &ends, fit), ends)
        })
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, ends)| ends)
        .unwrap_or_else(|| vec![data.len()]);
    bins_of(data, &best)
}

/// Lloyd iteration: move every value to its nearest class center until the
/// runs stop changing. Classes that empty out are refilled by splitting.
fn lloyd(data: &[f64], mut ends: Vec<usize>, k: usize, fit: Fit) -> Vec<usize> {
    for _ in 0..MAX_ITERATIONS {
        let centers: Vec<f64> = runs(&ends).map(|run| fit.center(&data[run])).collect();
        let mut next = nearest_runs(data, &centers);
        split_until(data, &mut next, k, fit);
        if next == ends {
            break;
        }
        ends = next;
    }
    ends
}

/// Runs formed when every value joins its nearest center (ties go to the
/// lower center). Centers left without values produce no run.
fn nearest_runs(data: &[f64], centers: &[f64]) -> Vec<usize> {
    let mut ends = Vec::with_capacity(centers.len());
    let mut current = 0;
    for (i, v) in data.iter().enumerate() {
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (c, center) in centers.iter().enumerate() {
            let dist = (v - center).abs();
            if dist < best_dist {
                best = c;
                best_dist = dist;
            }
        }
        let best = best.max(current);
        if best != current && i > 0 {
            ends.push(i);
        }
        current = best;
    }
    ends.push(data.len());
    ends
}

/// Split the costliest run at its best cut point until there are `k` runs.
fn split_until(data: &[f64], ends: &mut Vec<usize>, k: usize, fit: Fit) {
    while ends.len() < k {
        let costliest = runs(ends)
            .enumerate()
            .map(|(i, run)| (i, run.start, run.end, fit.cost(&data[run])))
            .filter(|(_, _, _, cost)| *cost > 0.0)
            .max_by(|a, b| a.3.total_cmp(&b.3));
        let Some((i, start, end, _)) = costliest else {
            break;
        };

        let split = (start + 1..end)
            .filter(|&p| data[p - 1] < data[p])
            .map(|p| (p, fit.cost(&data[start..p]) + fit.cost(&data[p..end])))
            .min_by(|a, b| a.1.total_cmp(&b.1));
        match split {
            Some((p, _)) => ends.insert(i, p),
            None => break,
        }
    }
}

/// Move class boundaries one distinct value at a time while the total cost
/// drops. Runs never empty out.
fn forced_moves(data: &[f64], mut ends: Vec<usize>, _k: usize, fit: Fit) -> Vec<usize> {
    let cuts = cut_points(data);
    let mut cost = total_cost(data, &ends, fit);

    for _ in 0..MAX_ITERATIONS {
        let mut improved = false;
        for b in 0..ends.len() - 1 {
            let start = if b == 0 { 0 } else { ends[b - 1] };
            let limit = ends[b + 1];
            let at = cuts.partition_point(|c| *c < ends[b]);

            for candidate in [at.checked_sub(1), Some(at + 1)].into_iter().flatten() {
                let Some(&p) = cuts.get(candidate) else {
                    continue;
                };
                if p <= start || p >= limit {
                    continue;
                }
                let mut trial = ends.clone();
                trial[b] = p;
                let trial_cost = total_cost(data, &trial, fit);
                if trial_cost < cost {
                    ends = trial;
                    cost = trial_cost;
                    improved = true;
                    break;
                }
            }
        }
        if !improved {
            break;
        }
    }
    ends
}

/// Evenly spaced ranks covering a tenth of the data (capped at `cap`),
/// always including the minimum and maximum. The full data is used when
/// the sample is too small or has fewer than `k` distinct values.
fn sample(values: &SortedValues, k: usize, cap: Option<usize>) -> ClassifyResult<SortedValues> {
    let data = values.as_slice();
    let n = data.len();
    let mut size = (n as f64 * SAMPLE_FRACTION) as usize;
    if let Some(cap) = cap {
        size = size.min(cap);
    }
    if size < 2 {
        return Ok(values.clone());
    }

    let picked: Vec<f64> = (0..size).map(|i| data[i * (n - 1) / (size - 1)]).collect();
    let sampled = SortedValues::new(&picked)?;
    if sampled.unique_count() < k {
        Ok(values.clone())
    } else {
        Ok(sampled)
    }
}
