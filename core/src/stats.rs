//! Sample statistics shared by the history, metrics and scenario code.
//!
//! Quantiles use linear interpolation between closest ranks
//! (Hyndman–Fan type 7, the NumPy default):
//!   h = (n - 1) * p
//!   q = x[floor(h)] + (h - floor(h)) * (x[floor(h) + 1] - x[floor(h)])
//! Ties therefore resolve to the tied value itself, and with n = 1
//! every quantile is the single sample.

use serde::{Deserialize, Serialize};

pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return f64::NAN;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Standard deviation with `ddof` degrees of freedom removed.
/// Returns NaN when fewer than `ddof + 1` samples exist.
pub fn std_dev(xs: &[f64], ddof: usize) -> f64 {
    if xs.len() <= ddof {
        return f64::NAN;
    }
    let m = mean(xs);
    let ss: f64 = xs.iter().map(|x| (x - m).powi(2)).sum();
    (ss / (xs.len() - ddof) as f64).sqrt()
}

pub fn sort_ascending(xs: &mut [f64]) {
    xs.sort_by(f64::total_cmp);
}

/// Quantile of an already sorted slice. `p` is clamped to [0, 1].
/// NaN for an empty slice.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    let h = (n - 1) as f64 * p.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let w = h - lo as f64;
    sorted[lo] + w * (sorted[hi] - sorted[lo])
}

/// Quantile of an unsorted slice (copies and sorts).
pub fn quantile(xs: &[f64], p: f64) -> f64 {
    let mut sorted = xs.to_vec();
    sort_ascending(&mut sorted);
    quantile_sorted(&sorted, p)
}

pub fn median(xs: &[f64]) -> f64 {
    quantile(xs, 0.5)
}

/// Quick descriptive statistics for a historical sample array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleStats {
    pub count:  usize,
    pub mean:   f64,
    pub median: f64,
    /// Sample standard deviation (ddof = 1); NaN below two samples.
    pub std:    f64,
}

impl SampleStats {
    pub fn from_samples(xs: &[f64]) -> Self {
        Self {
            count:  xs.len(),
            mean:   mean(xs),
            median: median(xs),
            std:    std_dev(xs, 1),
        }
    }
}
