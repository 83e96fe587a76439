//! Risk statistics over a bankroll path matrix.
//!
//! Every statistic reads the full trajectory, start column included.
//! Quantiles use the linear rule documented in `stats`.

use crate::{
    config::RuinConfig,
    paths::PathMatrix,
    request::StakeProfile,
    stats,
    types::{Instrument, Money},
};
use serde::{Deserialize, Serialize};

pub const BAND_LEVELS: [(&str, f64); 5] = [
    ("p05", 0.05),
    ("p25", 0.25),
    ("p50", 0.50),
    ("p75", 0.75),
    ("p95", 0.95),
];

/// Bankroll level at or below which a path counts as ruined.
///
/// Cash: the lower of "lost `drawdown_fraction` of the start" and
/// "lost `buyin_multiple` buy-ins", the latter only when the buy-in
/// value is known. Tournaments: zero.
pub fn ruin_threshold(start: Money, profile: &StakeProfile, ruin: &RuinConfig) -> Money {
    match profile.instrument {
        Instrument::Mtt => 0.0,
        Instrument::Cash => {
            let drawdown_line = start - start * ruin.drawdown_fraction;
            match profile.buyin_value() {
                Some(buyin) => drawdown_line.min(start - buyin * ruin.buyin_multiple),
                None => drawdown_line,
            }
        }
    }
}

/// Fraction of paths whose minimum touches `threshold`.
pub fn risk_of_ruin(paths: &PathMatrix, threshold: Money) -> f64 {
    if paths.iterations() == 0 {
        return 0.0;
    }
    let ruined = paths
        .rows()
        .filter(|row| row.iter().any(|&level| level <= threshold))
        .count();
    ruined as f64 / paths.iterations() as f64
}

/// Substitute for a Monte Carlo estimate of exactly zero:
/// 1 / (1 + start / scale), scale = 2 × per-step std × sqrt(steps),
/// or 1 when the outcomes have no spread. Strictly decreasing in
/// `start` and never zero.
pub fn fallback_risk_of_ruin(start: Money, per_step_std: f64, steps: usize) -> f64 {
    let total_std = per_step_std * (steps as f64).sqrt();
    let scale = if total_std > 0.0 { 2.0 * total_std } else { 1.0 };
    1.0 / (1.0 + start / scale)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuinEstimate {
    pub probability:   f64,
    pub threshold:     Money,
    /// True when the zero-ruin substitute replaced the estimate.
    pub fallback_used: bool,
}

pub fn ruin_estimate(paths: &PathMatrix, threshold: Money, per_step_std: f64) -> RuinEstimate {
    let observed = risk_of_ruin(paths, threshold);
    if observed == 0.0 {
        let substitute = fallback_risk_of_ruin(paths.start(), per_step_std, paths.steps());
        log::debug!(
            "metrics: no path reached {threshold:.2}; analytic substitute ror={substitute:.6}"
        );
        return RuinEstimate {
            probability:   substitute,
            threshold,
            fallback_used: true,
        };
    }
    RuinEstimate {
        probability: observed,
        threshold,
        fallback_used: false,
    }
}

/// Per-step quantile bands across paths, for charting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantileBands {
    pub p05: Vec<f64>,
    pub p25: Vec<f64>,
    pub p50: Vec<f64>,
    pub p75: Vec<f64>,
    pub p95: Vec<f64>,
}

impl QuantileBands {
    pub fn len(&self) -> usize {
        self.p50.len()
    }

    pub fn is_empty(&self) -> bool {
        self.p50.is_empty()
    }

    pub fn bands(&self) -> [(&'static str, &[f64]); 5] {
        [
            ("p05", self.p05.as_slice()),
            ("p25", self.p25.as_slice()),
            ("p50", self.p50.as_slice()),
            ("p75", self.p75.as_slice()),
            ("p95", self.p95.as_slice()),
        ]
    }
}

pub fn quantile_bands(paths: &PathMatrix) -> QuantileBands {
    let width = paths.steps() + 1;
    let mut out: [Vec<f64>; 5] = Default::default();
    for band in &mut out {
        band.reserve(width);
    }
    for step in 0..width {
        let mut column = paths.column(step);
        stats::sort_ascending(&mut column);
        for (band, (_, level)) in out.iter_mut().zip(BAND_LEVELS) {
            band.push(stats::quantile_sorted(&column, level));
        }
    }
    let [p05, p25, p50, p75, p95] = out;
    QuantileBands { p05, p25, p50, p75, p95 }
}

/// Loss-framed tail risk on ending PnL. Both values are magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TailLoss {
    pub var_loss:  f64,
    pub cvar_loss: f64,
}

pub fn tail_loss(paths: &PathMatrix, alpha: f64) -> TailLoss {
    let endings = paths.endings();
    let pnl = paths.ending_pnl();
    let var_loss = (paths.start() - stats::quantile(&endings, alpha)).max(0.0);

    let cutoff = stats::quantile(&pnl, alpha);
    let tail: Vec<f64> = pnl.iter().copied().filter(|x| *x <= cutoff).collect();
    let cvar_loss = if tail.is_empty() { 0.0 } else { -stats::mean(&tail) };

    TailLoss { var_loss, cvar_loss }
}

/// Fraction of paths whose peak reaches `target`; `None` without one.
pub fn prob_hit_target(paths: &PathMatrix, target: Option<Money>) -> Option<f64> {
    let target = target?;
    if paths.iterations() == 0 {
        return Some(0.0);
    }
    let hits = paths
        .rows()
        .filter(|row| row.iter().any(|&level| level >= target))
        .count();
    Some(hits as f64 / paths.iterations() as f64)
}

/// Largest peak-to-trough fall of each path.
pub fn max_drawdowns(paths: &PathMatrix) -> Vec<f64> {
    paths.rows().map(max_drawdown).collect()
}

pub fn max_drawdown(path: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0f64;
    for &level in path {
        peak = peak.max(level);
        worst = worst.max(peak - level);
    }
    worst
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawdownStats {
    pub mean:   f64,
    pub median: f64,
    pub p95:    f64,
}

impl DrawdownStats {
    pub fn from_paths(paths: &PathMatrix) -> Self {
        let mut dd = max_drawdowns(paths);
        stats::sort_ascending(&mut dd);
        Self {
            mean:   stats::mean(&dd),
            median: stats::quantile_sorted(&dd, 0.5),
            p95:    stats::quantile_sorted(&dd, 0.95),
        }
    }
}

/// Distribution of a scalar across paths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spread {
    pub mean:   f64,
    pub median: f64,
    pub p05:    f64,
    pub p95:    f64,
}

impl Spread {
    pub fn of(values: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        stats::sort_ascending(&mut sorted);
        Self {
            mean:   stats::mean(&sorted),
            median: stats::quantile_sorted(&sorted, 0.5),
            p05:    stats::quantile_sorted(&sorted, 0.05),
            p95:    stats::quantile_sorted(&sorted, 0.95),
        }
    }
}

/// Compact report used by the stake search, scenarios and alerts:
/// raw Monte Carlo ruin (no substitute) against a fixed threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathSummary {
    pub steps:          usize,
    pub iterations:     usize,
    pub total_pnl:      Spread,
    pub tail:           TailLoss,
    pub risk_of_ruin:   f64,
    pub ruin_threshold: Money,
    pub drawdown:       DrawdownStats,
}

impl PathSummary {
    pub fn from_paths(paths: &PathMatrix, ruin_threshold: Money, alpha: f64) -> Self {
        Self {
            steps:        paths.steps(),
            iterations:   paths.iterations(),
            total_pnl:    Spread::of(&paths.ending_pnl()),
            tail:         tail_loss(paths, alpha),
            risk_of_ruin: risk_of_ruin(paths, ruin_threshold),
            ruin_threshold,
            drawdown:     DrawdownStats::from_paths(paths),
        }
    }
}
