//! Stake search: the largest big blind whose simulated risk of ruin
//! stays within a target.
//!
//! Session results are assumed to scale linearly with the big blind,
//! so evaluating a stake means rescaling the history and re-running
//! a full bootstrap simulation. Every evaluation draws from the same
//! seeded stream, so two stakes see the same resampled sessions and
//! ruin can only grow with the stake. That keeps the bisection
//! predicate monotone.

use crate::{
    config::RiskConfig,
    distribution::DistributionModel,
    error::{RiskError, RiskResult},
    metrics::{self, PathSummary},
    paths::PathMatrix,
    rng::{RngBank, StreamSlot},
    stats,
    types::Money,
};
use serde::{Deserialize, Serialize};

/// Bankroll level counted as ruin when evaluating a stake: broke.
pub const BROKE: Money = 0.0;

/// Re-runs a bootstrap simulation of rescaled session samples.
pub struct StakeEvaluator<'a> {
    samples:    &'a [f64],
    current_bb: Money,
    start:      Money,
    sessions:   usize,
    iterations: usize,
    seed:       u64,
    slot:       StreamSlot,
}

impl<'a> StakeEvaluator<'a> {
    pub fn new(
        samples: &'a [f64],
        current_bb: Money,
        start: Money,
        sessions: usize,
        iterations: usize,
        seed: u64,
        slot: StreamSlot,
    ) -> RiskResult<Self> {
        if samples.is_empty() {
            return Err(RiskError::insufficient_data(
                "stake evaluation needs at least one historical session",
            ));
        }
        if !(current_bb > 0.0) {
            return Err(RiskError::insufficient_stake_metadata(
                "current big blind must be positive to rescale history",
            ));
        }
        if !start.is_finite() {
            return Err(RiskError::invalid_parameter("bankroll_start must be finite"));
        }
        if sessions == 0 || iterations == 0 {
            return Err(RiskError::invalid_parameter(
                "stake evaluation needs at least one session and one iteration",
            ));
        }
        Ok(Self {
            samples,
            current_bb,
            start,
            sessions,
            iterations,
            seed,
            slot,
        })
    }

    /// History rescaled to play at `bb`.
    pub fn samples_at(&self, bb: Money) -> Vec<f64> {
        let scale = bb / self.current_bb;
        self.samples.iter().map(|x| x * scale).collect()
    }

    pub fn paths_at(&self, bb: Money) -> RiskResult<PathMatrix> {
        let scaled = self.samples_at(bb);
        let model = DistributionModel::bootstrap(&scaled)?;
        let mut rng = RngBank::new(self.seed).for_stream(self.slot);
        let steps = model.draw(self.iterations, self.sessions, &mut rng)?;
        Ok(PathMatrix::simulate(self.start, &steps))
    }

    pub fn ror_at(&self, bb: Money) -> RiskResult<f64> {
        Ok(metrics::risk_of_ruin(&self.paths_at(bb)?, BROKE))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakeSearchRequest {
    /// Big blind the history was played at, in cents.
    pub current_bb:       Money,
    pub bankroll_start:   Money,
    /// Acceptable probability of going broke, in [0, 1].
    pub target_ror:       f64,
    pub horizon_sessions: usize,
    pub iterations:       usize,
    pub bb_min:           Money,
    pub bb_max:           Money,
    #[serde(default)]
    pub tolerance:        Option<f64>,
    #[serde(default)]
    pub seed:             Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchBound {
    /// Even the smallest stake exceeds the target.
    LowerBound,
    /// The largest stake is already within the target.
    UpperBound,
    Bisected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakeSearchOutcome {
    pub recommended_bb:      Money,
    pub risk_of_ruin:        f64,
    /// recommended_bb / current_bb
    pub stake_multiple:      f64,
    pub decided_by:          SearchBound,
    pub bisections:          u32,
    /// Loss of a 5th-percentile session at the recommended stake.
    pub suggested_stop_loss: Money,
    pub metrics:             PathSummary,
}

pub fn search_stake(
    samples: &[f64],
    request: &StakeSearchRequest,
    config: &RiskConfig,
) -> RiskResult<StakeSearchOutcome> {
    if request.iterations > config.max_iterations {
        return Err(RiskError::invalid_parameter(format!(
            "iterations must be at most {}, got {}",
            config.max_iterations, request.iterations
        )));
    }
    if !(request.bb_min > 0.0) || !(request.bb_min <= request.bb_max) {
        return Err(RiskError::invalid_parameter(format!(
            "search bracket must satisfy 0 < bb_min <= bb_max, got [{}, {}]",
            request.bb_min, request.bb_max
        )));
    }
    if !(0.0..=1.0).contains(&request.target_ror) {
        return Err(RiskError::invalid_parameter(format!(
            "target_ror must be a probability, got {}",
            request.target_ror
        )));
    }
    let tolerance = request.tolerance.unwrap_or(config.search.tolerance);
    if !(tolerance > 0.0) {
        return Err(RiskError::invalid_parameter("search tolerance must be positive"));
    }

    let evaluator = StakeEvaluator::new(
        samples,
        request.current_bb,
        request.bankroll_start,
        request.horizon_sessions,
        request.iterations,
        request.seed.unwrap_or(config.default_seed),
        StreamSlot::StakeSearch,
    )?;
    let target = request.target_ror;

    let (mut lo, mut hi) = (request.bb_min, request.bb_max);
    let mut bisections = 0u32;

    let ror_lo = evaluator.ror_at(lo)?;
    let (recommended_bb, risk_of_ruin, decided_by) = if ror_lo > target {
        (lo, ror_lo, SearchBound::LowerBound)
    } else {
        let ror_hi = evaluator.ror_at(hi)?;
        if ror_hi <= target {
            (hi, ror_hi, SearchBound::UpperBound)
        } else {
            // Invariant: ror(lo) <= target < ror(hi).
            while hi - lo > tolerance && bisections < config.search.max_bisections {
                let mid = (lo + hi) / 2.0;
                let ror_mid = evaluator.ror_at(mid)?;
                log::debug!("stake_search: bb={mid:.4} ror={ror_mid:.4} bracket=[{lo:.4}, {hi:.4}]");
                if ror_mid <= target {
                    lo = mid;
                } else {
                    hi = mid;
                }
                bisections += 1;
            }
            (lo, evaluator.ror_at(lo)?, SearchBound::Bisected)
        }
    };

    let at_recommended = evaluator.samples_at(recommended_bb);
    let suggested_stop_loss = (-stats::quantile(&at_recommended, config.tail_alpha)).max(0.0);
    let metrics = PathSummary::from_paths(
        &evaluator.paths_at(recommended_bb)?,
        BROKE,
        config.tail_alpha,
    );

    log::info!(
        "stake_search: recommended bb={recommended_bb:.2} ({:?}) ror={risk_of_ruin:.4} target={target:.4} bisections={bisections}",
        decided_by
    );

    Ok(StakeSearchOutcome {
        recommended_bb,
        risk_of_ruin,
        stake_multiple: recommended_bb / request.current_bb,
        decided_by,
        bisections,
        suggested_stop_loss,
        metrics,
    })
}
