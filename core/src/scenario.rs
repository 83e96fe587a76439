//! Scenario lab: "what if I moved up, ran worse, swung harder".
//!
//! Transforms are applied in a fixed order; reordering them changes
//! the result:
//!   1. Rescale to the scenario stake
//!   2. Widen or narrow the spread about the mean
//!   3. Shift the mean by a win-rate delta at the scenario stake

use crate::{
    config::RiskConfig,
    distribution::DistributionModel,
    error::{RiskError, RiskResult},
    metrics::{self, PathSummary, QuantileBands},
    paths::PathMatrix,
    rng::{RngBank, StreamSlot},
    stake_search::BROKE,
    stats::{self, SampleStats},
    types::Money,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAdjustment {
    pub current_bb:            Money,
    pub scenario_bb:           Money,
    /// Change in win rate, big blinds per 100 hands at the scenario stake.
    #[serde(default)]
    pub winrate_delta_bb100:   f64,
    #[serde(default)]
    pub avg_hands_per_session: f64,
    #[serde(default = "unit_multiplier")]
    pub vol_multiplier:        f64,
}

fn unit_multiplier() -> f64 {
    1.0
}

impl ScenarioAdjustment {
    pub fn validate(&self) -> RiskResult<()> {
        if !(self.current_bb > 0.0) {
            return Err(RiskError::insufficient_stake_metadata(
                "scenario needs the big blind the history was played at",
            ));
        }
        if !(self.scenario_bb > 0.0) {
            return Err(RiskError::invalid_parameter(format!(
                "scenario_bb must be positive, got {}",
                self.scenario_bb
            )));
        }
        if !(self.vol_multiplier >= 0.0) || !self.vol_multiplier.is_finite() {
            return Err(RiskError::invalid_parameter(format!(
                "vol_multiplier must be finite and non-negative, got {}",
                self.vol_multiplier
            )));
        }
        if !self.winrate_delta_bb100.is_finite() || !self.avg_hands_per_session.is_finite() {
            return Err(RiskError::invalid_parameter("win-rate shift inputs must be finite"));
        }
        Ok(())
    }

    /// Per-session mean shift in money implied by the win-rate delta.
    pub fn mean_shift(&self) -> Money {
        self.winrate_delta_bb100 * (self.avg_hands_per_session / 100.0) * self.scenario_bb
    }

    pub fn apply(&self, samples: &[f64]) -> RiskResult<Vec<f64>> {
        self.validate()?;
        if samples.is_empty() {
            return Err(RiskError::insufficient_data(
                "scenario needs at least one historical session",
            ));
        }
        let scale = self.scenario_bb / self.current_bb;
        let scaled: Vec<f64> = samples.iter().map(|x| x * scale).collect();
        let mu = stats::mean(&scaled);
        let shift = self.mean_shift();
        Ok(scaled
            .into_iter()
            .map(|x| (x - mu) * self.vol_multiplier + mu + shift)
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRequest {
    #[serde(flatten)]
    pub adjustment:       ScenarioAdjustment,
    pub bankroll_start:   Money,
    pub horizon_sessions: usize,
    pub iterations:       usize,
    #[serde(default)]
    pub seed:             Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub adjusted:  SampleStats,
    pub metrics:   PathSummary,
    pub quantiles: QuantileBands,
}

pub fn run_scenario(
    samples: &[f64],
    request: &ScenarioRequest,
    config: &RiskConfig,
) -> RiskResult<ScenarioReport> {
    if request.horizon_sessions == 0 {
        return Err(RiskError::invalid_parameter("scenario horizon must be at least one session"));
    }
    if request.iterations == 0 || request.iterations > config.max_iterations {
        return Err(RiskError::invalid_parameter(format!(
            "iterations must be in 1..={}, got {}",
            config.max_iterations, request.iterations
        )));
    }

    if !request.bankroll_start.is_finite() {
        return Err(RiskError::invalid_parameter("bankroll_start must be finite"));
    }

    let adjusted = request.adjustment.apply(samples)?;
    let model = DistributionModel::bootstrap(&adjusted)?;
    let mut rng = RngBank::new(request.seed.unwrap_or(config.default_seed))
        .for_stream(StreamSlot::Scenario);
    let steps = model.draw(request.iterations, request.horizon_sessions, &mut rng)?;
    let paths = PathMatrix::simulate(request.bankroll_start, &steps);

    let report = ScenarioReport {
        adjusted:  SampleStats::from_samples(&adjusted),
        metrics:   PathSummary::from_paths(&paths, BROKE, config.tail_alpha),
        quantiles: metrics::quantile_bands(&paths),
    };

    log::info!(
        "scenario: bb {} -> {} vol={:.2} shift={:.2} ror={:.4} median_pnl={:.2}",
        request.adjustment.current_bb,
        request.adjustment.scenario_bb,
        request.adjustment.vol_multiplier,
        request.adjustment.mean_shift(),
        report.metrics.risk_of_ruin,
        report.metrics.total_pnl.median
    );

    Ok(report)
}
