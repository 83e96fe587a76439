//! The Monte Carlo pipeline for one request:
//!
//!   1. Validate bounds (horizon, iteration cap)
//!   2. Pick the sampler and draw the step matrix
//!   3. Clip cash session steps at the stop-loss
//!   4. Accumulate bankroll paths
//!   5. Compute ruin, bands, tail loss, target odds, drawdown
//!   6. Attach the policy recommendation

use crate::{
    config::RiskConfig,
    distribution::model_for_request,
    error::{RiskError, RiskResult},
    history::HistoricalDistribution,
    metrics::{self, DrawdownStats, QuantileBands, Spread},
    paths::PathMatrix,
    policy::{stake_recommendation, PolicyConfig},
    report::{RiskSummary, StakePayload},
    request::SimulationRequest,
    rng::{RngBank, StreamSlot},
    types::Instrument,
};

pub const TARGET_PARAM: &str = "target_bankroll";

pub struct SimulationResult {
    pub summary:   RiskSummary,
    /// Per-step bands for charting, start column included.
    pub quantiles: QuantileBands,
    pub endings:   Vec<f64>,
    pub paths:     PathMatrix,
}

pub fn run_simulation(
    request: &SimulationRequest,
    history: &HistoricalDistribution,
    policy: &PolicyConfig,
    config: &RiskConfig,
) -> RiskResult<SimulationResult> {
    let horizon = request.validate(config.max_iterations)?;
    let profile = &request.stake_profile;
    let seed = request.seed.unwrap_or(config.default_seed);
    let start = request.bankroll_start;

    let model = model_for_request(request, horizon, history, config.default_nu)?;
    let mut rng = RngBank::new(seed).for_stream(StreamSlot::Simulation);
    let mut steps = model.draw(request.iterations, horizon.steps(), &mut rng)?;

    if profile.instrument == Instrument::Cash && horizon.is_sessions() {
        if let Some(stop_loss) = profile.stop_loss_value() {
            steps.clip_losses(stop_loss);
        }
    }

    let paths = PathMatrix::simulate(start, &steps);
    let threshold = metrics::ruin_threshold(start, profile, &config.ruin);
    let ruin = metrics::ruin_estimate(&paths, threshold, steps.std());
    if ruin.fallback_used {
        log::warn!(
            "simulation: no path reached the ruin line {threshold:.2}; reporting analytic estimate"
        );
    }

    let quantiles = metrics::quantile_bands(&paths);
    let tail = metrics::tail_loss(&paths, config.tail_alpha);
    let prob_target = metrics::prob_hit_target(&paths, request.param(TARGET_PARAM));
    let endings = paths.endings();

    let recommended_stake = match stake_recommendation(start, profile, policy, config.default_buyin_bb) {
        Ok(rec) => StakePayload::Recommended(rec),
        Err(RiskError::InsufficientStakeMetadata { context }) => {
            log::warn!("simulation: no stake recommendation: {context}");
            StakePayload::Unavailable { reason: context }
        }
        Err(e) => return Err(e),
    };

    let summary = RiskSummary {
        model:               request.model,
        seed,
        iterations:          paths.iterations(),
        steps:               paths.steps(),
        bankroll_start:      start,
        ending:              Spread::of(&endings),
        total_pnl:           Spread::of(&paths.ending_pnl()),
        risk_of_ruin_pct:    ruin.probability * 100.0,
        ruin_threshold:      threshold,
        ruin_fallback_used:  ruin.fallback_used,
        var_loss:            tail.var_loss,
        cvar_loss:           tail.cvar_loss,
        prob_hit_target_pct: prob_target.map(|p| p * 100.0),
        drawdown:            DrawdownStats::from_paths(&paths),
        recommended_stake,
    };

    log::info!(
        "simulation: model={} instrument={} iterations={} steps={} seed={seed} ror={:.4}% median_end={:.2}",
        model.name(),
        profile.instrument.name(),
        summary.iterations,
        summary.steps,
        summary.risk_of_ruin_pct,
        summary.ending.median
    );

    Ok(SimulationResult {
        summary,
        quantiles,
        endings,
        paths,
    })
}
