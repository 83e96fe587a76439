//! Per-step outcome samplers.
//!
//! A closed set of variants, one per sampling strategy, all producing
//! the same thing: an iterations × steps matrix of monetary outcomes.
//! Draw order is row-major (path by path, step by step) so a seeded
//! generator always fills the matrix identically.

use crate::{
    error::{RiskError, RiskResult},
    history::{HistoricalDistribution, SampleUnit},
    request::{Horizon, ModelKind, SimulationRequest},
    rng::SimRng,
    stats,
    types::{Instrument, Money, StakeKey},
};
use rand::distributions::WeightedIndex;
use rand_distr::{Distribution, Normal, StudentT};

/// Per-step outcomes, row-major: row = path, column = step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepMatrix {
    iterations: usize,
    steps:      usize,
    data:       Vec<f64>,
}

impl StepMatrix {
    pub fn from_fn(iterations: usize, steps: usize, mut draw: impl FnMut() -> f64) -> Self {
        let data = (0..iterations * steps).map(|_| draw()).collect();
        Self { iterations, steps, data }
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> RiskResult<Self> {
        let steps = rows.first().map(Vec::len).unwrap_or(0);
        if rows.iter().any(|r| r.len() != steps) {
            return Err(RiskError::invalid_parameter("step rows must share one length"));
        }
        Ok(Self {
            iterations: rows.len(),
            steps,
            data: rows.concat(),
        })
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.steps..(i + 1) * self.steps]
    }

    pub fn values(&self) -> &[f64] {
        &self.data
    }

    /// Cap every step's loss at `stop_loss` (sign ignored).
    pub fn clip_losses(&mut self, stop_loss: Money) {
        let floor = -stop_loss.abs();
        for x in &mut self.data {
            *x = x.max(floor);
        }
    }

    /// Population standard deviation over every cell.
    pub fn std(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        stats::std_dev(&self.data, 0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DistributionModel<'a> {
    Bootstrap { samples: &'a [f64] },
    Normal { mu: f64, sigma: f64 },
    StudentT { mu: f64, sigma: f64, nu: f64 },
    Mixture { buckets: Vec<(StakeKey, &'a [f64])> },
}

impl<'a> DistributionModel<'a> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bootstrap { .. } => "bootstrap",
            Self::Normal { .. }    => "normal",
            Self::StudentT { .. }  => "tstudent",
            Self::Mixture { .. }   => "mixture",
        }
    }

    pub fn bootstrap(samples: &'a [f64]) -> RiskResult<Self> {
        if samples.is_empty() {
            return Err(RiskError::insufficient_data(
                "bootstrap needs at least one historical sample",
            ));
        }
        Ok(Self::Bootstrap { samples })
    }

    pub fn normal(mu: f64, sigma: f64) -> RiskResult<Self> {
        check_sigma(sigma)?;
        Ok(Self::Normal { mu, sigma })
    }

    pub fn student_t(mu: f64, sigma: f64, nu: f64) -> RiskResult<Self> {
        check_sigma(sigma)?;
        if !(nu > 2.0) || !nu.is_finite() {
            return Err(RiskError::invalid_parameter(format!(
                "Student-t degrees of freedom must be > 2 for finite variance, got {nu}"
            )));
        }
        Ok(Self::StudentT { mu, sigma, nu })
    }

    pub fn mixture(buckets: Vec<(StakeKey, &'a [f64])>) -> RiskResult<Self> {
        let buckets: Vec<_> = buckets.into_iter().filter(|(_, s)| !s.is_empty()).collect();
        if buckets.is_empty() {
            return Err(RiskError::insufficient_data(
                "no stake bucket has data for mixture sampling",
            ));
        }
        Ok(Self::Mixture { buckets })
    }

    /// Fill an iterations × steps outcome matrix from `rng`.
    pub fn draw(&self, iterations: usize, steps: usize, rng: &mut SimRng) -> RiskResult<StepMatrix> {
        log::debug!(
            "distribution: model={} stream={} shape={iterations}x{steps}",
            self.name(),
            rng.name
        );
        let matrix = match self {
            Self::Bootstrap { samples } => {
                StepMatrix::from_fn(iterations, steps, || samples[rng.index_below(samples.len())])
            }
            Self::Normal { mu, sigma } => {
                let dist = Normal::new(*mu, *sigma)
                    .map_err(|e| RiskError::invalid_parameter(format!("normal({mu}, {sigma}): {e:?}")))?;
                StepMatrix::from_fn(iterations, steps, || dist.sample(rng))
            }
            Self::StudentT { mu, sigma, nu } => {
                let dist = StudentT::new(*nu)
                    .map_err(|e| RiskError::invalid_parameter(format!("student_t({nu}): {e:?}")))?;
                StepMatrix::from_fn(iterations, steps, || mu + sigma * dist.sample(rng))
            }
            Self::Mixture { buckets } => {
                // Buckets with more history are picked more often.
                let weights: Vec<usize> = buckets.iter().map(|(_, s)| s.len()).collect();
                let picker = WeightedIndex::new(&weights)
                    .map_err(|e| RiskError::invalid_parameter(format!("mixture weights: {e}")))?;
                StepMatrix::from_fn(iterations, steps, || {
                    let (_, bucket) = buckets[picker.sample(rng)];
                    bucket[rng.index_below(bucket.len())]
                })
            }
        };
        Ok(matrix)
    }
}

fn check_sigma(sigma: f64) -> RiskResult<()> {
    if !(sigma >= 0.0) || !sigma.is_finite() {
        return Err(RiskError::invalid_parameter(format!(
            "standard deviation must be finite and non-negative, got {sigma}"
        )));
    }
    Ok(())
}

/// Parameter names for (mean, std) per instrument and unit.
fn moment_keys(instrument: Instrument, horizon: Horizon) -> (&'static str, &'static str) {
    match (instrument, horizon) {
        (Instrument::Mtt, _)                   => ("mu_per_event", "sigma_per_event"),
        (Instrument::Cash, Horizon::Hours(_))    => ("mu_per_hr", "sigma_per_hr"),
        (Instrument::Cash, Horizon::Sessions(_)) => ("mu_per_session", "sigma_per_session"),
    }
}

/// Request parameter first, then the empirical moment. A moment the
/// history cannot supply is an error, never a silent zero.
fn resolve_moments(
    request: &SimulationRequest,
    instrument: Instrument,
    horizon: Horizon,
    samples: &[f64],
    unit: SampleUnit,
) -> RiskResult<(f64, f64)> {
    let (mu_key, sigma_key) = moment_keys(instrument, horizon);
    let mu = match request.param(mu_key) {
        Some(mu) => mu,
        None if !samples.is_empty() => stats::mean(samples),
        None => {
            return Err(RiskError::insufficient_data(format!(
                "{mu_key} not given and no {} samples to estimate it",
                unit.name()
            )))
        }
    };
    let sigma = match request.param(sigma_key) {
        Some(sigma) => sigma,
        None if samples.len() >= 2 => stats::std_dev(samples, 1),
        None => {
            return Err(RiskError::insufficient_data(format!(
                "{sigma_key} not given and fewer than 2 {} samples to estimate it",
                unit.name()
            )))
        }
    };
    Ok((mu, sigma))
}

/// Pick and parameterize the sampler for a request.
pub fn model_for_request<'a>(
    request: &SimulationRequest,
    horizon: Horizon,
    history: &'a HistoricalDistribution,
    default_nu: f64,
) -> RiskResult<DistributionModel<'a>> {
    let instrument = request.stake_profile.instrument;
    let unit = horizon.unit(instrument);

    match (instrument, request.model) {
        (Instrument::Mtt, ModelKind::Mixture) => Err(RiskError::unsupported_model(
            ModelKind::Mixture.name(),
            instrument.name(),
        )),
        (_, ModelKind::Bootstrap) => DistributionModel::bootstrap(history.samples(instrument, unit)?),
        (_, ModelKind::Normal) => {
            let samples = history.raw_samples(instrument, unit)?;
            let (mu, sigma) = resolve_moments(request, instrument, horizon, samples, unit)?;
            DistributionModel::normal(mu, sigma)
        }
        (_, ModelKind::Tstudent) => {
            let nu = request.param("nu").unwrap_or(default_nu);
            // Reject a bad nu before any moment estimation.
            if !(nu > 2.0) {
                return Err(RiskError::invalid_parameter(format!(
                    "Student-t degrees of freedom must be > 2 for finite variance, got {nu}"
                )));
            }
            let samples = history.raw_samples(instrument, unit)?;
            let (mu, sigma) = resolve_moments(request, instrument, horizon, samples, unit)?;
            DistributionModel::student_t(mu, sigma, nu)
        }
        (Instrument::Cash, ModelKind::Mixture) => {
            DistributionModel::mixture(history.non_empty_stake_buckets()?)
        }
    }
}
