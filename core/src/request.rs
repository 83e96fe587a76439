//! Simulation request, the object the serving collaborator hands in.

use crate::{
    error::{RiskError, RiskResult},
    history::SampleUnit,
    types::{Instrument, Money},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which sampler produces the per-step outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Bootstrap,
    Normal,
    #[serde(alias = "student_t")]
    Tstudent,
    Mixture,
}

impl ModelKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bootstrap => "bootstrap",
            Self::Normal    => "normal",
            Self::Tstudent  => "tstudent",
            Self::Mixture   => "mixture",
        }
    }
}

/// Simulation horizon. Hours and sessions are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizon {
    Hours(usize),
    Sessions(usize),
}

impl Horizon {
    pub fn steps(&self) -> usize {
        match self {
            Self::Hours(n) | Self::Sessions(n) => *n,
        }
    }

    pub fn is_sessions(&self) -> bool {
        matches!(self, Self::Sessions(_))
    }

    /// The sample unit one step represents for this instrument.
    pub fn unit(&self, instrument: Instrument) -> SampleUnit {
        match (instrument, self) {
            (Instrument::Mtt, _)                  => SampleUnit::Tournament,
            (Instrument::Cash, Self::Hours(_))    => SampleUnit::Hour,
            (Instrument::Cash, Self::Sessions(_)) => SampleUnit::Session,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakeProfile {
    #[serde(rename = "type")]
    pub instrument:   Instrument,
    /// Big blind, in cents.
    #[serde(default)]
    pub bb:           Option<Money>,
    /// Buy-in depth, in big blinds.
    #[serde(default)]
    pub buyin_bb:     Option<f64>,
    /// Average tournament buy-in, in cents.
    #[serde(default)]
    pub abi:          Option<Money>,
    /// Per-session loss cap, in big blinds.
    #[serde(default)]
    pub stop_loss_bb: Option<f64>,
}

impl StakeProfile {
    pub fn cash(bb: Money, buyin_bb: f64) -> Self {
        Self {
            instrument:   Instrument::Cash,
            bb:           Some(bb),
            buyin_bb:     Some(buyin_bb),
            abi:          None,
            stop_loss_bb: None,
        }
    }

    pub fn tournament(abi: Money) -> Self {
        Self {
            instrument:   Instrument::Mtt,
            bb:           None,
            buyin_bb:     None,
            abi:          Some(abi),
            stop_loss_bb: None,
        }
    }

    pub fn with_stop_loss_bb(mut self, stop_loss_bb: f64) -> Self {
        self.stop_loss_bb = Some(stop_loss_bb);
        self
    }

    /// bb × buy-in depth, when both are present and positive.
    pub fn buyin_value(&self) -> Option<Money> {
        match (self.bb, self.buyin_bb) {
            (Some(bb), Some(depth)) if bb > 0.0 && depth > 0.0 => Some(bb * depth),
            _ => None,
        }
    }

    /// stop_loss_bb × bb, when both are present and positive.
    pub fn stop_loss_value(&self) -> Option<Money> {
        match (self.bb, self.stop_loss_bb) {
            (Some(bb), Some(sl)) if bb > 0.0 && sl > 0.0 => Some(bb * sl),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    #[serde(default)]
    pub horizon_hours:    Option<usize>,
    #[serde(default)]
    pub horizon_sessions: Option<usize>,
    pub model:            ModelKind,
    /// Free-form numeric parameters: mu_per_hr, sigma_per_session,
    /// nu, target_bankroll, ...
    #[serde(default)]
    pub params:           BTreeMap<String, f64>,
    pub bankroll_start:   Money,
    pub stake_profile:    StakeProfile,
    #[serde(default = "default_iterations")]
    pub iterations:       usize,
    #[serde(default)]
    pub seed:             Option<u64>,
    #[serde(default)]
    pub policy:           Option<String>,
}

fn default_iterations() -> usize {
    1_000
}

impl SimulationRequest {
    pub fn new(
        horizon: Horizon,
        model: ModelKind,
        bankroll_start: Money,
        stake_profile: StakeProfile,
        iterations: usize,
    ) -> Self {
        let (horizon_hours, horizon_sessions) = match horizon {
            Horizon::Hours(n)    => (Some(n), None),
            Horizon::Sessions(n) => (None, Some(n)),
        };
        Self {
            horizon_hours,
            horizon_sessions,
            model,
            params: BTreeMap::new(),
            bankroll_start,
            stake_profile,
            iterations,
            seed: None,
            policy: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_param(mut self, key: &str, value: f64) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }

    pub fn with_policy(mut self, name: &str) -> Self {
        self.policy = Some(name.to_string());
        self
    }

    pub fn param(&self, key: &str) -> Option<f64> {
        self.params.get(key).copied()
    }

    /// Exactly one of hours/sessions must be given, and be positive.
    pub fn horizon(&self) -> RiskResult<Horizon> {
        match (self.horizon_hours, self.horizon_sessions) {
            (Some(h), None) if h > 0 => Ok(Horizon::Hours(h)),
            (None, Some(s)) if s > 0 => Ok(Horizon::Sessions(s)),
            (Some(_), Some(_)) => Err(RiskError::invalid_parameter(
                "horizon_hours and horizon_sessions are mutually exclusive",
            )),
            (None, None) => Err(RiskError::invalid_parameter(
                "one of horizon_hours or horizon_sessions is required",
            )),
            _ => Err(RiskError::invalid_parameter("horizon must be at least one step")),
        }
    }

    /// Bound checks done before any allocation.
    pub fn validate(&self, max_iterations: usize) -> RiskResult<Horizon> {
        let horizon = self.horizon()?;
        if self.iterations == 0 || self.iterations > max_iterations {
            return Err(RiskError::invalid_parameter(format!(
                "iterations must be between 1 and {max_iterations}, got {}",
                self.iterations
            )));
        }
        if !self.bankroll_start.is_finite() {
            return Err(RiskError::invalid_parameter("bankroll_start must be finite"));
        }
        if let Some((key, value)) = self.params.iter().find(|(_, v)| !v.is_finite()) {
            return Err(RiskError::invalid_parameter(format!(
                "parameter '{key}' must be finite, got {value}"
            )));
        }
        Ok(horizon)
    }
}
