//! The risk engine: the single entry point a serving layer calls.
//!
//! RULES:
//!   - The engine holds configuration only; every call is independent.
//!   - History is rebuilt from the records handed in, per call.
//!   - All randomness flows through a request-seeded RngBank.
//!   - Nothing here performs I/O.

use crate::{
    alerts::{self, AlertReport, AlertRequest},
    config::RiskConfig,
    error::RiskResult,
    history::{HistoricalDistribution, SampleUnit},
    policy::{merge_policy_overrides, PolicyConfig, PolicyOverride},
    request::SimulationRequest,
    scenario::{self, ScenarioReport, ScenarioRequest},
    session::SessionRecord,
    simulation::{self, SimulationResult},
    stake_search::{self, StakeSearchOutcome, StakeSearchRequest},
    types::Instrument,
};

#[derive(Debug, Clone, Default)]
pub struct RiskEngine {
    pub config: RiskConfig,
}

impl RiskEngine {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// The policy a request runs under: the named (or default) base
    /// policy with any matching user override applied.
    pub fn resolve_policy(&self, name: Option<&str>, overrides: &[PolicyOverride]) -> PolicyConfig {
        let name = name.unwrap_or(&self.config.default_policy);
        merge_policy_overrides(self.config.base_policy(name), overrides)
    }

    pub fn simulate(
        &self,
        request: &SimulationRequest,
        records: &[SessionRecord],
        overrides: &[PolicyOverride],
    ) -> RiskResult<SimulationResult> {
        let history = HistoricalDistribution::from_records(records);
        let policy = self.resolve_policy(request.policy.as_deref(), overrides);
        log::debug!(
            "engine: simulate policy={} records={} overrides={}",
            policy.name,
            records.len(),
            overrides.len()
        );
        simulation::run_simulation(request, &history, &policy, &self.config)
    }

    pub fn search_stake(
        &self,
        request: &StakeSearchRequest,
        records: &[SessionRecord],
    ) -> RiskResult<StakeSearchOutcome> {
        let history = HistoricalDistribution::from_records(records);
        let samples = history.samples(Instrument::Cash, SampleUnit::Session)?;
        stake_search::search_stake(samples, request, &self.config)
    }

    pub fn scenario(
        &self,
        request: &ScenarioRequest,
        records: &[SessionRecord],
    ) -> RiskResult<ScenarioReport> {
        let history = HistoricalDistribution::from_records(records);
        let samples = history.samples(Instrument::Cash, SampleUnit::Session)?;
        scenario::run_scenario(samples, request, &self.config)
    }

    pub fn alerts(&self, request: &AlertRequest, records: &[SessionRecord]) -> RiskResult<AlertReport> {
        let history = HistoricalDistribution::from_records(records);
        let samples = history.samples(Instrument::Cash, SampleUnit::Session)?;
        alerts::evaluate_alerts(samples, request, &self.config)
    }
}
