//! History builder: session records to empirical sample arrays.
//!
//! Pure and idempotent: the same record sequence always yields the
//! same arrays, in record order. The resulting HistoricalDistribution
//! is never mutated after construction.

use crate::{
    error::{RiskError, RiskResult},
    session::{CashSession, SessionRecord, TournamentSession},
    stats::SampleStats,
    types::{Instrument, StakeKey},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The unit one simulation step represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleUnit {
    Hour,
    Session,
    Tournament,
}

impl SampleUnit {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hour       => "per-hour",
            Self::Session    => "per-session",
            Self::Tournament => "per-tournament",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CashHistory {
    pub per_session:       Vec<f64>,
    pub per_hour:          Vec<f64>,
    pub hours_per_session: Vec<f64>,
    /// Ordered by key so mixture sampling is reproducible.
    pub stake_samples:     BTreeMap<StakeKey, Vec<f64>>,
}

impl CashHistory {
    pub fn from_sessions<'a>(sessions: impl IntoIterator<Item = &'a CashSession>) -> Self {
        let mut history = Self::default();
        for session in sessions {
            let net = session.net();
            let hours = session.hours();
            history.per_session.push(net);
            history.per_hour.push(net / hours);
            history.hours_per_session.push(hours);
            history
                .stake_samples
                .entry(session.big_blind)
                .or_default()
                .push(net);
        }
        history
    }

    pub fn average_hours_per_session(&self) -> Option<f64> {
        if self.hours_per_session.is_empty() {
            return None;
        }
        Some(crate::stats::mean(&self.hours_per_session))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TournamentHistory {
    pub per_tournament: Vec<f64>,
    pub roi:            Vec<f64>,
}

impl TournamentHistory {
    pub fn from_sessions<'a>(sessions: impl IntoIterator<Item = &'a TournamentSession>) -> Self {
        let mut history = Self::default();
        for session in sessions {
            history.per_tournament.push(session.net());
            if let Some(roi) = session.roi() {
                history.roi.push(roi);
            }
        }
        history
    }
}

/// Immutable per-request snapshot of the player's history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoricalDistribution {
    pub cash:       CashHistory,
    pub tournament: TournamentHistory,
}

impl HistoricalDistribution {
    pub fn new(cash: CashHistory, tournament: TournamentHistory) -> Self {
        Self { cash, tournament }
    }

    /// Build from a mixed record sequence; records are partitioned
    /// by instrument and keep their relative order.
    pub fn from_records(records: &[SessionRecord]) -> Self {
        let cash = CashHistory::from_sessions(records.iter().filter_map(|r| match r {
            SessionRecord::Cash(s) => Some(s),
            SessionRecord::Tournament(_) => None,
        }));
        let tournament = TournamentHistory::from_sessions(records.iter().filter_map(|r| match r {
            SessionRecord::Tournament(s) => Some(s),
            SessionRecord::Cash(_) => None,
        }));
        log::debug!(
            "history: cash_sessions={} tournaments={} stake_buckets={}",
            cash.per_session.len(),
            tournament.per_tournament.len(),
            cash.stake_samples.len()
        );
        Self { cash, tournament }
    }

    /// The raw array for an instrument/unit pair, possibly empty.
    pub fn raw_samples(&self, instrument: Instrument, unit: SampleUnit) -> RiskResult<&[f64]> {
        match (instrument, unit) {
            (Instrument::Cash, SampleUnit::Hour)       => Ok(&self.cash.per_hour),
            (Instrument::Cash, SampleUnit::Session)    => Ok(&self.cash.per_session),
            (Instrument::Mtt, SampleUnit::Tournament)
            | (Instrument::Mtt, SampleUnit::Session)   => Ok(&self.tournament.per_tournament),
            (instrument, unit) => Err(RiskError::invalid_parameter(format!(
                "{} samples are not defined for {}",
                unit.name(),
                instrument.name()
            ))),
        }
    }

    /// The array a sampler needs; fails when it is empty.
    pub fn samples(&self, instrument: Instrument, unit: SampleUnit) -> RiskResult<&[f64]> {
        let samples = self.raw_samples(instrument, unit)?;
        if samples.is_empty() {
            return Err(RiskError::insufficient_data(format!(
                "no {} {} samples in history",
                instrument.name(),
                unit.name()
            )));
        }
        Ok(samples)
    }

    /// Stake buckets that hold at least one sample, in key order.
    pub fn non_empty_stake_buckets(&self) -> RiskResult<Vec<(StakeKey, &[f64])>> {
        let buckets: Vec<(StakeKey, &[f64])> = self
            .cash
            .stake_samples
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (*k, v.as_slice()))
            .collect();
        if buckets.is_empty() {
            return Err(RiskError::insufficient_data(
                "no stake bucket has data for mixture sampling",
            ));
        }
        Ok(buckets)
    }

    pub fn stats(&self, instrument: Instrument, unit: SampleUnit) -> RiskResult<SampleStats> {
        Ok(SampleStats::from_samples(self.samples(instrument, unit)?))
    }
}
