//! Bankroll policies and the hysteresis stake recommendation.
//!
//! A policy names how deep a bankroll must be, in buy-ins (cash)
//! or average buy-ins (tournaments), to sit at the current stake.
//! The hysteresis band around that requirement is a no-action zone
//! so the recommendation does not flip on every small swing.

use crate::{
    error::{RiskError, RiskResult},
    request::StakeProfile,
    types::{Instrument, Money},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub name:                 String,
    pub cash_buyins_required: u32,
    pub mtt_abis_required:    u32,
    pub hysteresis_pct:       f64,
}

impl PolicyConfig {
    pub fn new(name: &str, cash_buyins_required: u32, mtt_abis_required: u32, hysteresis_pct: f64) -> Self {
        Self {
            name: name.to_string(),
            cash_buyins_required,
            mtt_abis_required,
            hysteresis_pct,
        }
    }

    pub fn builtin() -> Vec<Self> {
        vec![
            Self::new("aggressive", 25, 100, 0.1),
            Self::new("medium", 50, 200, 0.1),
            Self::new("cautious", 100, 400, 0.1),
        ]
    }

    /// Used for names that match neither a built-in nor an override.
    pub fn fallback(name: &str) -> Self {
        Self::new(name, 50, 200, 0.1)
    }

    pub fn required_units(&self, instrument: Instrument) -> f64 {
        match instrument {
            Instrument::Cash => self.cash_buyins_required as f64,
            Instrument::Mtt  => self.mtt_abis_required as f64,
        }
    }
}

/// A per-user policy row from the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyOverride {
    pub policy_name:          String,
    pub cash_buyins_required: u32,
    pub mtt_abis_required:    u32,
    #[serde(default)]
    pub hysteresis_pct:       Option<f64>,
}

/// The first override with a matching name wins; an override without
/// a band (or with a zero band) inherits the base policy's band.
pub fn merge_policy_overrides(base: PolicyConfig, overrides: &[PolicyOverride]) -> PolicyConfig {
    match overrides.iter().find(|o| o.policy_name == base.name) {
        Some(o) => PolicyConfig {
            name:                 o.policy_name.clone(),
            cash_buyins_required: o.cash_buyins_required,
            mtt_abis_required:    o.mtt_abis_required,
            hysteresis_pct:       o
                .hysteresis_pct
                .filter(|h| *h > 0.0)
                .unwrap_or(base.hysteresis_pct),
        },
        None => base,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StakeAction {
    Downgrade,
    Hold,
    Upgrade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakeRecommendation {
    pub policy:         String,
    pub action:         StakeAction,
    pub reason:         String,
    /// Bankroll expressed in buy-ins (cash) or ABIs (tournaments).
    pub current_units:  f64,
    pub required_units: f64,
}

/// The value of one unit for this profile: bb × depth for cash
/// (depth defaulting to `default_buyin_bb`), ABI for tournaments.
pub fn unit_value(profile: &StakeProfile, default_buyin_bb: f64) -> RiskResult<Money> {
    let value = match profile.instrument {
        Instrument::Cash => {
            let bb = profile.bb.unwrap_or(0.0);
            let depth = profile.buyin_bb.filter(|d| *d > 0.0).unwrap_or(default_buyin_bb);
            bb * depth
        }
        Instrument::Mtt => profile.abi.unwrap_or(0.0),
    };
    if !(value > 0.0) {
        return Err(RiskError::insufficient_stake_metadata(match profile.instrument {
            Instrument::Cash => "cash stake needs a positive big blind to value a buy-in",
            Instrument::Mtt  => "tournament stake needs a positive average buy-in",
        }));
    }
    Ok(value)
}

pub fn stake_recommendation(
    bankroll: Money,
    profile: &StakeProfile,
    policy: &PolicyConfig,
    default_buyin_bb: f64,
) -> RiskResult<StakeRecommendation> {
    let unit = unit_value(profile, default_buyin_bb)?;
    let unit_label = match profile.instrument {
        Instrument::Cash => "buy-ins",
        Instrument::Mtt  => "ABI",
    };
    let required = policy.required_units(profile.instrument);
    let h = policy.hysteresis_pct;
    let current = bankroll / unit;
    let lower = required * (1.0 - h);
    let upper = required * (1.0 + h);

    let (action, reason) = if current < lower {
        (
            StakeAction::Downgrade,
            format!("Bankroll {current:.1} {unit_label} < {lower:.1}"),
        )
    } else if current > upper {
        (
            StakeAction::Upgrade,
            format!("Bankroll {current:.1} {unit_label} > {upper:.1}"),
        )
    } else {
        (
            StakeAction::Hold,
            format!("Bankroll {current:.1} {unit_label} within policy band"),
        )
    };

    Ok(StakeRecommendation {
        policy: policy.name.clone(),
        action,
        reason,
        current_units: current,
        required_units: required,
    })
}
