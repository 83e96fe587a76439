//! RiskSummary: what a simulation hands back to the serving layer.
//!
//! Values are never rounded here; presentation rounds.

use crate::{
    error::RiskResult,
    metrics::{DrawdownStats, Spread},
    policy::StakeRecommendation,
    request::ModelKind,
    types::Money,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StakePayload {
    Recommended(StakeRecommendation),
    /// The policy engine could not value the stake; the reason says why.
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub model:              ModelKind,
    pub seed:               u64,
    pub iterations:         usize,
    pub steps:              usize,
    pub bankroll_start:     Money,
    pub ending:             Spread,
    pub total_pnl:          Spread,
    pub risk_of_ruin_pct:   f64,
    pub ruin_threshold:     Money,
    pub ruin_fallback_used: bool,
    pub var_loss:           f64,
    pub cvar_loss:          f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prob_hit_target_pct: Option<f64>,
    pub drawdown:           DrawdownStats,
    pub recommended_stake:  StakePayload,
}

impl RiskSummary {
    /// Flat key/value view, nested fields joined with '.',
    /// e.g. `ending.median`, `recommended_stake.action`.
    pub fn to_flat_report(&self) -> RiskResult<BTreeMap<String, Value>> {
        let mut out = BTreeMap::new();
        flatten_into(&mut out, None, serde_json::to_value(self)?);
        Ok(out)
    }
}

fn flatten_into(out: &mut BTreeMap<String, Value>, prefix: Option<&str>, value: Value) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                let path = match prefix {
                    Some(p) => format!("{p}.{key}"),
                    None => key,
                };
                flatten_into(out, Some(path.as_str()), inner);
            }
        }
        leaf => {
            out.insert(prefix.unwrap_or_default().to_string(), leaf);
        }
    }
}
