//! Live-session alerts.
//!
//! Three independent checks, each emitting exactly one alert whether
//! or not it trips, so a caller always gets a full status board:
//! session stop-loss, weekly drawdown cap, risk of ruin at the live
//! stake.

use crate::{
    config::RiskConfig,
    error::{RiskError, RiskResult},
    rng::StreamSlot,
    stake_search::StakeEvaluator,
    types::Money,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Danger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    StopLoss,
    WeeklyDrawdown,
    RiskOfRuin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub kind:     AlertKind,
    pub severity: Severity,
    pub title:    String,
    pub message:  String,
}

impl Alert {
    pub fn is_triggered(&self) -> bool {
        self.severity != Severity::Info
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// Per-session loss limit, a positive magnitude.
    pub stop_loss:     Money,
    pub weekly_cap:    Money,
    pub ror_limit_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LiveFigures {
    #[serde(default)]
    pub current_session_pnl: Money,
    #[serde(default)]
    pub week_to_date_pnl:    Option<Money>,
    /// Session results of the recent window, oldest first.
    #[serde(default)]
    pub recent_sessions:     Option<Vec<Money>>,
}

impl LiveFigures {
    /// Drawdown from the session list when one is given, otherwise the
    /// loss implied by the week-to-date figure.
    pub fn weekly_drawdown(&self) -> Money {
        match &self.recent_sessions {
            Some(list) if !list.is_empty() => weekly_drawdown_from_list(list),
            _ => (-self.week_to_date_pnl.unwrap_or(0.0)).max(0.0),
        }
    }
}

/// Inputs for the ruin check at the live stake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RorCheck {
    pub bankroll_start:   Money,
    pub horizon_sessions: usize,
    pub iterations:       usize,
    /// Big blind the history was played at.
    pub current_bb:       Money,
    /// Big blind being played now.
    pub live_bb:          Money,
    #[serde(default)]
    pub seed:             Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRequest {
    pub thresholds: AlertThresholds,
    #[serde(default)]
    pub live:       LiveFigures,
    pub ror_check:  RorCheck,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertReport {
    pub alerts:            Vec<Alert>,
    pub weekly_drawdown:   Money,
    pub estimated_ror_pct: f64,
}

impl AlertReport {
    pub fn triggered(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().filter(|a| a.is_triggered())
    }
}

/// Deepest fall of the running total below its running peak, where
/// the window starts flat at zero.
pub fn weekly_drawdown_from_list(sessions: &[Money]) -> Money {
    let mut total = 0.0f64;
    let mut peak = 0.0f64;
    let mut worst = 0.0f64;
    for pnl in sessions {
        total += pnl;
        peak = peak.max(total);
        worst = worst.max(peak - total);
    }
    worst
}

pub fn stop_loss_alert(current_pnl: Money, stop_loss: Money) -> Alert {
    if current_pnl <= -stop_loss {
        Alert {
            kind:     AlertKind::StopLoss,
            severity: Severity::Danger,
            title:    "Session stop-loss hit".to_string(),
            message:  format!(
                "Current session PnL {current_pnl:.2} <= -{stop_loss:.2}. Stop the session."
            ),
        }
    } else {
        Alert {
            kind:     AlertKind::StopLoss,
            severity: Severity::Info,
            title:    "Session OK".to_string(),
            message:  format!("Current session PnL {current_pnl:.2} above stop-loss (-{stop_loss:.2})."),
        }
    }
}

pub fn weekly_drawdown_alert(drawdown: Money, cap: Money) -> Alert {
    if drawdown > cap {
        Alert {
            kind:     AlertKind::WeeklyDrawdown,
            severity: Severity::Warning,
            title:    "Weekly drawdown breach".to_string(),
            message:  format!(
                "Weekly drawdown {drawdown:.2} exceeds cap {cap:.2}. Take a break or move down."
            ),
        }
    } else {
        Alert {
            kind:     AlertKind::WeeklyDrawdown,
            severity: Severity::Info,
            title:    "Weekly drawdown OK".to_string(),
            message:  format!("Weekly drawdown {drawdown:.2} within cap {cap:.2}."),
        }
    }
}

pub fn ror_alert(ror_pct: f64, limit_pct: f64) -> Alert {
    if ror_pct > limit_pct {
        Alert {
            kind:     AlertKind::RiskOfRuin,
            severity: Severity::Danger,
            title:    "Risk of ruin above policy".to_string(),
            message:  format!("Estimated RoR {ror_pct:.2}% exceeds policy {limit_pct:.2}%."),
        }
    } else {
        Alert {
            kind:     AlertKind::RiskOfRuin,
            severity: Severity::Info,
            title:    "Risk of ruin OK".to_string(),
            message:  format!("Estimated RoR {ror_pct:.2}% within policy {limit_pct:.2}%."),
        }
    }
}

pub fn evaluate_alerts(
    samples: &[f64],
    request: &AlertRequest,
    config: &RiskConfig,
) -> RiskResult<AlertReport> {
    let check = &request.ror_check;
    if check.iterations > config.max_iterations {
        return Err(RiskError::invalid_parameter(format!(
            "iterations must be at most {}, got {}",
            config.max_iterations, check.iterations
        )));
    }
    if !(check.live_bb > 0.0) {
        return Err(RiskError::invalid_parameter(format!(
            "live_bb must be positive, got {}",
            check.live_bb
        )));
    }

    let evaluator = StakeEvaluator::new(
        samples,
        check.current_bb,
        check.bankroll_start,
        check.horizon_sessions,
        check.iterations,
        check.seed.unwrap_or(config.default_seed),
        StreamSlot::Alerts,
    )?;
    let estimated_ror_pct = evaluator.ror_at(check.live_bb)? * 100.0;
    let weekly_drawdown = request.live.weekly_drawdown();

    let alerts = vec![
        stop_loss_alert(request.live.current_session_pnl, request.thresholds.stop_loss),
        weekly_drawdown_alert(weekly_drawdown, request.thresholds.weekly_cap),
        ror_alert(estimated_ror_pct, request.thresholds.ror_limit_pct),
    ];

    for alert in alerts.iter().filter(|a| a.is_triggered()) {
        log::warn!("alerts: {:?} {}", alert.severity, alert.message);
    }
    log::info!(
        "alerts: weekly_dd={weekly_drawdown:.2} ror={estimated_ror_pct:.2}% triggered={}",
        alerts.iter().filter(|a| a.is_triggered()).count()
    );

    Ok(AlertReport {
        alerts,
        weekly_drawdown,
        estimated_ror_pct,
    })
}
