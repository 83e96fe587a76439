//! Session and ledger records supplied by the persistence collaborator.
//!
//! Net profit and duration are derived on demand, never stored.

use crate::types::{Cents, Instrument};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum duration of any session, in hours.
pub const MIN_SESSION_HOURS: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashSession {
    pub start_ts:         DateTime<Utc>,
    pub end_ts:           DateTime<Utc>,
    #[serde(default)]
    pub venue:            Option<String>,
    #[serde(default)]
    pub game:             Option<String>,
    #[serde(default)]
    pub small_blind:      Option<Cents>,
    #[serde(default)]
    pub big_blind:        Option<Cents>,
    pub buyin:            Cents,
    pub cashout:          Cents,
    #[serde(default)]
    pub tips:             Cents,
    /// Declared time in seat; overrides wall-clock duration when positive.
    #[serde(default)]
    pub seat_hours:       Option<f64>,
}

impl CashSession {
    pub fn net(&self) -> f64 {
        (self.cashout - self.buyin - self.tips) as f64
    }

    pub fn hours(&self) -> f64 {
        match self.seat_hours {
            Some(h) if h > 0.0 => h,
            _ => wall_clock_hours(self.start_ts, self.end_ts),
        }
    }

    pub fn hourly_rate(&self) -> f64 {
        self.net() / self.hours()
    }

    /// Display label for the stake, e.g. "1/3" for 100/300 cents.
    pub fn stake_label(&self) -> String {
        format!(
            "{}/{}",
            self.small_blind.unwrap_or(0) / 100,
            self.big_blind.unwrap_or(0) / 100
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentSession {
    pub start_ts:  DateTime<Utc>,
    pub end_ts:    DateTime<Utc>,
    #[serde(default)]
    pub venue:     Option<String>,
    #[serde(default)]
    pub format:    Option<String>,
    pub buyin:     Cents,
    #[serde(default)]
    pub fee:       Cents,
    #[serde(default)]
    pub reentries: u32,
    #[serde(default)]
    pub cash:      Cents,
    #[serde(default)]
    pub bounties:  Cents,
}

impl TournamentSession {
    /// Buy-in plus fee, paid once per entry.
    pub fn entry_cost(&self) -> Cents {
        self.buyin + self.fee
    }

    pub fn total_cost(&self) -> f64 {
        let entries = (self.reentries as i64 + 1).max(1);
        (self.entry_cost() * entries) as f64
    }

    pub fn net(&self) -> f64 {
        (self.cash + self.bounties) as f64 - self.total_cost()
    }

    /// Return on investment; `None` for freerolls.
    pub fn roi(&self) -> Option<f64> {
        let cost = self.total_cost();
        (cost > 0.0).then(|| self.net() / cost)
    }

    pub fn hours(&self) -> f64 {
        wall_clock_hours(self.start_ts, self.end_ts)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionRecord {
    Cash(CashSession),
    #[serde(alias = "mtt")]
    Tournament(TournamentSession),
}

impl SessionRecord {
    pub fn instrument(&self) -> Instrument {
        match self {
            Self::Cash(_)       => Instrument::Cash,
            Self::Tournament(_) => Instrument::Mtt,
        }
    }

    pub fn net(&self) -> f64 {
        match self {
            Self::Cash(s)       => s.net(),
            Self::Tournament(s) => s.net(),
        }
    }

    pub fn hours(&self) -> f64 {
        match self {
            Self::Cash(s)       => s.hours(),
            Self::Tournament(s) => s.hours(),
        }
    }

    pub fn start_ts(&self) -> DateTime<Utc> {
        match self {
            Self::Cash(s)       => s.start_ts,
            Self::Tournament(s) => s.start_ts,
        }
    }

    pub fn end_ts(&self) -> DateTime<Utc> {
        match self {
            Self::Cash(s)       => s.end_ts,
            Self::Tournament(s) => s.end_ts,
        }
    }

    pub fn venue(&self) -> Option<&str> {
        match self {
            Self::Cash(s)       => s.venue.as_deref(),
            Self::Tournament(s) => s.venue.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerKind {
    Deposit,
    Withdrawal,
    Transfer,
    Bonus,
}

/// A bankroll movement outside of play. `amount` is signed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub ts:     DateTime<Utc>,
    pub amount: Cents,
    pub kind:   LedgerKind,
    #[serde(default)]
    pub note:   Option<String>,
}

fn wall_clock_hours(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let secs = (end - start).num_milliseconds() as f64 / 1000.0;
    (secs / 3600.0).max(MIN_SESSION_HOURS)
}
