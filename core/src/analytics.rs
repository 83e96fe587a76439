//! Descriptive session analytics: summary, bankroll timeline,
//! calendar histogram and per-dimension breakdown.
//!
//! Everything here is a pure fold over records; nothing is sampled.

use crate::{
    session::{LedgerEntry, SessionRecord},
    types::Money,
};
use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_profit:      Money,
    pub total_hours:       f64,
    /// Profit per hour across both instruments; 0 without play time.
    pub hourly_rate:       f64,
    /// Tournament profit over tournament entry costs, in percent.
    pub roi_pct:           f64,
    pub total_sessions:    usize,
    pub total_tournaments: usize,
}

pub fn summary(records: &[SessionRecord]) -> SessionSummary {
    let mut total_profit = 0.0;
    let mut total_hours = 0.0;
    let mut mtt_profit = 0.0;
    let mut mtt_cost = 0.0;
    let mut total_sessions = 0;
    let mut total_tournaments = 0;

    for record in records {
        total_profit += record.net();
        total_hours += record.hours();
        match record {
            SessionRecord::Cash(_) => total_sessions += 1,
            SessionRecord::Tournament(t) => {
                total_tournaments += 1;
                mtt_profit += t.net();
                mtt_cost += t.total_cost();
            }
        }
    }

    SessionSummary {
        total_profit,
        total_hours,
        hourly_rate: if total_hours > 0.0 { total_profit / total_hours } else { 0.0 },
        roi_pct: if mtt_cost > 0.0 { mtt_profit / mtt_cost * 100.0 } else { 0.0 },
        total_sessions,
        total_tournaments,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub ts:       DateTime<Utc>,
    pub bankroll: Money,
}

/// Running bankroll after every ledger movement and every session,
/// sessions counted at their end. Equal timestamps keep ledger
/// entries first, then records in input order.
pub fn bankroll_timeline(
    records: &[SessionRecord],
    ledger: &[LedgerEntry],
    starting: Money,
) -> Vec<TimelinePoint> {
    let mut events: Vec<(DateTime<Utc>, Money)> = ledger
        .iter()
        .map(|e| (e.ts, e.amount as f64))
        .chain(records.iter().map(|r| (r.end_ts(), r.net())))
        .collect();
    events.sort_by_key(|(ts, _)| *ts);

    let mut bankroll = starting;
    events
        .into_iter()
        .map(|(ts, delta)| {
            bankroll += delta;
            TimelinePoint { ts, bankroll }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistogramBin {
    Day,
    Week,
    Month,
    Year,
}

impl HistogramBin {
    /// Bin key for a timestamp: `2024-03-01`, `2024-W09`, `2024-03`, `2024`.
    pub fn key(&self, ts: DateTime<Utc>) -> String {
        match self {
            Self::Day => ts.format("%Y-%m-%d").to_string(),
            Self::Week => {
                let week = ts.iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
            Self::Month => ts.format("%Y-%m").to_string(),
            Self::Year => ts.format("%Y").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramRow {
    pub bin:    String,
    pub profit: Money,
    pub count:  usize,
}

/// Net profit per calendar bin of session start, sorted by bin key.
pub fn histogram(records: &[SessionRecord], bin: HistogramBin) -> Vec<HistogramRow> {
    let mut buckets: BTreeMap<String, (Money, usize)> = BTreeMap::new();
    for record in records {
        let entry = buckets.entry(bin.key(record.start_ts())).or_default();
        entry.0 += record.net();
        entry.1 += 1;
    }
    buckets
        .into_iter()
        .map(|(bin, (profit, count))| HistogramRow { bin, profit, count })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Venue,
    Stake,
    Game,
    #[serde(alias = "dow")]
    DayOfWeek,
    #[serde(alias = "tod")]
    TimeOfDay,
}

const UNKNOWN: &str = "Unknown";

pub fn time_of_day(hour: u32) -> &'static str {
    match hour {
        0..=5 => "Overnight",
        6..=11 => "Morning",
        12..=17 => "Afternoon",
        _ => "Evening",
    }
}

impl Dimension {
    pub fn key(&self, record: &SessionRecord) -> String {
        match (self, record) {
            (Self::Venue, r) => r.venue().unwrap_or(UNKNOWN).to_string(),
            (Self::Stake, SessionRecord::Cash(s)) => s.stake_label(),
            (Self::Stake, SessionRecord::Tournament(t)) => {
                format!("ABI {:.2}", t.entry_cost() as f64 / 100.0)
            }
            (Self::Game, SessionRecord::Cash(s)) => s.game.clone().unwrap_or_else(|| UNKNOWN.to_string()),
            (Self::Game, SessionRecord::Tournament(t)) => {
                t.format.clone().unwrap_or_else(|| UNKNOWN.to_string())
            }
            (Self::DayOfWeek, r) => r.start_ts().format("%A").to_string(),
            (Self::TimeOfDay, r) => time_of_day(r.start_ts().hour()).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownRow {
    pub key:    String,
    pub profit: Money,
    pub hours:  f64,
    pub count:  usize,
}

/// Profit, hours and count per dimension value, most profitable first.
pub fn breakdown(records: &[SessionRecord], dimension: Dimension) -> Vec<BreakdownRow> {
    let mut buckets: BTreeMap<String, BreakdownRow> = BTreeMap::new();
    for record in records {
        let key = dimension.key(record);
        let row = buckets.entry(key.clone()).or_insert_with(|| BreakdownRow {
            key,
            profit: 0.0,
            hours:  0.0,
            count:  0,
        });
        row.profit += record.net();
        row.hours += record.hours();
        row.count += 1;
    }
    let mut rows: Vec<BreakdownRow> = buckets.into_values().collect();
    rows.sort_by(|a, b| b.profit.total_cmp(&a.profit));
    rows
}
