//! History builder tests: records in, sample arrays out.

use bankroll_core::{
    error::RiskError,
    history::{HistoricalDistribution, SampleUnit},
    session::{CashSession, SessionRecord, TournamentSession, MIN_SESSION_HOURS},
    types::Instrument,
};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
}

fn cash(day: u32, net: i64, hours: i64, bb: Option<i64>) -> SessionRecord {
    let start = at(day, 18);
    SessionRecord::Cash(CashSession {
        start_ts:    start,
        end_ts:      start + Duration::hours(hours),
        venue:       None,
        game:        None,
        small_blind: bb.map(|b| b / 2),
        big_blind:   bb,
        buyin:       30_000,
        cashout:     30_000 + net,
        tips:        0,
        seat_hours:  None,
    })
}

fn mtt(day: u32, buyin: i64, fee: i64, reentries: u32, cash: i64) -> SessionRecord {
    let start = at(day, 12);
    SessionRecord::Tournament(TournamentSession {
        start_ts:  start,
        end_ts:    start + Duration::hours(6),
        venue:     None,
        format:    Some("MTT".into()),
        buyin,
        fee,
        reentries,
        cash,
        bounties:  0,
    })
}

#[test]
fn builder_is_idempotent() {
    let records = vec![
        cash(1, 5_000, 4, Some(300)),
        mtt(2, 10_000, 1_000, 0, 25_000),
        cash(3, -2_000, 2, Some(200)),
    ];
    let a = HistoricalDistribution::from_records(&records);
    let b = HistoricalDistribution::from_records(&records);
    assert_eq!(a, b, "Same records must produce identical sample arrays");
}

#[test]
fn cash_arrays_follow_record_order() {
    let records = vec![
        cash(1, 5_000, 4, Some(300)),
        mtt(2, 10_000, 1_000, 0, 0),
        cash(3, -2_000, 2, Some(300)),
    ];
    let history = HistoricalDistribution::from_records(&records);

    assert_eq!(history.cash.per_session, vec![5_000.0, -2_000.0]);
    assert_eq!(history.cash.per_hour, vec![1_250.0, -1_000.0]);
    assert_eq!(history.cash.hours_per_session, vec![4.0, 2.0]);
    assert_eq!(history.cash.average_hours_per_session(), Some(3.0));
}

#[test]
fn net_subtracts_tips() {
    let mut session = match cash(1, 1_000, 3, Some(300)) {
        SessionRecord::Cash(s) => s,
        SessionRecord::Tournament(_) => unreachable!(),
    };
    session.tips = 200;
    assert_eq!(session.net(), 800.0);
}

#[test]
fn seat_hours_override_wall_clock() {
    let mut session = match cash(1, 900, 6, Some(300)) {
        SessionRecord::Cash(s) => s,
        SessionRecord::Tournament(_) => unreachable!(),
    };
    session.seat_hours = Some(3.0);
    let history = HistoricalDistribution::from_records(&[SessionRecord::Cash(session)]);
    assert_eq!(history.cash.per_hour, vec![300.0]);
}

#[test]
fn zero_length_session_is_floored() {
    let start = at(1, 18);
    let session = CashSession {
        start_ts:    start,
        end_ts:      start,
        venue:       None,
        game:        None,
        small_blind: None,
        big_blind:   None,
        buyin:       10_000,
        cashout:     10_100,
        tips:        0,
        seat_hours:  None,
    };
    assert_eq!(session.hours(), MIN_SESSION_HOURS);
    assert!(session.hourly_rate().is_finite());
}

#[test]
fn tournament_cost_counts_every_entry() {
    let history = HistoricalDistribution::from_records(&[
        mtt(1, 10_000, 1_000, 2, 50_000),
        mtt(2, 10_000, 1_000, 0, 0),
    ]);
    // 3 entries x 110.00 = 330.00 cost
    assert_eq!(history.tournament.per_tournament, vec![50_000.0 - 33_000.0, -11_000.0]);
    assert_eq!(history.tournament.roi.len(), 2);
    assert!((history.tournament.roi[0] - 17_000.0 / 33_000.0).abs() < 1e-12);
}

#[test]
fn freeroll_has_no_roi() {
    let history = HistoricalDistribution::from_records(&[mtt(1, 0, 0, 0, 5_000)]);
    assert_eq!(history.tournament.per_tournament, vec![5_000.0]);
    assert!(history.tournament.roi.is_empty(), "Freerolls must not produce a ROI sample");
}

#[test]
fn stake_buckets_group_by_big_blind() {
    let history = HistoricalDistribution::from_records(&[
        cash(1, 100, 2, Some(300)),
        cash(2, 200, 2, Some(200)),
        cash(3, 300, 2, None),
        cash(4, 400, 2, Some(300)),
    ]);
    let buckets = history.non_empty_stake_buckets().expect("buckets");
    let keys: Vec<_> = buckets.iter().map(|(k, _)| *k).collect();
    assert_eq!(keys, vec![None, Some(200), Some(300)], "Buckets must iterate in key order");
    assert_eq!(buckets[2].1, &[100.0, 400.0]);
}

#[test]
fn empty_history_reports_insufficient_data() {
    let history = HistoricalDistribution::from_records(&[]);
    assert!(history.raw_samples(Instrument::Cash, SampleUnit::Session).expect("raw").is_empty());
    assert!(matches!(
        history.samples(Instrument::Cash, SampleUnit::Session),
        Err(RiskError::InsufficientData { .. })
    ));
    assert!(matches!(
        history.non_empty_stake_buckets(),
        Err(RiskError::InsufficientData { .. })
    ));
}

#[test]
fn cash_has_no_tournament_unit() {
    let history = HistoricalDistribution::from_records(&[cash(1, 100, 2, Some(300))]);
    assert!(matches!(
        history.raw_samples(Instrument::Cash, SampleUnit::Tournament),
        Err(RiskError::InvalidParameter { .. })
    ));
}

#[test]
fn sample_stats_use_sample_std() {
    let history = HistoricalDistribution::from_records(&[
        cash(1, 100, 2, Some(300)),
        cash(2, 300, 2, Some(300)),
    ]);
    let stats = history.stats(Instrument::Cash, SampleUnit::Session).expect("stats");
    assert_eq!(stats.count, 2);
    assert_eq!(stats.mean, 200.0);
    assert_eq!(stats.median, 200.0);
    assert!((stats.std - 141.421_356_237_309_5).abs() < 1e-9);
}

#[test]
fn records_deserialize_from_tagged_json() {
    let json = r#"[
        {"type": "cash", "start_ts": "2024-01-01T18:00:00Z", "end_ts": "2024-01-01T22:00:00Z",
         "big_blind": 300, "buyin": 30000, "cashout": 35000},
        {"type": "mtt", "start_ts": "2024-01-02T12:00:00Z", "end_ts": "2024-01-02T18:00:00Z",
         "buyin": 10000, "fee": 1000, "cash": 0}
    ]"#;
    let records: Vec<SessionRecord> = serde_json::from_str(json).expect("parse records");
    assert_eq!(records[0].instrument(), Instrument::Cash);
    assert_eq!(records[0].net(), 5_000.0);
    assert_eq!(records[1].instrument(), Instrument::Mtt);
    assert_eq!(records[1].net(), -11_000.0);
}
