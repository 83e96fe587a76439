//! Sampler and model-selection tests.

use bankroll_core::{
    distribution::{model_for_request, DistributionModel, StepMatrix},
    engine::RiskEngine,
    error::RiskError,
    history::HistoricalDistribution,
    request::{Horizon, ModelKind, SimulationRequest, StakeProfile},
    rng::{RngBank, StreamSlot},
    session::{CashSession, SessionRecord, TournamentSession},
};
use chrono::{Duration, TimeZone, Utc};

fn cash_records(nets: &[i64], bb: i64) -> Vec<SessionRecord> {
    let base = Utc.with_ymd_and_hms(2024, 2, 1, 19, 0, 0).unwrap();
    nets.iter()
        .enumerate()
        .map(|(i, &net)| {
            let start = base + Duration::days(i as i64);
            SessionRecord::Cash(CashSession {
                start_ts:    start,
                end_ts:      start + Duration::hours(5),
                venue:       None,
                game:        None,
                small_blind: Some(bb / 2),
                big_blind:   Some(bb),
                buyin:       bb * 100,
                cashout:     bb * 100 + net,
                tips:        0,
                seat_hours:  Some(1.0),
            })
        })
        .collect()
}

fn mtt_record() -> SessionRecord {
    let start = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap();
    SessionRecord::Tournament(TournamentSession {
        start_ts:  start,
        end_ts:    start + Duration::hours(6),
        venue:     None,
        format:    None,
        buyin:     10_000,
        fee:       1_000,
        reentries: 0,
        cash:      40_000,
        bounties:  0,
    })
}

fn cash_request(horizon: Horizon, model: ModelKind) -> SimulationRequest {
    SimulationRequest::new(horizon, model, 100_000.0, StakeProfile::cash(300.0, 100.0), 200).with_seed(9)
}

#[test]
fn bootstrap_only_draws_historical_values() {
    let samples = [-500.0, 250.0, 1_000.0];
    let model = DistributionModel::bootstrap(&samples).expect("bootstrap");
    let mut rng = RngBank::new(1).for_stream(StreamSlot::Simulation);
    let steps = model.draw(100, 20, &mut rng).expect("draw");

    assert_eq!(steps.iterations(), 100);
    assert_eq!(steps.steps(), 20);
    assert!(steps.values().iter().all(|v| samples.contains(v)));
}

#[test]
fn empty_bootstrap_is_insufficient_data() {
    assert!(matches!(
        DistributionModel::bootstrap(&[]),
        Err(RiskError::InsufficientData { .. })
    ));

    let engine = RiskEngine::default();
    let request = cash_request(Horizon::Sessions(10), ModelKind::Bootstrap);
    assert!(matches!(
        engine.simulate(&request, &[], &[]),
        Err(RiskError::InsufficientData { .. })
    ));
}

#[test]
fn student_t_rejects_two_degrees_of_freedom() {
    assert!(matches!(
        DistributionModel::student_t(0.0, 1.0, 2.0),
        Err(RiskError::InvalidParameter { .. })
    ));

    let engine = RiskEngine::default();
    let request = cash_request(Horizon::Sessions(10), ModelKind::Tstudent)
        .with_param("mu_per_session", 100.0)
        .with_param("sigma_per_session", 400.0)
        .with_param("nu", 2.0);
    assert!(matches!(
        engine.simulate(&request, &[], &[]),
        Err(RiskError::InvalidParameter { .. })
    ));
}

#[test]
fn student_t_defaults_nu_and_uses_history_moments() {
    let records = cash_records(&[200, -150, 400, -300, 250], 300);
    let history = HistoricalDistribution::from_records(&records);
    let request = cash_request(Horizon::Sessions(10), ModelKind::Tstudent);
    let horizon = request.horizon().expect("horizon");

    match model_for_request(&request, horizon, &history, 5.0).expect("model") {
        DistributionModel::StudentT { mu, nu, .. } => {
            assert_eq!(nu, 5.0);
            assert!((mu - 80.0).abs() < 1e-9, "mu should be the session mean, got {mu}");
        }
        other => panic!("Expected Student-t, got {}", other.name()),
    }
}

#[test]
fn missing_sigma_falls_back_to_sample_std() {
    let records = cash_records(&[200, -150, 400, -300, 250], 300);
    let history = HistoricalDistribution::from_records(&records);
    // Deviations 120, -230, 320, -380, 170: sum of squares 343,000 over n - 1.
    let expected_sigma = (343_000.0f64 / 4.0).sqrt();

    for model in [ModelKind::Normal, ModelKind::Tstudent] {
        let request = cash_request(Horizon::Sessions(10), model);
        let horizon = request.horizon().expect("horizon");
        let (mu, sigma) = match model_for_request(&request, horizon, &history, 5.0).expect("model") {
            DistributionModel::Normal { mu, sigma } => (mu, sigma),
            DistributionModel::StudentT { mu, sigma, .. } => (mu, sigma),
            other => panic!("Unexpected model {}", other.name()),
        };
        assert!((mu - 80.0).abs() < 1e-9, "{model:?} mu should be 80, got {mu}");
        assert!(
            (sigma - expected_sigma).abs() < 1e-9,
            "{model:?} sigma should be the ddof=1 std 292.831, got {sigma}"
        );
    }
}

#[test]
fn student_t_draws_are_shifted_and_scaled_standard_t() {
    let standard = DistributionModel::student_t(0.0, 1.0, 6.0).expect("standard t");
    let scaled = DistributionModel::student_t(150.0, 40.0, 6.0).expect("scaled t");

    let mut rng_a = RngBank::new(17).for_stream(StreamSlot::Simulation);
    let mut rng_b = RngBank::new(17).for_stream(StreamSlot::Simulation);
    let base = standard.draw(20, 15, &mut rng_a).expect("draw standard");
    let draws = scaled.draw(20, 15, &mut rng_b).expect("draw scaled");

    for (t, x) in base.values().iter().zip(draws.values()) {
        assert!((x - (150.0 + 40.0 * t)).abs() < 1e-9, "Draw {x} is not 150 + 40 x {t}");
    }
}

#[test]
fn normal_without_params_or_history_is_insufficient_data() {
    let engine = RiskEngine::default();
    let request = cash_request(Horizon::Hours(10), ModelKind::Normal).with_param("mu_per_hr", 50.0);
    assert!(matches!(
        engine.simulate(&request, &[], &[]),
        Err(RiskError::InsufficientData { .. })
    ));
}

#[test]
fn normal_with_zero_sigma_is_constant() {
    let model = DistributionModel::normal(100.0, 0.0).expect("normal");
    let mut rng = RngBank::new(3).for_stream(StreamSlot::Simulation);
    let steps = model.draw(10, 10, &mut rng).expect("draw");
    assert!(steps.values().iter().all(|v| *v == 100.0));
    assert_eq!(steps.std(), 0.0);
}

#[test]
fn negative_sigma_is_rejected() {
    assert!(matches!(
        DistributionModel::normal(0.0, -1.0),
        Err(RiskError::InvalidParameter { .. })
    ));
}

#[test]
fn mixture_is_unsupported_for_tournaments() {
    let engine = RiskEngine::default();
    let request = SimulationRequest::new(
        Horizon::Sessions(10),
        ModelKind::Mixture,
        100_000.0,
        StakeProfile::tournament(11_000.0),
        100,
    );
    assert!(matches!(
        engine.simulate(&request, &[mtt_record()], &[]),
        Err(RiskError::UnsupportedModel { .. })
    ));
}

#[test]
fn mixture_draws_from_stake_buckets() {
    let mut records = cash_records(&[100, 200], 200);
    records.extend(cash_records(&[-300, 900, 50], 300));
    let history = HistoricalDistribution::from_records(&records);
    let request = cash_request(Horizon::Sessions(10), ModelKind::Mixture);
    let horizon = request.horizon().expect("horizon");

    let model = model_for_request(&request, horizon, &history, 5.0).expect("mixture");
    let mut rng = RngBank::new(5).for_stream(StreamSlot::Simulation);
    let steps = model.draw(200, 10, &mut rng).expect("draw");

    let allowed = [100.0, 200.0, -300.0, 900.0, 50.0];
    assert!(steps.values().iter().all(|v| allowed.contains(v)));
    assert!(steps.values().contains(&100.0) && steps.values().contains(&900.0));
}

#[test]
fn mixture_picks_buckets_by_sample_count() {
    let mut records = cash_records(&[1], 100);
    records.extend(cash_records(&[2; 9], 200));
    let history = HistoricalDistribution::from_records(&records);
    let request = cash_request(Horizon::Sessions(100), ModelKind::Mixture);
    let horizon = request.horizon().expect("horizon");

    let model = model_for_request(&request, horizon, &history, 5.0).expect("mixture");
    let mut rng = RngBank::new(1).for_stream(StreamSlot::Simulation);
    let steps = model.draw(1_000, 100, &mut rng).expect("draw");

    let small = steps.values().iter().filter(|v| **v == 1.0).count();
    let share = small as f64 / steps.values().len() as f64;
    // One session out of ten: expect ~10%, not the 50% a uniform pick gives.
    assert!((share - 0.10).abs() < 0.01, "1-sample bucket share was {share}");
}

#[test]
fn tournament_steps_are_events() {
    let engine = RiskEngine::default();
    let request = SimulationRequest::new(
        Horizon::Hours(25),
        ModelKind::Bootstrap,
        500_000.0,
        StakeProfile::tournament(11_000.0),
        50,
    );
    let result = engine.simulate(&request, &[mtt_record()], &[]).expect("simulate");
    // One tournament sample: every step nets 29,000.
    assert_eq!(result.summary.steps, 25);
    assert!(result.endings.iter().all(|e| *e == 500_000.0 + 25.0 * 29_000.0));
}

#[test]
fn stop_loss_clips_session_steps_only() {
    let engine = RiskEngine::default();
    let records = cash_records(&[-9_000, 500, 700, 1_200], 300);
    let profile = StakeProfile::cash(300.0, 100.0).with_stop_loss_bb(10.0);

    let sessions = SimulationRequest::new(Horizon::Sessions(20), ModelKind::Bootstrap, 100_000.0, profile.clone(), 200)
        .with_seed(11);
    let clipped = engine.simulate(&sessions, &records, &[]).expect("sessions");
    for i in 0..clipped.paths.iterations() {
        let row = clipped.paths.row(i);
        for w in row.windows(2) {
            assert!(w[1] - w[0] >= -3_000.0, "Session step {} below stop-loss", w[1] - w[0]);
        }
    }

    // seat_hours = 1, so the per-hour sample is the session net.
    let hours = SimulationRequest::new(Horizon::Hours(20), ModelKind::Bootstrap, 100_000.0, profile, 200)
        .with_seed(11);
    let unclipped = engine.simulate(&hours, &records, &[]).expect("hours");
    let saw_full_loss = (0..unclipped.paths.iterations()).any(|i| {
        unclipped.paths.row(i).windows(2).any(|w| w[1] - w[0] == -9_000.0)
    });
    assert!(saw_full_loss, "Hourly horizon must not apply the session stop-loss");
}

#[test]
fn step_matrix_clip_ignores_sign() {
    let mut steps = StepMatrix::from_rows(&[vec![-500.0, 100.0], vec![-50.0, -1_000.0]]).expect("rows");
    steps.clip_losses(-200.0);
    assert_eq!(steps.values(), &[-200.0, 100.0, -50.0, -200.0]);
}

#[test]
fn ragged_rows_are_rejected() {
    assert!(StepMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).is_err());
}

#[test]
fn horizon_must_be_exactly_one_of_hours_or_sessions() {
    let engine = RiskEngine::default();
    let records = cash_records(&[100, -100], 300);

    let mut both = cash_request(Horizon::Sessions(10), ModelKind::Bootstrap);
    both.horizon_hours = Some(5);
    assert!(matches!(engine.simulate(&both, &records, &[]), Err(RiskError::InvalidParameter { .. })));

    let mut neither = cash_request(Horizon::Sessions(10), ModelKind::Bootstrap);
    neither.horizon_sessions = None;
    assert!(matches!(engine.simulate(&neither, &records, &[]), Err(RiskError::InvalidParameter { .. })));

    let zero = cash_request(Horizon::Sessions(0), ModelKind::Bootstrap);
    assert!(matches!(engine.simulate(&zero, &records, &[]), Err(RiskError::InvalidParameter { .. })));
}

#[test]
fn iterations_are_capped_by_config() {
    let engine = RiskEngine::default();
    let records = cash_records(&[100, -100], 300);
    let mut request = cash_request(Horizon::Sessions(10), ModelKind::Bootstrap);
    request.iterations = engine.config.max_iterations + 1;
    assert!(matches!(engine.simulate(&request, &records, &[]), Err(RiskError::InvalidParameter { .. })));
}
