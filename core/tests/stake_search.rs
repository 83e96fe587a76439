//! Stake search tests: bracket edges, bisection, monotone evaluation.

use bankroll_core::{
    config::RiskConfig,
    error::RiskError,
    rng::StreamSlot,
    stake_search::{search_stake, SearchBound, StakeEvaluator, StakeSearchRequest},
};

fn request(samples_bb: f64, start: f64, target: f64, bb_min: f64, bb_max: f64) -> StakeSearchRequest {
    StakeSearchRequest {
        current_bb:       samples_bb,
        bankroll_start:   start,
        target_ror:       target,
        horizon_sessions: 100,
        iterations:       300,
        bb_min,
        bb_max,
        tolerance:        None,
        seed:             Some(2024),
    }
}

#[test]
fn lower_bound_returned_without_bisecting() {
    // Losing 2,000 a session on average: broke long before 100 sessions.
    let samples = [-5_000.0, 1_000.0];
    let outcome = search_stake(&samples, &request(100.0, 10_000.0, 0.01, 100.0, 1_000.0), &RiskConfig::default())
        .expect("search");

    assert_eq!(outcome.recommended_bb, 100.0);
    assert_eq!(outcome.decided_by, SearchBound::LowerBound);
    assert_eq!(outcome.bisections, 0);
    assert!(outcome.risk_of_ruin > 0.01);
}

#[test]
fn upper_bound_returned_when_it_already_fits() {
    let samples = [100.0, 250.0, 40.0];
    let outcome = search_stake(&samples, &request(100.0, 10_000.0, 0.05, 50.0, 5_000.0), &RiskConfig::default())
        .expect("search");

    assert_eq!(outcome.recommended_bb, 5_000.0);
    assert_eq!(outcome.decided_by, SearchBound::UpperBound);
    assert_eq!(outcome.risk_of_ruin, 0.0);
    assert_eq!(outcome.stake_multiple, 50.0);
    assert_eq!(outcome.suggested_stop_loss, 0.0, "No losing sessions, no stop-loss");
}

#[test]
fn bisection_lands_within_target() {
    let _ = env_logger::builder().is_test(true).try_init();
    let samples = [1_000.0, -900.0];
    let config = RiskConfig::default();
    let req = StakeSearchRequest {
        tolerance: Some(1.0),
        ..request(100.0, 30_000.0, 0.10, 100.0, 1_000.0)
    };
    let outcome = search_stake(&samples, &req, &config).expect("search");

    assert_eq!(outcome.decided_by, SearchBound::Bisected);
    assert!(outcome.bisections > 0);
    assert!(outcome.bisections <= config.search.max_bisections);
    assert!((100.0..=1_000.0).contains(&outcome.recommended_bb));
    assert!(
        outcome.risk_of_ruin <= 0.10,
        "Recommended stake exceeds target: {}",
        outcome.risk_of_ruin
    );
    assert!((outcome.stake_multiple - outcome.recommended_bb / 100.0).abs() < 1e-12);
    assert!(outcome.suggested_stop_loss > 0.0);
    assert_eq!(outcome.metrics.iterations, 300);
    assert_eq!(outcome.metrics.steps, 100);
    assert_eq!(outcome.metrics.risk_of_ruin, outcome.risk_of_ruin);
}

#[test]
fn bisection_respects_max_steps() {
    let samples = [1_000.0, -900.0];
    let mut config = RiskConfig::default();
    config.search.max_bisections = 3;
    let req = StakeSearchRequest {
        tolerance: Some(1e-9),
        ..request(100.0, 30_000.0, 0.10, 100.0, 1_000.0)
    };
    let outcome = search_stake(&samples, &req, &config).expect("search");
    assert_eq!(outcome.bisections, 3);
}

#[test]
fn evaluation_is_monotone_in_stake() {
    let samples = [1_500.0, -1_000.0, 300.0, -700.0];
    let evaluator = StakeEvaluator::new(&samples, 100.0, 20_000.0, 80, 400, 7, StreamSlot::StakeSearch)
        .expect("evaluator");

    let mut previous = 0.0;
    for bb in [50.0, 100.0, 200.0, 400.0, 800.0, 1_600.0] {
        let ror = evaluator.ror_at(bb).expect("ror");
        assert!(ror >= previous, "RoR fell from {previous} to {ror} at bb={bb}");
        previous = ror;
    }
}

#[test]
fn rescaling_is_linear() {
    let samples = [100.0, -50.0];
    let evaluator = StakeEvaluator::new(&samples, 100.0, 1_000.0, 10, 10, 1, StreamSlot::StakeSearch)
        .expect("evaluator");
    assert_eq!(evaluator.samples_at(300.0), vec![300.0, -150.0]);
}

#[test]
fn invalid_inputs_are_rejected() {
    let samples = [100.0, -50.0];
    let config = RiskConfig::default();

    let inverted = request(100.0, 10_000.0, 0.05, 500.0, 100.0);
    assert!(matches!(search_stake(&samples, &inverted, &config), Err(RiskError::InvalidParameter { .. })));

    let bad_target = request(100.0, 10_000.0, 1.5, 50.0, 100.0);
    assert!(matches!(search_stake(&samples, &bad_target, &config), Err(RiskError::InvalidParameter { .. })));

    let no_stake = request(0.0, 10_000.0, 0.05, 50.0, 100.0);
    assert!(matches!(
        search_stake(&samples, &no_stake, &config),
        Err(RiskError::InsufficientStakeMetadata { .. })
    ));

    assert!(matches!(
        search_stake(&[], &request(100.0, 10_000.0, 0.05, 50.0, 100.0), &config),
        Err(RiskError::InsufficientData { .. })
    ));

    let nan_start = request(100.0, f64::NAN, 0.05, 50.0, 100.0);
    assert!(matches!(
        search_stake(&samples, &nan_start, &config),
        Err(RiskError::InvalidParameter { .. })
    ));
}
