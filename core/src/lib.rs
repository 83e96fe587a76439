//! Bankroll risk engine: Monte Carlo simulation of a poker bankroll,
//! risk metrics, stake policy and live alerts.

pub mod alerts;
pub mod analytics;
pub mod config;
pub mod distribution;
pub mod engine;
pub mod error;
pub mod history;
pub mod metrics;
pub mod paths;
pub mod policy;
pub mod report;
pub mod request;
pub mod rng;
pub mod scenario;
pub mod session;
pub mod simulation;
pub mod stake_search;
pub mod stats;
pub mod types;

pub use config::RiskConfig;
pub use engine::RiskEngine;
pub use error::{RiskError, RiskResult};
