//! risk-runner: headless runner for the bankroll risk engine.
//!
//! Usage:
//!   risk-runner --job job.json [--config risk.json] [--seed 42]
//!   risk-runner --ipc-mode [--config risk.json]
//!
//! A job file holds one JSON job; in IPC mode every stdin line is a
//! job and every answer is one JSON line on stdout.

use anyhow::Result;
use bankroll_core::{
    alerts::AlertRequest,
    analytics::{self, BreakdownRow, Dimension, HistogramBin, HistogramRow, SessionSummary, TimelinePoint},
    config::RiskConfig,
    engine::RiskEngine,
    metrics::QuantileBands,
    policy::PolicyOverride,
    report::RiskSummary,
    request::SimulationRequest,
    scenario::ScenarioRequest,
    session::{LedgerEntry, SessionRecord},
    stake_search::StakeSearchRequest,
};
use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeMap;
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "job", rename_all = "snake_case")]
enum Job {
    Simulate {
        request:   SimulationRequest,
        #[serde(default)]
        records:   Vec<SessionRecord>,
        #[serde(default)]
        overrides: Vec<PolicyOverride>,
        /// Include the per-path endings in the answer.
        #[serde(default)]
        endings:   bool,
    },
    StakeSearch {
        request: StakeSearchRequest,
        records: Vec<SessionRecord>,
    },
    Scenario {
        request: ScenarioRequest,
        records: Vec<SessionRecord>,
    },
    Alerts {
        request: AlertRequest,
        records: Vec<SessionRecord>,
    },
    Analytics {
        records:           Vec<SessionRecord>,
        #[serde(default)]
        ledger:            Vec<LedgerEntry>,
        #[serde(default)]
        starting_bankroll: f64,
        #[serde(default)]
        bin:               Option<HistogramBin>,
        #[serde(default)]
        dimension:         Option<Dimension>,
    },
    Quit,
}

#[derive(serde::Serialize)]
struct SimulationAnswer {
    summary:   RiskSummary,
    report:    BTreeMap<String, Value>,
    quantiles: QuantileBands,
    #[serde(skip_serializing_if = "Option::is_none")]
    endings:   Option<Vec<f64>>,
}

#[derive(serde::Serialize)]
struct AnalyticsAnswer {
    summary:   SessionSummary,
    timeline:  Vec<TimelinePoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    histogram: Option<Vec<HistogramRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    breakdown: Option<Vec<BreakdownRow>>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let job_path = flag_value(&args, "--job");

    let mut config = match flag_value(&args, "--config") {
        Some(path) => RiskConfig::load(path)?,
        None => RiskConfig::default(),
    };
    config.default_seed = parse_arg(&args, "--seed", config.default_seed);
    let engine = RiskEngine::new(config);

    if ipc_mode {
        return run_ipc_loop(&engine);
    }

    let Some(path) = job_path else {
        anyhow::bail!("usage: risk-runner --job <job.json> [--config <risk.json>] | --ipc-mode");
    };
    eprintln!("risk-runner: bankroll risk engine");
    eprintln!("  job:          {path}");
    eprintln!("  default seed: {}", engine.config.default_seed);
    eprintln!("  started:      {}", Utc::now().to_rfc3339());

    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
    let job: Job = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;

    match run_job(&engine, job)? {
        Some(answer) => println!("{}", serde_json::to_string_pretty(&answer)?),
        None => log::info!("runner: quit job ignored outside IPC mode"),
    }
    Ok(())
}

fn run_ipc_loop(engine: &RiskEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let job: Job = match serde_json::from_str(&buffer) {
            Ok(j) => j,
            Err(e) => {
                writeln!(stdout, "{}", serde_json::json!({ "error": e.to_string() }))?;
                stdout.flush()?;
                continue;
            }
        };

        match run_job(engine, job) {
            Ok(Some(answer)) => writeln!(stdout, "{}", serde_json::to_string(&answer)?)?,
            Ok(None) => break,
            Err(e) => {
                log::warn!("runner: job failed: {e:#}");
                writeln!(stdout, "{}", serde_json::json!({ "error": format!("{e:#}") }))?;
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

/// Execute one job. `None` means the caller asked to stop.
fn run_job(engine: &RiskEngine, job: Job) -> Result<Option<Value>> {
    let answer = match job {
        Job::Quit => return Ok(None),
        Job::Simulate {
            request,
            records,
            overrides,
            endings,
        } => {
            let result = engine.simulate(&request, &records, &overrides)?;
            let answer = SimulationAnswer {
                report:    result.summary.to_flat_report()?,
                summary:   result.summary,
                quantiles: result.quantiles,
                endings:   endings.then_some(result.endings),
            };
            serde_json::to_value(answer)?
        }
        Job::StakeSearch { request, records } => {
            serde_json::to_value(engine.search_stake(&request, &records)?)?
        }
        Job::Scenario { request, records } => serde_json::to_value(engine.scenario(&request, &records)?)?,
        Job::Alerts { request, records } => serde_json::to_value(engine.alerts(&request, &records)?)?,
        Job::Analytics {
            records,
            ledger,
            starting_bankroll,
            bin,
            dimension,
        } => {
            let answer = AnalyticsAnswer {
                summary:   analytics::summary(&records),
                timeline:  analytics::bankroll_timeline(&records, &ledger, starting_bankroll),
                histogram: bin.map(|b| analytics::histogram(&records, b)),
                breakdown: dimension.map(|d| analytics::breakdown(&records, d)),
            };
            serde_json::to_value(answer)?
        }
    };
    Ok(Some(answer))
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
