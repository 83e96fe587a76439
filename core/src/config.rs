use crate::policy::PolicyConfig;
use serde::{Deserialize, Serialize};

/// Engine-wide knobs. Every field has a default so a config file
/// only needs to name what it overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Hard cap on Monte Carlo paths per request.
    pub max_iterations:   usize,
    /// Seed used when a request does not carry one.
    pub default_seed:     u64,
    pub ruin:             RuinConfig,
    /// Tail probability for VaR/CVaR on ending PnL.
    pub tail_alpha:       f64,
    /// Student-t degrees of freedom when `nu` is not supplied.
    pub default_nu:       f64,
    /// Cash buy-in depth assumed by the policy engine when the
    /// stake profile omits it.
    pub default_buyin_bb: f64,
    pub search:           SearchConfig,
    pub default_policy:   String,
    pub policies:         Vec<PolicyConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuinConfig {
    /// Cash ruin line: this fraction of the start bankroll lost...
    pub drawdown_fraction: f64,
    /// ...or this many buy-ins lost, whichever line is lower.
    pub buyin_multiple:    f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Bracket width, in big-blind cents, at which bisection stops.
    pub tolerance:      f64,
    pub max_bisections: u32,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_iterations:   100_000,
            default_seed:     42,
            ruin:             RuinConfig::default(),
            tail_alpha:       0.05,
            default_nu:       5.0,
            default_buyin_bb: 100.0,
            search:           SearchConfig::default(),
            default_policy:   "medium".into(),
            policies:         PolicyConfig::builtin(),
        }
    }
}

impl Default for RuinConfig {
    fn default() -> Self {
        Self {
            drawdown_fraction: 0.10,
            buyin_multiple:    1.5,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            tolerance:      0.05,
            max_bisections: 64,
        }
    }
}

impl RiskConfig {
    /// Load from a JSON file. Missing fields keep their defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: RiskConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_iterations == 0 {
            anyhow::bail!("max_iterations must be positive");
        }
        if !(self.tail_alpha > 0.0 && self.tail_alpha < 1.0) {
            anyhow::bail!("tail_alpha must be in (0, 1), got {}", self.tail_alpha);
        }
        if self.default_nu <= 2.0 {
            anyhow::bail!("default_nu must be > 2, got {}", self.default_nu);
        }
        if self.search.tolerance <= 0.0 {
            anyhow::bail!("search.tolerance must be positive");
        }
        for policy in &self.policies {
            if !(0.0..1.0).contains(&policy.hysteresis_pct) {
                anyhow::bail!(
                    "policy '{}' hysteresis_pct must be in [0, 1), got {}",
                    policy.name,
                    policy.hysteresis_pct
                );
            }
        }
        Ok(())
    }

    /// The configured policy with this name, or the generic
    /// fallback (name, 50 buy-ins, 200 ABIs, 10% band).
    pub fn base_policy(&self, name: &str) -> PolicyConfig {
        self.policies
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .unwrap_or_else(|| PolicyConfig::fallback(name))
    }
}
