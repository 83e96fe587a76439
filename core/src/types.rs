//! Shared primitive types used across the entire engine.

/// A money amount in the account's minor currency unit (cents),
/// as stored by the session and ledger collaborators.
pub type Cents = i64;

/// Simulation-side money: same unit as `Cents`, carried as a float.
pub type Money = f64;

/// Stake bucket key: big blind in cents, `None` when the session
/// was recorded without stake metadata.
pub type StakeKey = Option<Cents>;

/// The instrument a request or session belongs to.
/// Instrument-specific rules branch on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instrument {
    Cash,
    #[serde(alias = "tournament")]
    Mtt,
}

impl Instrument {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Mtt  => "mtt",
        }
    }
}
