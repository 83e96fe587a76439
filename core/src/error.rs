use thiserror::Error;

#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Insufficient data: {context}")]
    InsufficientData { context: String },

    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    #[error("Insufficient stake metadata: {context}")]
    InsufficientStakeMetadata { context: String },

    #[error("Unsupported model: {model} is not defined for {instrument}")]
    UnsupportedModel { model: String, instrument: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RiskError {
    pub fn insufficient_data(context: impl Into<String>) -> Self {
        Self::InsufficientData { context: context.into() }
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter { message: message.into() }
    }

    pub fn insufficient_stake_metadata(context: impl Into<String>) -> Self {
        Self::InsufficientStakeMetadata { context: context.into() }
    }

    pub fn unsupported_model(model: impl Into<String>, instrument: impl Into<String>) -> Self {
        Self::UnsupportedModel {
            model:      model.into(),
            instrument: instrument.into(),
        }
    }
}

pub type RiskResult<T> = Result<T, RiskError>;
