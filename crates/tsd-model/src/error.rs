use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("invalid interval '{value}': {reason}")]
    InvalidInterval { value: String, reason: String },
    #[error("invalid horizon: {0}")]
    InvalidHorizon(String),
    #[error("unknown {kind} '{value}'")]
    UnknownName { kind: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, ModelError>;
