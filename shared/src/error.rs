use thiserror::Error;

/// Failure loading or saving combat tuning.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse combat config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("failed to serialize combat config: {0}")]
    Serialize(#[from] ron::Error),
    #[error("failed to read combat config: {0}")]
    Io(#[from] std::io::Error),
}

/// A peer message that could not be encoded or decoded.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed peer message: {0}")]
    Json(#[from] serde_json::Error),
}
