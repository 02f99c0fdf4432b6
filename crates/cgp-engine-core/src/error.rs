use thiserror::Error;

#[derive(Debug, Error)]
pub enum CgpError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Unknown fee row: {0}")]
    UnknownFeeRow(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for CgpError {
    fn from(e: serde_json::Error) -> Self {
        CgpError::SerializationError(e.to_string())
    }
}
