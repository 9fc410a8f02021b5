use thiserror::Error;

#[derive(Debug, Error)]
pub enum UnderwritingError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for UnderwritingError {
    fn from(e: serde_json::Error) -> Self {
        UnderwritingError::SerializationError(e.to_string())
    }
}
