use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("Transport error talking to switch: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Session invalid while fetching {endpoint}: switch returned an HTML page (logged in elsewhere?)")]
    SessionInvalid { endpoint: String },

    #[error("Malformed payload from {endpoint}: {reason}")]
    MalformedPayload { endpoint: String, reason: String },

    #[error("Missing field {field} in {endpoint}")]
    MissingField { endpoint: String, field: String },

    #[error("Type mismatch for {field} in {endpoint}: expected {expected}")]
    TypeMismatch {
        endpoint: String,
        field: String,
        expected: String,
    },

    #[error("Field count mismatch for {field} in {endpoint}: expected {expected} entries, got {actual}")]
    FieldCountMismatch {
        endpoint: String,
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("Login rejected by switch: {0}")]
    LoginRejected(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl ExporterError {
    /// True for errors caused by the device content rather than the network.
    pub fn is_payload_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedPayload { .. }
                | Self::MissingField { .. }
                | Self::TypeMismatch { .. }
                | Self::FieldCountMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ExporterError>;
