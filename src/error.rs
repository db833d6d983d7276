use thiserror::Error;

/// Why the mail gateway did not accept a reminder.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("{code}\n{details}")]
    Platform { code: String, details: String },

    #[error("{0}")]
    Unexpected(String),
}

impl DeliveryError {
    pub fn platform(code: impl Into<String>, details: impl Into<String>) -> Self {
        DeliveryError::Platform {
            code: code.into(),
            details: details.into(),
        }
    }

    /// Log title for the error trail.
    pub fn title(&self) -> &'static str {
        match self {
            DeliveryError::Platform { .. } => "system error",
            DeliveryError::Unexpected(_) => "unexpected error",
        }
    }
}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        DeliveryError::Unexpected(err.to_string())
    }
}

impl From<anyhow::Error> for DeliveryError {
    fn from(err: anyhow::Error) -> Self {
        DeliveryError::Unexpected(err.to_string())
    }
}
