use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by the request client and everything layered on it.
///
/// The type is `Clone` so that every reader coalesced onto one in-flight load
/// observes the same failure.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("transport error: {message}")]
    Transport { message: String },
    #[error("api error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        payload: Value,
    },
    #[error("request rejected: {message}")]
    Rejected {
        message: String,
        errors: Vec<String>,
    },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("token storage error: {message}")]
    Storage { message: String },
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>, errors: Vec<String>) -> Self {
        Self::Rejected {
            message: message.into(),
            errors,
        }
    }

    /// HTTP status of an [`ClientError::Api`] failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::transport(err.to_string())
    }
}
