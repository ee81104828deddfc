//! API error types.

use thiserror::Error;

/// Errors returned by the remote post store and the API client.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Failed to connect to server: {0}")]
    Connection(String),

    #[error("Server returned {status}: {detail}")]
    Server { status: u16, detail: String },

    #[error("Invalid response from server: {0}")]
    Decode(String),

    #[error("Not logged in. Run 'ink auth login' first.")]
    NotAuthenticated,
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Connection(e.to_string())
        }
    }
}
