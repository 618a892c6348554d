// SPDX-License-Identifier: GPL-3.0-or-later

use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("circuit open for provider {provider}, retry in {retry_in:?}")]
    CircuitOpen {
        provider: String,
        retry_in: Duration,
    },

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("request to {provider} timed out")]
    Timeout { provider: String },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid response from provider: {0}")]
    InvalidResponse(String),

    #[error("Authentication with {0} failed")]
    AuthenticationFailed(String),
}

impl CatalogError {
    /// Whether this error came from the rate limiter rather than the provider itself.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, CatalogError::CircuitOpen { .. })
    }

    pub(crate) fn from_transport(provider: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            CatalogError::Timeout {
                provider: provider.to_string(),
            }
        } else {
            CatalogError::RequestFailed(error)
        }
    }
}
