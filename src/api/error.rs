use thiserror::Error;

/// Errors returned by the Kubermatic control-plane API.
///
/// SECURITY: Error messages must NEVER contain the bearer token or cloud credentials.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Token missing, invalid or lacking permissions (401/403)
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// The addressed project, cluster or node deployment does not exist
    #[error("{resource} not found: '{id}'")]
    NotFound { resource: &'static str, id: String },

    /// Any other non-success response
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Network-level error (connection failed, timeout, etc.)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body did not match the expected model
    #[error("failed to decode {resource}: {message}")]
    Decode {
        resource: &'static str,
        message: String,
    },

    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}
