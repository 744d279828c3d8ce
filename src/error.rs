/// Errors returned by the PlotTwist client.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("{operation} failed with status {status}: {detail}")]
    Api {
        operation: String,
        status: u16,
        detail: String,
    },

    /// The request was rejected as unauthorized and no further recovery applies.
    #[error("Not authorized")]
    Unauthorized,

    #[error("Token refresh failed: {0}")]
    Refresh(#[from] RefreshFailure),

    /// The session was torn down while the request was in flight.
    #[error("Session ended while the request was in flight")]
    SessionEnded,

    #[error("Token storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Request cancelled")]
    Cancelled,
}

impl Error {
    /// Backend-provided detail for an API rejection, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Api { detail, .. } if !detail.is_empty() => Some(detail),
            _ => None,
        }
    }

    /// HTTP status of an API rejection.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Refresh(RefreshFailure::Rejected { status, .. }) => Some(*status),
            Self::Unauthorized => Some(401),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Message suitable for showing inline on a form.
    ///
    /// Credential rejections carry the backend's own wording; everything
    /// else (transport failures, decoding errors) collapses to `fallback`.
    #[must_use]
    pub fn display_message(&self, fallback: &str) -> String {
        match self {
            Self::InvalidRequest(msg) => msg.clone(),
            _ => self.detail().unwrap_or(fallback).to_owned(),
        }
    }
}

/// Outcome of a failed token refresh.
///
/// Cloneable so a single refresh result can be handed to every request
/// that was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum RefreshFailure {
    /// The refresh endpoint rejected the refresh token.
    #[error("refresh rejected with status {status}: {detail}")]
    Rejected { status: u16, detail: String },

    /// The refresh call never produced a response.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The session was ended (logout or expiry) before the refresh completed.
    #[error("session ended before the refresh completed")]
    Superseded,
}
