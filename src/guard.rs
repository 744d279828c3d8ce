//! Route gates driven by the session status.

use crate::config::ClientConfig;
use crate::navigation::{login_redirect, return_to};
use crate::session::SessionStatus;

/// What a gated route should do for the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Session check in progress: show a loading indicator, render nothing else.
    Loading,
    /// Render the requested content.
    Render,
    /// Replace the current location.
    Redirect(String),
}

/// Gate for routes that require an authenticated session.
///
/// Unauthenticated visitors are sent to the login page with the requested
/// `location` recorded as `returnTo`.
#[must_use]
pub fn protected_gate(status: SessionStatus, location: &str, config: &ClientConfig) -> GateDecision {
    match status {
        SessionStatus::Pending => GateDecision::Loading,
        SessionStatus::Authenticated => GateDecision::Render,
        SessionStatus::Anonymous | SessionStatus::Invalid => {
            GateDecision::Redirect(login_redirect(config.login_path(), Some(location), None))
        }
    }
}

/// Gate for routes only meant for visitors (login, registration).
///
/// Authenticated users are sent to the `returnTo` recorded in `location`,
/// or to the configured landing path.
#[must_use]
pub fn public_only_gate(
    status: SessionStatus,
    location: &str,
    config: &ClientConfig,
) -> GateDecision {
    match status {
        SessionStatus::Pending => GateDecision::Loading,
        SessionStatus::Authenticated => GateDecision::Redirect(
            return_to(location).unwrap_or_else(|| config.landing_path().to_owned()),
        ),
        SessionStatus::Anonymous | SessionStatus::Invalid => GateDecision::Render,
    }
}
