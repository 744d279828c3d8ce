//! Login, registration, validation and logout.

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::bootstrap::BootstrapOutcome;
use crate::client::{ApiClient, ApiRequest, RefreshTokenBody};
use crate::error::Error;
use crate::navigation::login_redirect;
use crate::session::Session;
use crate::types::{AuthResponse, Credentials, RefreshToken, Registration, User};

const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";
const LOGOUT_PATH: &str = "/auth/logout";
const ME_PATH: &str = "/auth/me";

/// Drives the session through its transitions.
///
/// Network failures never retry here; the only automatic retry is the
/// HTTP layer's refresh-on-`401`.
#[derive(Debug)]
pub struct Authenticator {
    client: ApiClient,
    pub(crate) bootstrapped: OnceCell<BootstrapOutcome>,
}

impl Authenticator {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            bootstrapped: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    #[must_use]
    pub fn session(&self) -> &Arc<Session> {
        self.client.session()
    }

    /// Sign in with email and password.
    ///
    /// The session is `Pending` while the call is outstanding, then
    /// `Authenticated` with both tokens persisted, or `Invalid` with
    /// `last_error` set and existing tokens untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] when the credentials are rejected and
    /// [`Error::Http`] on network failure.
    pub async fn login(&self, credentials: &Credentials) -> Result<User, Error> {
        let request = ApiRequest::post(LOGIN_PATH).with_json(credentials)?;
        self.sign_in(request, "Login failed").await
    }

    /// Create an account. A successful registration signs the user in.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] when the backend rejects the registration
    /// (e.g. duplicate email) and [`Error::Http`] on network failure.
    pub async fn register(&self, registration: &Registration) -> Result<User, Error> {
        let request = ApiRequest::post(REGISTER_PATH).with_json(registration)?;
        self.sign_in(request, "Registration failed").await
    }

    async fn sign_in(&self, request: ApiRequest, fallback: &str) -> Result<User, Error> {
        let session = self.session();
        session.begin_attempt();

        match self.client.public::<AuthResponse>(request).await {
            Ok(response) => {
                let tokens = response.tokens();
                let user = response.user;
                tracing::info!(user_id = %user.id, "Signed in");
                session.establish(user.clone(), tokens);
                Ok(user)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Sign-in attempt failed");
                session.fail_attempt(e.display_message(fallback));
                Err(e)
            }
        }
    }

    /// Confirm the held access token by fetching the current user.
    ///
    /// On failure the session drops its identity and tokens, becomes
    /// `Invalid`, and the user is sent to login if they are on a protected
    /// route.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] without touching the session when
    /// no access token is held, [`Error::SessionEnded`] if the session was
    /// ended while validating, and the HTTP layer's errors otherwise.
    pub async fn validate_session(&self) -> Result<User, Error> {
        let session = self.session();
        if session.access_token().is_none() {
            return Err(Error::Unauthorized);
        }
        let generation = session.snapshot().generation();
        session.begin_attempt();

        match self.client.authenticated::<User>(ApiRequest::get(ME_PATH)).await {
            Ok(user) => {
                if session.confirm_user(generation, user.clone()) {
                    tracing::info!(user_id = %user.id, "Session validated");
                    Ok(user)
                } else {
                    Err(Error::SessionEnded)
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session validation failed");
                if session.invalidate(generation, e.display_message("Failed to get user info")) {
                    let navigator = self.client.navigator();
                    let location = navigator.location();
                    if self.client.config().is_protected(&location) {
                        navigator.navigate(&login_redirect(
                            self.client.config().login_path(),
                            Some(&location),
                            None,
                        ));
                    }
                }
                Err(e)
            }
        }
    }

    /// End the session.
    ///
    /// Always succeeds locally: the server-side revocation is best-effort,
    /// and tokens and identity are cleared whatever it returns. Logging out
    /// of an already empty session does nothing.
    pub async fn logout(&self) {
        let session = self.session();
        if session.snapshot().is_empty() {
            tracing::debug!("Logout requested without a session");
            return;
        }

        if let Some(refresh_token) = session.refresh_token()
            && let Err(e) = self.revoke(&refresh_token).await
        {
            tracing::warn!(error = %e, "Logout request failed; clearing session anyway");
        }

        session.end();
        tracing::info!("Signed out");
        self.client.navigator().navigate(self.client.config().login_path());
    }

    async fn revoke(&self, refresh_token: &RefreshToken) -> Result<(), Error> {
        let request =
            ApiRequest::post(LOGOUT_PATH).with_json(&RefreshTokenBody { refresh_token })?;
        self.client.public_unit(request).await
    }

    /// Clear the last login/registration error, e.g. when the user edits the form.
    pub fn clear_error(&self) {
        self.session().clear_error();
    }
}
