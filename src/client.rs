//! Outbound HTTP with bearer attachment and one-shot refresh on `401`.
//!
//! Two channels share one [`reqwest::Client`]:
//!
//! - the public channel ([`ApiClient::public`]) never sends credentials;
//! - the authenticated channel ([`ApiClient::authenticated`]) attaches the
//!   session's access token and, when the API answers `401`, refreshes the
//!   token once and resubmits the request once.
//!
//! Concurrent `401`s share a single in-flight refresh.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::error::{Error, RefreshFailure};
use crate::navigation::{Navigator, SESSION_EXPIRED, login_redirect};
use crate::session::Session;
use crate::types::{AccessToken, RefreshToken, TokenPair};

pub(crate) const REFRESH_PATH: &str = "/auth/refresh";

type RefreshFuture = Shared<BoxFuture<'static, Result<AccessToken, RefreshFailure>>>;

/// Body of the refresh and logout endpoints.
#[derive(Serialize)]
pub(crate) struct RefreshTokenBody<'a> {
    pub(crate) refresh_token: &'a RefreshToken,
}

/// Description of one API call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    cancel: Option<CancellationToken>,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            cancel: None,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Add a query parameter only when `value` is present.
    #[must_use]
    pub fn with_optional_query<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.with_query(key, v),
            None => self,
        }
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if `body` cannot be serialized.
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, Error> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Abort the call when `token` is cancelled. A cancelled call resolves
    /// to [`Error::Cancelled`] and leaves the session untouched.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// Human-readable name used in errors and logs, e.g. `GET /books`.
    #[must_use]
    pub fn operation(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    First,
    Retry,
}

#[derive(Clone)]
struct Transport {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
}

impl Transport {
    async fn dispatch(
        &self,
        request: &ApiRequest,
        bearer: Option<&AccessToken>,
    ) -> Result<reqwest::Response, Error> {
        let url = self.config.endpoint(&request.path)?;
        let mut builder = self.http.request(request.method.clone(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token.as_str());
        }

        let send = builder.send();
        let response = match &request.cancel {
            Some(cancel) => tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::Cancelled),
                response = send => response?,
            },
            None => send.await?,
        };

        tracing::debug!(
            operation = %request.operation(),
            status = response.status().as_u16(),
            "API response"
        );
        Ok(response)
    }
}

/// HTTP client bound to a [`Session`].
#[derive(Clone)]
pub struct ApiClient {
    transport: Transport,
    session: Arc<Session>,
    navigator: Arc<dyn Navigator>,
    refresh: Arc<Mutex<Option<RefreshFuture>>>,
}

impl ApiClient {
    #[must_use]
    pub fn new(config: ClientConfig, session: Arc<Session>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            transport: Transport {
                http: reqwest::Client::new(),
                config: Arc::new(config),
            },
            session,
            navigator,
            refresh: Arc::new(Mutex::new(None)),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or timeouts).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.transport.http = client;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.transport.config
    }

    #[must_use]
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    #[must_use]
    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    // ── Public channel ─────────────────────────────────────────────

    /// Send without credentials and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, [`Error::Api`] for any
    /// non-success status (including `401`), or [`Error::Cancelled`].
    pub async fn public<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, Error> {
        let response = self.transport.dispatch(&request, None).await?;
        decode(response, request.operation()).await
    }

    /// Like [`public`](Self::public) but ignores the response body.
    ///
    /// # Errors
    ///
    /// See [`public`](Self::public).
    pub async fn public_unit(&self, request: ApiRequest) -> Result<(), Error> {
        let response = self.transport.dispatch(&request, None).await?;
        ensure_success(response, request.operation()).await?;
        Ok(())
    }

    // ── Authenticated channel ──────────────────────────────────────

    /// Send with the session's access token and decode the JSON response.
    ///
    /// A `401` triggers one token refresh and one resubmission.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] if the resubmission is rejected again
    /// or no refresh token is available, [`Error::Refresh`] if the refresh
    /// itself fails (the session is then ended and the user sent to login),
    /// and otherwise the same errors as [`public`](Self::public).
    pub async fn authenticated<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, Error> {
        let response = self.authorized_response(&request).await?;
        decode(response, request.operation()).await
    }

    /// Like [`authenticated`](Self::authenticated) but ignores the response body.
    ///
    /// # Errors
    ///
    /// See [`authenticated`](Self::authenticated).
    pub async fn authenticated_unit(&self, request: ApiRequest) -> Result<(), Error> {
        let response = self.authorized_response(&request).await?;
        ensure_success(response, request.operation()).await?;
        Ok(())
    }

    async fn authorized_response(&self, request: &ApiRequest) -> Result<reqwest::Response, Error> {
        let mut attempt = Attempt::First;
        let mut token = self.session.access_token();
        loop {
            let response = self.transport.dispatch(request, token.as_ref()).await?;
            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }
            match attempt {
                Attempt::First => {
                    tracing::debug!(operation = %request.operation(), "Unauthorized; attempting token refresh");
                    attempt = Attempt::Retry;
                    token = Some(self.recover(token.as_ref()).await?);
                }
                Attempt::Retry => {
                    tracing::warn!(operation = %request.operation(), "Unauthorized after token refresh");
                    return Err(Error::Unauthorized);
                }
            }
        }
    }

    /// Produce a usable access token after `stale` was rejected.
    async fn recover(&self, stale: Option<&AccessToken>) -> Result<AccessToken, Error> {
        if let Some(current) = self.session.access_token()
            && stale != Some(&current)
        {
            // Another request already refreshed the token.
            return Ok(current);
        }
        if self.session.refresh_token().is_none() {
            return Err(Error::Unauthorized);
        }

        let refresh = self.refresh_future();
        let outcome = refresh.clone().await;
        {
            let mut slot = lock(&self.refresh);
            if slot.as_ref().is_some_and(|f| f.ptr_eq(&refresh)) {
                *slot = None;
            }
        }
        outcome.map_err(Error::from)
    }

    /// The in-flight refresh, or a new one if none is running.
    fn refresh_future(&self) -> RefreshFuture {
        let mut slot = lock(&self.refresh);
        if let Some(in_flight) = slot.as_ref()
            && in_flight.peek().is_none()
        {
            return in_flight.clone();
        }
        let future = run_refresh(
            self.transport.clone(),
            self.session.clone(),
            self.navigator.clone(),
        )
        .boxed()
        .shared();
        *slot = Some(future.clone());
        future
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_base", &self.transport.config.api_base().as_str())
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn run_refresh(
    transport: Transport,
    session: Arc<Session>,
    navigator: Arc<dyn Navigator>,
) -> Result<AccessToken, RefreshFailure> {
    let Some((generation, refresh_token)) = session.refresh_ticket() else {
        return Err(RefreshFailure::Superseded);
    };

    match request_refresh(&transport, &refresh_token).await {
        Ok(tokens) => {
            if session.apply_refresh(generation, &tokens) {
                tracing::info!("Access token refreshed");
                Ok(tokens.access_token)
            } else {
                tracing::debug!("Discarding refresh result for an ended session");
                Err(RefreshFailure::Superseded)
            }
        }
        Err(failure) => {
            if session.expire(generation) {
                tracing::warn!(error = %failure, "Token refresh failed; session ended");
                let location = navigator.location();
                navigator.navigate(&login_redirect(
                    transport.config.login_path(),
                    Some(&location),
                    Some(SESSION_EXPIRED),
                ));
            }
            Err(failure)
        }
    }
}

async fn request_refresh(
    transport: &Transport,
    refresh_token: &RefreshToken,
) -> Result<TokenPair, RefreshFailure> {
    let request = ApiRequest::post(REFRESH_PATH)
        .with_json(&RefreshTokenBody { refresh_token })
        .map_err(|e| RefreshFailure::Transport(e.to_string()))?;
    let response = transport
        .dispatch(&request, None)
        .await
        .map_err(|e| RefreshFailure::Transport(e.to_string()))?;
    let response = ensure_success(response, request.operation())
        .await
        .map_err(|e| match e {
            Error::Api { status, detail, .. } => RefreshFailure::Rejected { status, detail },
            other => RefreshFailure::Transport(other.to_string()),
        })?;
    response
        .json::<TokenPair>()
        .await
        .map_err(|e| RefreshFailure::Transport(e.to_string()))
}

async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
    operation: String,
) -> Result<T, Error> {
    let response = ensure_success(response, operation).await?;
    response.json::<T>().await.map_err(Into::into)
}

/// Checks HTTP response status; returns the response on success or an error with details.
async fn ensure_success(
    response: reqwest::Response,
    operation: String,
) -> Result<reqwest::Response, Error> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(Error::Api {
        operation,
        status,
        detail: extract_detail(&body),
    })
}

/// Pull the human-readable message out of an error body.
///
/// The API reports `{"detail": "..."}`, or a list of `{"msg": "..."}`
/// entries for validation failures.
fn extract_detail(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_owned();
    };
    match json.get("detail") {
        Some(serde_json::Value::String(detail)) => detail.clone(),
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
            .collect::<Vec<_>>()
            .join("; "),
        _ => body.trim().to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::navigation::History;
    use crate::session::SessionStatus;
    use crate::session::tests::{pair, user};
    use crate::store::{MemoryTokenStore, TokenSlot, TokenStore};

    struct Harness {
        server: MockServer,
        client: ApiClient,
        session: Arc<Session>,
        store: Arc<MemoryTokenStore>,
        history: Arc<History>,
    }

    async fn harness(location: &str) -> Harness {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryTokenStore::new());
        let session = Arc::new(Session::new(store.clone()));
        let history = Arc::new(History::new(location));
        let config = ClientConfig::new(server.uri().parse().unwrap());
        let client = ApiClient::new(config, session.clone(), history.clone());
        Harness {
            server,
            client,
            session,
            store,
            history,
        }
    }

    fn signed_in(h: &Harness) {
        h.session.establish(user(1), pair("A1", "R1"));
    }

    async fn mount_refresh(server: &MockServer, response: ResponseTemplate, calls: u64) {
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .and(body_json(json!({"refresh_token": "R1"})))
            .respond_with(response)
            .expect(calls)
            .mount(server)
            .await;
    }

    async fn mount_favorites(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/favorites"))
            .and(header("authorization", "Bearer A1"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/favorites"))
            .and(header("authorization", "Bearer A2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 3})))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn authenticated_channel_attaches_bearer() {
        let h = harness("/").await;
        signed_in(&h);
        Mock::given(method("GET"))
            .and(path("/users/me/profile"))
            .and(header("authorization", "Bearer A1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&h.server)
            .await;

        let body: serde_json::Value = h
            .client
            .authenticated(ApiRequest::get("/users/me/profile"))
            .await
            .unwrap();
        assert_eq!(body, json!({"ok": true}));
    }

    #[tokio::test]
    async fn public_channel_sends_no_credentials() {
        let h = harness("/").await;
        signed_in(&h);
        Mock::given(method("GET"))
            .and(path("/books"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&h.server)
            .await;

        let _: serde_json::Value = h.client.public(ApiRequest::get("/books")).await.unwrap();

        let requests = h.server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_request_resubmitted() {
        let h = harness("/favorites").await;
        signed_in(&h);
        mount_favorites(&h.server).await;
        mount_refresh(
            &h.server,
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "A2", "refresh_token": "R2"})),
            1,
        )
        .await;
        let mut updates = h.session.subscribe();

        let body: serde_json::Value = h
            .client
            .authenticated(ApiRequest::get("/favorites"))
            .await
            .unwrap();

        assert_eq!(body, json!({"total": 3}));
        assert_eq!(h.store.get(TokenSlot::Access).as_deref(), Some("A2"));
        assert_eq!(h.store.get(TokenSlot::Refresh).as_deref(), Some("R2"));
        assert_eq!(h.session.status(), SessionStatus::Authenticated);
        assert_eq!(
            updates.borrow_and_update().status(),
            SessionStatus::Authenticated
        );
        assert_eq!(h.history.entries(), vec!["/favorites"]);
    }

    #[tokio::test]
    async fn failed_refresh_ends_session_and_redirects() {
        let h = harness("/favorites").await;
        signed_in(&h);
        mount_favorites(&h.server).await;
        mount_refresh(
            &h.server,
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid refresh token"})),
            1,
        )
        .await;

        let result: Result<serde_json::Value, _> =
            h.client.authenticated(ApiRequest::get("/favorites")).await;

        match result {
            Err(Error::Refresh(RefreshFailure::Rejected { status, detail })) => {
                assert_eq!(status, 401);
                assert_eq!(detail, "Invalid refresh token");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(h.session.snapshot().is_empty());
        assert_eq!(h.store.get(TokenSlot::Access), None);
        assert_eq!(h.store.get(TokenSlot::Refresh), None);
        assert_eq!(
            h.history.location(),
            "/login?returnTo=%2Ffavorites&reason=session_expired"
        );
    }

    #[tokio::test]
    async fn always_unauthorized_retries_exactly_once() {
        let h = harness("/").await;
        signed_in(&h);
        Mock::given(method("GET"))
            .and(path("/recommendations"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&h.server)
            .await;
        mount_refresh(
            &h.server,
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "A2", "refresh_token": "R2"})),
            1,
        )
        .await;

        let result: Result<serde_json::Value, _> = h
            .client
            .authenticated(ApiRequest::get("/recommendations"))
            .await;

        assert!(matches!(result, Err(Error::Unauthorized)), "{result:?}");
        assert_eq!(h.session.status(), SessionStatus::Authenticated);
    }

    #[tokio::test]
    async fn concurrent_unauthorized_requests_share_one_refresh() {
        let h = harness("/").await;
        signed_in(&h);
        mount_favorites(&h.server).await;
        mount_refresh(
            &h.server,
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "A2", "refresh_token": "R2"}))
                .set_delay(Duration::from_millis(200)),
            1,
        )
        .await;

        let calls = (0..5).map(|_| {
            h.client
                .authenticated::<serde_json::Value>(ApiRequest::get("/favorites"))
        });
        let results = futures::future::join_all(calls).await;

        for result in results {
            assert_eq!(result.unwrap(), json!({"total": 3}));
        }
        assert_eq!(h.store.get(TokenSlot::Access).as_deref(), Some("A2"));
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_failed_refresh() {
        let h = harness("/favorites").await;
        signed_in(&h);
        mount_favorites(&h.server).await;
        mount_refresh(
            &h.server,
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "Invalid refresh token"}))
                .set_delay(Duration::from_millis(200)),
            1,
        )
        .await;

        let calls = (0..4).map(|_| {
            h.client
                .authenticated::<serde_json::Value>(ApiRequest::get("/favorites"))
        });
        let results = futures::future::join_all(calls).await;

        for result in results {
            assert!(
                matches!(
                    result,
                    Err(Error::Refresh(RefreshFailure::Rejected { status: 401, .. }))
                ),
                "{result:?}"
            );
        }
        assert!(h.session.snapshot().is_empty());
        assert_eq!(
            h.history.entries(),
            vec!["/favorites", "/login?returnTo=%2Ffavorites&reason=session_expired"]
        );
    }

    #[tokio::test]
    async fn unauthorized_without_refresh_token_is_final() {
        let h = harness("/").await;
        h.store.set(TokenSlot::Access, "A1").unwrap();
        h.session.load_persisted();
        Mock::given(method("GET"))
            .and(path("/favorites"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&h.server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&h.server)
            .await;

        let result: Result<serde_json::Value, _> =
            h.client.authenticated(ApiRequest::get("/favorites")).await;

        assert!(matches!(result, Err(Error::Unauthorized)));
        assert_eq!(h.store.get(TokenSlot::Access).as_deref(), Some("A1"));
        assert_eq!(h.history.entries(), vec!["/"]);
    }

    #[tokio::test]
    async fn other_failures_pass_through() {
        let h = harness("/").await;
        signed_in(&h);
        Mock::given(method("GET"))
            .and(path("/books/99"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Book not found"})))
            .mount(&h.server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&h.server)
            .await;

        let err = h
            .client
            .authenticated::<serde_json::Value>(ApiRequest::get("/books/99"))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(404));
        assert_eq!(err.detail(), Some("Book not found"));
        assert_eq!(err.to_string(), "GET /books/99 failed with status 404: Book not found");
    }

    #[tokio::test]
    async fn logout_during_refresh_wins() {
        let h = harness("/").await;
        signed_in(&h);
        mount_favorites(&h.server).await;
        mount_refresh(
            &h.server,
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "A2", "refresh_token": "R2"}))
                .set_delay(Duration::from_millis(300)),
            1,
        )
        .await;

        let client = h.client.clone();
        let pending = tokio::spawn(async move {
            client
                .authenticated::<serde_json::Value>(ApiRequest::get("/favorites"))
                .await
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        h.session.end();

        let result = pending.await.unwrap();
        assert!(
            matches!(result, Err(Error::Refresh(RefreshFailure::Superseded))),
            "{result:?}"
        );
        assert_eq!(h.session.access_token(), None);
        assert_eq!(h.store.get(TokenSlot::Access), None);
        assert_eq!(h.store.get(TokenSlot::Refresh), None);
    }

    #[tokio::test]
    async fn cancelled_request_reports_cancellation() {
        let h = harness("/").await;
        Mock::given(method("GET"))
            .and(path("/books"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&h.server)
            .await;

        let token = CancellationToken::new();
        let request = ApiRequest::get("/books").with_cancellation(token.clone());
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        });

        let result: Result<serde_json::Value, _> = h.client.public(request).await;
        canceller.await.unwrap();
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn extract_detail_variants() {
        assert_eq!(extract_detail(r#"{"detail": "Email already registered"}"#), "Email already registered");
        assert_eq!(
            extract_detail(r#"{"detail": [{"msg": "field required"}, {"msg": "too short"}]}"#),
            "field required; too short"
        );
        assert_eq!(extract_detail("Bad Gateway\n"), "Bad Gateway");
    }

    #[test]
    fn request_builder_collects_query() {
        let request = ApiRequest::get("/books")
            .with_query("page", 2)
            .with_optional_query("genre_id", None::<i64>)
            .with_optional_query("min_rating", Some(4.5));
        assert_eq!(
            request.query,
            vec![
                ("page".to_string(), "2".to_string()),
                ("min_rating".to_string(), "4.5".to_string())
            ]
        );
        assert_eq!(request.operation(), "GET /books");
    }
}
