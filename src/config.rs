use url::Url;

use crate::error::Error;
use crate::navigation::is_under;

const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

/// PlotTwist client configuration.
///
/// The API base URL is the only required value; routing paths default to
/// the web client's conventions and can be overridden with `with_*` methods.
///
/// ```rust,ignore
/// use plottwist_client::ClientConfig;
///
/// let config = ClientConfig::new("https://api.plottwist.example/api/v1".parse()?)
///     .with_landing_path("/books");
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ClientConfig {
    pub(crate) api_base: Url,
    pub(crate) login_path: String,
    pub(crate) landing_path: String,
    pub(crate) protected_routes: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL.parse().expect("valid default URL"))
    }
}

impl ClientConfig {
    /// Create a configuration for the API rooted at `api_base`.
    #[must_use]
    pub fn new(api_base: Url) -> Self {
        Self {
            api_base: normalize_base(api_base),
            login_path: "/login".into(),
            landing_path: "/dashboard".into(),
            protected_routes: ["/dashboard", "/profile", "/favorites", "/recommendations"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Optional env vars
    /// - `PLOTTWIST_API_URL`: API base URL (default `http://localhost:8000/api/v1`)
    /// - `PLOTTWIST_LOGIN_PATH`: login entry point
    /// - `PLOTTWIST_LANDING_PATH`: default location after login
    /// - `PLOTTWIST_PROTECTED_ROUTES`: comma-separated protected route prefixes
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `PLOTTWIST_API_URL` is not a valid URL.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let api_base = match var("PLOTTWIST_API_URL") {
            Some(url_str) => url_str
                .parse()
                .map_err(|e| Error::Config(format!("PLOTTWIST_API_URL: {e}")))?,
            None => DEFAULT_API_URL.parse().expect("valid default URL"),
        };

        let mut config = Self::new(api_base);
        if let Some(path) = var("PLOTTWIST_LOGIN_PATH") {
            config = config.with_login_path(path);
        }
        if let Some(path) = var("PLOTTWIST_LANDING_PATH") {
            config = config.with_landing_path(path);
        }
        if let Some(routes) = var("PLOTTWIST_PROTECTED_ROUTES") {
            config = config.with_protected_routes(
                routes
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect(),
            );
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    #[must_use]
    pub fn with_landing_path(mut self, path: impl Into<String>) -> Self {
        self.landing_path = path.into();
        self
    }

    /// Replace the set of route prefixes that require an authenticated session.
    #[must_use]
    pub fn with_protected_routes(mut self, routes: Vec<String>) -> Self {
        self.protected_routes = routes;
        self
    }

    /// API base URL (always ends with `/`).
    #[must_use]
    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Location of the login page.
    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Default destination after a successful login.
    #[must_use]
    pub fn landing_path(&self) -> &str {
        &self.landing_path
    }

    /// Route prefixes that require an authenticated session.
    #[must_use]
    pub fn protected_routes(&self) -> &[String] {
        &self.protected_routes
    }

    /// Whether `location` falls under one of the protected route prefixes.
    ///
    /// Matching is per path segment: `/profile` protects `/profile/edit`
    /// but not `/profiles`.
    #[must_use]
    pub fn is_protected(&self, location: &str) -> bool {
        self.protected_routes
            .iter()
            .any(|prefix| is_under(location, prefix))
    }

    /// Resolve an API path (e.g. `/auth/login`) against the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if the path cannot be joined.
    pub fn endpoint(&self, path: &str) -> Result<Url, Error> {
        self.api_base
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::InvalidRequest(format!("{path}: {e}")))
    }
}

fn normalize_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base().as_str(), "http://localhost:8000/api/v1/");
        assert_eq!(config.login_path(), "/login");
        assert_eq!(config.landing_path(), "/dashboard");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let config = ClientConfig::new("https://api.example.com/api/v1".parse().unwrap());
        assert_eq!(
            config.endpoint("/auth/login").unwrap().as_str(),
            "https://api.example.com/api/v1/auth/login"
        );
        assert_eq!(
            config.endpoint("books/3").unwrap().as_str(),
            "https://api.example.com/api/v1/books/3"
        );
    }

    #[test]
    fn test_is_protected_matches_segments() {
        let config = ClientConfig::default();
        assert!(config.is_protected("/dashboard"));
        assert!(config.is_protected("/profile/edit"));
        assert!(config.is_protected("/favorites?page=2"));
        assert!(!config.is_protected("/profiles"));
        assert!(!config.is_protected("/books/1"));
        assert!(!config.is_protected("/login"));
    }

    #[test]
    fn test_from_vars_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("PLOTTWIST_API_URL", "https://api.example.com/v2"),
            ("PLOTTWIST_LANDING_PATH", "/books"),
            ("PLOTTWIST_PROTECTED_ROUTES", "/me, /settings,"),
        ]);
        let config = ClientConfig::from_vars(|k| vars.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.api_base().as_str(), "https://api.example.com/v2/");
        assert_eq!(config.landing_path(), "/books");
        assert_eq!(config.login_path(), "/login");
        assert_eq!(config.protected_routes(), &["/me", "/settings"]);
    }

    #[test]
    fn test_from_vars_rejects_bad_url() {
        let result = ClientConfig::from_vars(|k| {
            (k == "PLOTTWIST_API_URL").then(|| "not a url".to_string())
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
