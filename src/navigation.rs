//! Navigation side effects and login-redirect URLs.

use std::sync::{Mutex, PoisonError};

use url::Url;

/// Query parameter carrying the location to return to after login.
pub const RETURN_TO_PARAM: &str = "returnTo";
/// Query parameter explaining why the user landed on the login page.
pub const REASON_PARAM: &str = "reason";
/// `reason` value used when a session could not be refreshed.
pub const SESSION_EXPIRED: &str = "session_expired";

/// Host-provided router.
///
/// The session layer calls [`navigate`](Navigator::navigate) for forced
/// redirects (session expiry, logout) and reads [`location`](Navigator::location)
/// to decide whether the user is on a protected route.
pub trait Navigator: Send + Sync + 'static {
    /// Current location as path plus optional query (e.g. `/books?page=2`).
    fn location(&self) -> String;

    /// Replace the current location.
    fn navigate(&self, to: &str);
}

/// In-memory navigation history.
///
/// Useful for headless clients and tests; every `navigate` call is recorded.
#[derive(Debug)]
pub struct History {
    entries: Mutex<Vec<String>>,
}

impl History {
    #[must_use]
    pub fn new(start: impl Into<String>) -> Self {
        Self {
            entries: Mutex::new(vec![start.into()]),
        }
    }

    /// All visited locations, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for History {
    fn location(&self) -> String {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
            .unwrap_or_else(|| "/".to_owned())
    }

    fn navigate(&self, to: &str) {
        tracing::debug!(to, "Navigating");
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(to.to_owned());
    }
}

/// Build a login URL that remembers where the user was headed.
#[must_use]
pub fn login_redirect(login_path: &str, return_to: Option<&str>, reason: Option<&str>) -> String {
    let params: Vec<String> = return_to
        .filter(|loc| is_local_path(loc) && !is_under(loc, login_path))
        .map(|loc| format!("{RETURN_TO_PARAM}={}", urlencoding::encode(loc)))
        .into_iter()
        .chain(reason.map(|r| format!("{REASON_PARAM}={}", urlencoding::encode(r))))
        .collect();

    if params.is_empty() {
        login_path.to_owned()
    } else {
        format!("{login_path}?{}", params.join("&"))
    }
}

/// The `returnTo` location recorded in `location`, if it is a safe local path.
#[must_use]
pub fn return_to(location: &str) -> Option<String> {
    let base = Url::parse("http://localhost/").ok()?;
    let url = base.join(location).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == RETURN_TO_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|target| is_local_path(target))
}

/// Whether the path part of `location` is `prefix` or lies below it.
///
/// Matching is per path segment: `/login` covers `/login/reset` but not
/// `/login-help`.
pub(crate) fn is_under(location: &str, prefix: &str) -> bool {
    let path = location.split(['?', '#']).next().unwrap_or(location);
    let prefix = prefix.trim_end_matches('/');
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Same-origin absolute path: starts with `/` but not `//`.
fn is_local_path(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.contains('\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_redirect_plain() {
        assert_eq!(login_redirect("/login", None, None), "/login");
    }

    #[test]
    fn test_login_redirect_encodes_return_to() {
        assert_eq!(
            login_redirect("/login", Some("/favorites?page=2"), None),
            "/login?returnTo=%2Ffavorites%3Fpage%3D2"
        );
        assert_eq!(
            login_redirect("/login", Some("/profile"), Some(SESSION_EXPIRED)),
            "/login?returnTo=%2Fprofile&reason=session_expired"
        );
    }

    #[test]
    fn test_login_redirect_skips_login_and_foreign_targets() {
        assert_eq!(login_redirect("/login", Some("/login?x=1"), None), "/login");
        assert_eq!(
            login_redirect("/login", Some("https://evil.example"), None),
            "/login"
        );
        assert_eq!(login_redirect("/login", Some("//evil.example"), None), "/login");
    }

    #[test]
    fn test_login_redirect_keeps_lookalike_paths() {
        assert_eq!(
            login_redirect("/login", Some("/login-help"), None),
            "/login?returnTo=%2Flogin-help"
        );
        assert_eq!(
            login_redirect("/login", Some("/loginfo?x=1"), None),
            "/login?returnTo=%2Floginfo%3Fx%3D1"
        );
        assert_eq!(login_redirect("/login", Some("/login/reset"), None), "/login");
    }

    #[test]
    fn test_is_under_matches_segments() {
        assert!(is_under("/profile", "/profile"));
        assert!(is_under("/profile/edit?tab=1", "/profile/"));
        assert!(is_under("/login#top", "/login"));
        assert!(!is_under("/profiles", "/profile"));
    }

    #[test]
    fn test_return_to_roundtrip() {
        let url = login_redirect("/login", Some("/favorites?page=2"), Some(SESSION_EXPIRED));
        assert_eq!(return_to(&url).as_deref(), Some("/favorites?page=2"));
    }

    #[test]
    fn test_return_to_rejects_external() {
        assert_eq!(return_to("/login?returnTo=https%3A%2F%2Fevil.example"), None);
        assert_eq!(return_to("/login?returnTo=%2F%2Fevil.example"), None);
        assert_eq!(return_to("/login"), None);
    }

    #[test]
    fn test_history_records_navigation() {
        let history = History::new("/books");
        assert_eq!(history.location(), "/books");
        history.navigate("/login");
        assert_eq!(history.location(), "/login");
        assert_eq!(history.entries(), vec!["/books", "/login"]);
    }
}
