//! The process-wide authentication record.
//!
//! [`Session`] is the only writer of the token store. Each transition runs
//! as one synchronous `watch` update that also writes the store, so the
//! in-memory record and the persisted slots never diverge across an
//! `.await`.

use std::sync::Arc;

use tokio::sync::watch;

use crate::store::{MemoryTokenStore, TokenSlot, TokenStore};
use crate::types::{AccessToken, RefreshToken, TokenPair, User};

/// Authentication status, derived from the session contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// No validated identity. Tokens may exist but have not been checked yet.
    #[default]
    Anonymous,
    /// A login, registration or validation call is outstanding.
    Pending,
    /// User and access token are both present.
    Authenticated,
    /// The last attempt failed.
    Invalid,
}

impl SessionStatus {
    #[must_use]
    pub fn is_authenticated(self) -> bool {
        self == Self::Authenticated
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Idle,
    Pending,
    Failed,
}

/// Point-in-time copy of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    user: Option<User>,
    access_token: Option<AccessToken>,
    refresh_token: Option<RefreshToken>,
    phase: Phase,
    last_error: Option<String>,
    storage_degraded: bool,
    generation: u64,
}

impl SessionSnapshot {
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        match self.phase {
            Phase::Pending => SessionStatus::Pending,
            _ if self.user.is_some() && self.access_token.is_some() => {
                SessionStatus::Authenticated
            }
            Phase::Failed => SessionStatus::Invalid,
            Phase::Idle => SessionStatus::Anonymous,
        }
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&AccessToken> {
        self.access_token.as_ref()
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<&RefreshToken> {
        self.refresh_token.as_ref()
    }

    /// Failure reason of the last login/registration/validation attempt.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// `true` once a token store write has failed. The session keeps
    /// working in memory but will not survive a restart.
    #[must_use]
    pub fn storage_degraded(&self) -> bool {
        self.storage_degraded
    }

    /// Number of times the session has been established or torn down.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Anonymous, holding no tokens and no error.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status() == SessionStatus::Anonymous
            && self.access_token.is_none()
            && self.refresh_token.is_none()
            && self.last_error.is_none()
    }

    fn clear_identity(&mut self) {
        self.user = None;
        self.access_token = None;
        self.refresh_token = None;
    }
}

/// Injectable session shared by the HTTP layer, the authenticator and route guards.
pub struct Session {
    store: Arc<dyn TokenStore>,
    state: watch::Sender<SessionSnapshot>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create an empty session backed by `store`.
    ///
    /// Persisted tokens are not read until [`Authenticator::bootstrap`](crate::Authenticator::bootstrap).
    #[must_use]
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::default());
        Self { store, state }
    }

    /// Session whose tokens only live for the current process.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStore::new()))
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.state.borrow().status()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    #[must_use]
    pub fn access_token(&self) -> Option<AccessToken> {
        self.state.borrow().access_token.clone()
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<RefreshToken> {
        self.state.borrow().refresh_token.clone()
    }

    /// Receiver notified on every transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Clear `last_error` without changing the status.
    pub fn clear_error(&self) {
        self.state.send_if_modified(|state| state.last_error.take().is_some());
    }

    // ── Transitions ────────────────────────────────────────────────

    /// Copy persisted tokens into memory unless a session is already held.
    /// Returns whether an access token is now present.
    pub(crate) fn load_persisted(&self) -> bool {
        let access = self.store.get(TokenSlot::Access).filter(|t| !t.is_empty());
        let refresh = self.store.get(TokenSlot::Refresh).filter(|t| !t.is_empty());
        self.state.send_if_modified(|state| {
            if state.access_token.is_some() {
                return false;
            }
            state.access_token = access.map(AccessToken::new);
            state.refresh_token = refresh.map(RefreshToken::new);
            true
        });
        self.state.borrow().access_token.is_some()
    }

    pub(crate) fn begin_attempt(&self) {
        self.state.send_modify(|state| {
            state.phase = Phase::Pending;
            state.last_error = None;
        });
    }

    /// Login or registration succeeded.
    pub(crate) fn establish(&self, user: User, tokens: TokenPair) {
        self.state.send_modify(|state| {
            state.user = Some(user);
            state.access_token = Some(tokens.access_token);
            state.refresh_token = Some(tokens.refresh_token);
            state.phase = Phase::Idle;
            state.last_error = None;
            state.generation += 1;
            self.sync_store(state);
        });
    }

    /// Login or registration failed. Tokens are left untouched.
    pub(crate) fn fail_attempt(&self, message: String) {
        self.state.send_modify(|state| {
            state.phase = Phase::Failed;
            state.last_error = Some(message);
        });
    }

    /// "Who am I" succeeded. Returns `false` if the session was ended or
    /// replaced since `generation`, in which case nothing changes.
    pub(crate) fn confirm_user(&self, generation: u64, user: User) -> bool {
        self.state.send_if_modified(|state| {
            if state.generation != generation || state.access_token.is_none() {
                return false;
            }
            state.user = Some(user);
            state.phase = Phase::Idle;
            state.last_error = None;
            self.sync_store(state);
            true
        })
    }

    /// "Who am I" failed: drop identity and tokens. Skipped if the session
    /// was already ended or replaced since `generation`.
    pub(crate) fn invalidate(&self, generation: u64, message: String) -> bool {
        self.state.send_if_modified(|state| {
            if state.generation != generation {
                return false;
            }
            state.clear_identity();
            state.phase = Phase::Failed;
            state.last_error = Some(message);
            state.generation += 1;
            self.sync_store(state);
            true
        })
    }

    /// Fold a failed attempt back into a silent `Anonymous`.
    pub(crate) fn settle_anonymous(&self) {
        self.state.send_if_modified(|state| {
            let changed = state.phase == Phase::Failed || state.last_error.is_some();
            if state.phase == Phase::Failed {
                state.phase = Phase::Idle;
            }
            state.last_error = None;
            changed
        });
    }

    /// Refresh token plus the generation a refresh started under.
    pub(crate) fn refresh_ticket(&self) -> Option<(u64, RefreshToken)> {
        let state = self.state.borrow();
        state
            .refresh_token
            .clone()
            .map(|token| (state.generation, token))
    }

    /// Store a refreshed pair unless the session was torn down or replaced
    /// since `generation`.
    pub(crate) fn apply_refresh(&self, generation: u64, tokens: &TokenPair) -> bool {
        self.state.send_if_modified(|state| {
            if state.generation != generation || state.refresh_token.is_none() {
                return false;
            }
            state.access_token = Some(tokens.access_token.clone());
            state.refresh_token = Some(tokens.refresh_token.clone());
            self.sync_store(state);
            true
        })
    }

    /// Refresh failed: tear down like a logout, unless the session already
    /// moved past `generation`.
    pub(crate) fn expire(&self, generation: u64) -> bool {
        self.state.send_if_modified(|state| {
            if state.generation != generation {
                return false;
            }
            state.clear_identity();
            state.phase = Phase::Idle;
            state.last_error = None;
            state.generation += 1;
            self.sync_store(state);
            true
        })
    }

    /// Logout: clear everything unconditionally.
    pub(crate) fn end(&self) {
        self.state.send_modify(|state| {
            state.clear_identity();
            state.phase = Phase::Idle;
            state.last_error = None;
            state.generation += 1;
            self.sync_store(state);
        });
    }

    /// Replace the user record of the current identity (profile edits).
    #[cfg_attr(not(feature = "resources"), allow(dead_code))]
    pub(crate) fn update_user(&self, user: User) -> bool {
        self.state.send_if_modified(|state| {
            if state.status() != SessionStatus::Authenticated
                || state.user.as_ref().map(|u| u.id) != Some(user.id)
            {
                return false;
            }
            state.user = Some(user);
            true
        })
    }

    /// Make the store mirror the in-memory tokens. Failures are latched
    /// into `storage_degraded` rather than returned.
    fn sync_store(&self, state: &mut SessionSnapshot) {
        let desired = [
            (
                TokenSlot::Access,
                state.access_token.as_ref().map(AccessToken::as_str),
            ),
            (
                TokenSlot::Refresh,
                state.refresh_token.as_ref().map(RefreshToken::as_str),
            ),
        ];
        let mut degraded = false;
        for (slot, value) in desired {
            let result = match value {
                Some(v) if self.store.get(slot).as_deref() == Some(v) => Ok(()),
                Some(v) => self.store.set(slot, v),
                None => self.store.clear(slot),
            };
            if let Err(e) = result {
                tracing::warn!(slot = slot.key(), error = %e, "Token store write failed; session will not persist");
                degraded = true;
            }
        }
        state.storage_degraded |= degraded;
    }
}
