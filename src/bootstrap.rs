//! One-time startup reconciliation of persisted tokens with the backend.

use crate::auth::Authenticator;
use crate::types::User;

/// Result of [`Authenticator::bootstrap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// Nothing was persisted; no network call was made.
    Anonymous,
    /// The persisted (or already live) session is valid.
    Restored(User),
    /// The persisted tokens were rejected and have been discarded.
    Rejected,
}

impl BootstrapOutcome {
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Restored(user) => Some(user),
            Self::Anonymous | Self::Rejected => None,
        }
    }
}

impl Authenticator {
    /// Load persisted tokens and validate them.
    ///
    /// Runs at most once per `Authenticator`; later calls return the first
    /// outcome. A rejected session falls back to `Anonymous` silently, except
    /// that a user on a protected route is sent to login. A refresh that
    /// fails along the way ends the session like any other refresh failure,
    /// including the redirect to login.
    pub async fn bootstrap(&self) -> BootstrapOutcome {
        self.bootstrapped
            .get_or_init(|| self.reconcile())
            .await
            .clone()
    }

    async fn reconcile(&self) -> BootstrapOutcome {
        let session = self.session();
        if !session.load_persisted() {
            tracing::debug!("No persisted session");
            return BootstrapOutcome::Anonymous;
        }
        let snapshot = session.snapshot();
        if snapshot.status().is_authenticated()
            && let Some(user) = snapshot.user()
        {
            return BootstrapOutcome::Restored(user.clone());
        }

        match self.validate_session().await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "Restored persisted session");
                BootstrapOutcome::Restored(user)
            }
            Err(e) => {
                tracing::info!(error = %e, "Persisted session rejected");
                session.settle_anonymous();
                BootstrapOutcome::Rejected
            }
        }
    }
}
