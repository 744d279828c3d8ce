#![doc = include_str!("../README.md")]

pub mod auth;
pub mod bootstrap;
pub mod client;
pub mod config;
pub mod error;
pub mod guard;
pub mod navigation;
#[cfg(feature = "resources")]
pub mod resources;
pub mod session;
pub mod store;
pub mod types;

// Re-exports for convenient access
pub use auth::Authenticator;
pub use bootstrap::BootstrapOutcome;
pub use client::{ApiClient, ApiRequest};
pub use config::ClientConfig;
pub use error::{Error, RefreshFailure};
pub use guard::{GateDecision, protected_gate, public_only_gate};
pub use navigation::{History, Navigator};
pub use session::{Session, SessionSnapshot, SessionStatus};
pub use store::{FileTokenStore, MemoryTokenStore, TokenSlot, TokenStore};
pub use types::{
    AccessToken, AuthResponse, Credentials, RefreshToken, Registration, TokenPair, User, UserId,
};
pub use tokio_util::sync::CancellationToken;
