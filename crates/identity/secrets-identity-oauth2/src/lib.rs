//! OAuth2 provider adapters for the secrets gateway.
//!
//! One generic Authorization Code client (with optional PKCE) serves all
//! four configured providers; a static registry built from configuration
//! selects the per-provider endpoints and scopes and normalizes the
//! userinfo payload into a [`NormalizedProfile`].

mod client;
mod config;
mod error;
mod registry;
mod state;
mod types;

pub use client::{OAuth2Client, PkceChallenge};
pub use config::OAuth2ProviderConfig;
pub use error::{OAuth2Error, OAuth2Result};
pub use registry::ProviderRegistry;
pub use state::{AuthFlowState, InMemoryStateStore, StateStore};
pub use types::{AuthorizationCallback, TokenResponse, UserInfoResponse};

pub use secrets_identity_core::{NormalizedProfile, ProviderKind};
