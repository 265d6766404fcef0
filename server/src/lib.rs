//! The secrets gateway server: routing, the session gate, and the HTML
//! surface over the identity crates.

pub mod auth;
pub mod config;
pub mod pages;
pub mod routes;

use axum::Router;
use axum::extract::FromRef;
use axum::routing::get;
use axum_extra::extract::cookie::Key;
use secrets_identity_core::UserStore;
use secrets_identity_local::LocalCredentials;
use secrets_identity_oauth2::ProviderRegistry;
use secrets_identity_session::{SessionConfig, SessionManager};
use secrets_identity_store::{IdentityResolver, InMemoryUserStore};
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::config::AppConfig;

/// Name of the signed cookie carrying the opaque session token.
pub const SESSION_COOKIE: &str = "secrets_session";

/// Dependencies shared across handlers, passed in at construction rather
/// than held as globals.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub sessions: Arc<SessionManager>,
    pub local: LocalCredentials,
    pub resolver: IdentityResolver,
    pub providers: Arc<ProviderRegistry>,
    cookie_key: Key,
}

impl AppState {
    pub fn new(
        store: Arc<dyn UserStore>,
        sessions: SessionManager,
        providers: ProviderRegistry,
        cookie_key: Key,
    ) -> Self {
        Self {
            local: LocalCredentials::new(store.clone()),
            resolver: IdentityResolver::new(store.clone()),
            store,
            sessions: Arc::new(sessions),
            providers: Arc::new(providers),
            cookie_key,
        }
    }

    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new());
        let sessions = SessionManager::new(SessionConfig {
            ttl: chrono::Duration::hours(config.session_ttl_hours),
        });
        let providers = config.build_registry()?;
        let cookie_key = Key::derive_from(config.session_secret.as_bytes());

        Ok(Self::new(store, sessions, providers, cookie_key))
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Key {
        state.cookie_key.clone()
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::home))
        .route("/login", get(routes::login_form).post(routes::login))
        .route("/register", get(routes::register_form).post(routes::register))
        .route("/secrets", get(routes::secrets))
        .route("/logout", get(routes::logout))
        .route("/submit", get(routes::submit_form).post(routes::submit))
        .route("/auth/{provider}", get(routes::auth_initiate))
        .route("/auth/{provider}/secrets", get(routes::auth_callback))
        .nest_service("/static", ServeDir::new("server/static"))
        .with_state(state)
}
