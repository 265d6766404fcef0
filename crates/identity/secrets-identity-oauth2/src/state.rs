//! CSRF state management for in-flight authorization handshakes.
//!
//! State records are single-use: retrieval removes them, so a replayed
//! callback finds nothing. An initiation whose callback never arrives
//! leaves only a record that expires.

use crate::error::{OAuth2Error, OAuth2Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use secrets_identity_core::ProviderKind;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct AuthFlowState {
    pub state: String,
    pub provider: ProviderKind,
    pub code_verifier: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AuthFlowState {
    pub fn new(provider: ProviderKind, code_verifier: Option<String>, ttl_seconds: u64) -> Self {
        let state = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let expires_at = created_at + Duration::seconds(ttl_seconds as i64);

        Self {
            state,
            provider,
            code_verifier,
            created_at,
            expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

#[async_trait]
pub trait StateStore: Send + Sync {
    async fn store(&self, state: AuthFlowState) -> OAuth2Result<()>;

    /// Retrieve and remove a state by its state parameter.
    async fn retrieve(&self, state: &str) -> OAuth2Result<AuthFlowState>;

    async fn cleanup_expired(&self) -> OAuth2Result<usize>;
}

#[derive(Default)]
pub struct InMemoryStateStore {
    states: Arc<RwLock<HashMap<String, AuthFlowState>>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn store(&self, state: AuthFlowState) -> OAuth2Result<()> {
        let mut states = self.states.write().await;
        states.insert(state.state.clone(), state);
        Ok(())
    }

    async fn retrieve(&self, state: &str) -> OAuth2Result<AuthFlowState> {
        let mut states = self.states.write().await;
        let flow_state = states.remove(state).ok_or(OAuth2Error::StateNotFound)?;

        if flow_state.is_expired() {
            return Err(OAuth2Error::StateNotFound);
        }

        Ok(flow_state)
    }

    async fn cleanup_expired(&self) -> OAuth2Result<usize> {
        let mut states = self.states.write().await;
        let now = Utc::now();

        let expired_keys: Vec<String> = states
            .iter()
            .filter(|(_, state)| now > state.expires_at)
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();
        for key in expired_keys {
            states.remove(&key);
        }

        Ok(count)
    }
}
