//! Session management with opaque, cryptographically random tokens.
//!
//! Tokens carry no identity material; the binding from token to user id
//! lives only in the manager's shared map. Revocation is immediately
//! visible to every subsequent resolve.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use rand::{Rng, thread_rng};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(24),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

#[derive(Clone)]
pub struct SessionManager {
    config: SessionConfig,
    sessions: Arc<RwLock<HashMap<String, SessionRecord>>>,
}

impl SessionManager {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Binds a fresh opaque token to `user_id` and returns it.
    pub async fn establish(&self, user_id: &str) -> String {
        let token = generate_token();
        let created_at = Utc::now();
        let record = SessionRecord {
            user_id: user_id.to_string(),
            created_at,
            expires_at: created_at + self.config.ttl,
        };

        let mut sessions = self.sessions.write().await;
        sessions.insert(token.clone(), record);
        debug!(user_id, "session established");
        token
    }

    /// Returns the bound user id, or `None` uniformly for unknown,
    /// malformed, or expired tokens. Expired entries are removed lazily.
    pub async fn resolve(&self, token: &str) -> Option<String> {
        {
            let sessions = self.sessions.read().await;
            match sessions.get(token) {
                Some(record) if !record.is_expired() => return Some(record.user_id.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: drop it so the map does not grow unbounded.
        let mut sessions = self.sessions.write().await;
        sessions.remove(token);
        None
    }

    /// Invalidates the session. Idempotent; unknown tokens are a no-op.
    pub async fn revoke(&self, token: &str) {
        let mut sessions = self.sessions.write().await;
        if sessions.remove(token).is_some() {
            debug!("session revoked");
        }
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

/// 32 random bytes, base64url without padding.
fn generate_token() -> String {
    let mut rng = thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.r#gen::<u8>()).collect();
    URL_SAFE_NO_PAD.encode(bytes)
}
