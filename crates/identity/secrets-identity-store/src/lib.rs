//! In-memory [`UserStore`] implementation and the identity resolution
//! policy that sits between the authentication paths and the store.

mod resolver;

pub use resolver::IdentityResolver;

use async_trait::async_trait;
use secrets_identity_core::{
    IdentityError, IdentityResult, NormalizedProfile, ProviderKind, SubmittedSecret, User,
    UserStore,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Default)]
struct StoreInner {
    users: HashMap<String, User>,
    secrets: Vec<SubmittedSecret>,
}

impl StoreInner {
    fn by_username(&self, username: &str) -> Option<&User> {
        self.users
            .values()
            .find(|u| u.username.as_deref() == Some(username))
    }

    fn by_provider_id(&self, kind: ProviderKind, external_id: &str) -> Option<&User> {
        self.users
            .values()
            .find(|u| u.provider_id(kind) == Some(external_id))
    }

    /// Uniqueness check against every addressable identifier of `user`.
    fn collides(&self, user: &User) -> bool {
        if let Some(username) = user.username.as_deref() {
            if self.by_username(username).is_some() {
                return true;
            }
        }
        ProviderKind::ALL.iter().any(|kind| {
            user.provider_id(*kind)
                .is_some_and(|id| self.by_provider_id(*kind, id).is_some())
        })
    }
}

/// Process-local user store. Both lookups and the check-then-create paths
/// run under one `RwLock`, which is what makes `create` and
/// `find_or_create_by_provider` atomic with respect to the identifiers
/// they touch.
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.inner.read().await.users.len()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: &str) -> IdentityResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> IdentityResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.by_username(username).cloned())
    }

    async fn find_by_provider_id(
        &self,
        kind: ProviderKind,
        external_id: &str,
    ) -> IdentityResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.by_provider_id(kind, external_id).cloned())
    }

    async fn create(&self, mut user: User) -> IdentityResult<User> {
        let mut inner = self.inner.write().await;

        if inner.collides(&user) {
            let name = user.username.clone().unwrap_or_else(|| "<provider>".to_string());
            return Err(IdentityError::DuplicateUser(name));
        }

        user.id = Uuid::new_v4().to_string();
        inner.users.insert(user.id.clone(), user.clone());
        debug!(user_id = %user.id, "created user record");
        Ok(user)
    }

    async fn find_or_create_by_provider(
        &self,
        profile: &NormalizedProfile,
    ) -> IdentityResult<User> {
        // Single write lock across lookup and insert so two concurrent
        // resolutions of the same new external id cannot both create.
        let mut inner = self.inner.write().await;

        if let Some(existing) = inner.by_provider_id(profile.provider, &profile.external_id) {
            return Ok(existing.clone());
        }

        let mut user = User::from_profile(profile);
        user.id = Uuid::new_v4().to_string();
        inner.users.insert(user.id.clone(), user.clone());
        debug!(
            user_id = %user.id,
            provider = %profile.provider,
            "created user record from provider profile"
        );
        Ok(user)
    }

    async fn add_secret(&self, user_id: &str, text: String) -> IdentityResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(user_id) {
            return Err(IdentityError::StoreUnavailable(format!(
                "no such user: {user_id}"
            )));
        }
        inner.secrets.push(SubmittedSecret {
            user_id: user_id.to_string(),
            text,
            submitted_at: chrono::Utc::now(),
        });
        Ok(())
    }

    async fn secrets_for(&self, user_id: &str) -> IdentityResult<Vec<SubmittedSecret>> {
        let inner = self.inner.read().await;
        Ok(inner
            .secrets
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }
}
