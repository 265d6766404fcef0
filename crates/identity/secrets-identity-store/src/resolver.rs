//! Identity resolution policy: converge a partial identity description
//! from any authentication path onto exactly one user record.

use secrets_identity_core::{
    IdentityError, IdentityResult, ResolveCriteria, User, UserStore,
};
use std::sync::Arc;
use tracing::info;

/// Looks up or creates the user record a set of criteria points at.
///
/// Matching is exact and keyed only on the single identifier the criteria
/// supply. A record located via one identifier is returned unchanged; no
/// merging of additional identifiers onto records found another way.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn UserStore>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn resolve_or_create(&self, criteria: ResolveCriteria) -> IdentityResult<User> {
        match criteria {
            ResolveCriteria::Local { username } => self
                .store
                .find_by_username(&username)
                .await?
                .ok_or(IdentityError::InvalidCredentials),
            ResolveCriteria::Provider(profile) => {
                let user = self.store.find_or_create_by_provider(&profile).await?;
                info!(
                    provider = %profile.provider,
                    user_id = %user.id,
                    "resolved provider identity"
                );
                Ok(user)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryUserStore;
    use secrets_identity_core::{NormalizedProfile, ProviderKind};

    fn resolver_with_store() -> (IdentityResolver, Arc<InMemoryUserStore>) {
        let store = Arc::new(InMemoryUserStore::new());
        (IdentityResolver::new(store.clone()), store)
    }

    #[tokio::test]
    async fn provider_criteria_create_then_reuse() {
        let (resolver, store) = resolver_with_store();
        let profile = NormalizedProfile {
            provider: ProviderKind::Twitter,
            external_id: "t-7".to_string(),
            display_name: None,
            email: None,
        };

        let first = resolver
            .resolve_or_create(ResolveCriteria::Provider(profile.clone()))
            .await
            .unwrap();
        let second = resolver
            .resolve_or_create(ResolveCriteria::Provider(profile))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn local_criteria_never_create() {
        let (resolver, store) = resolver_with_store();

        let err = resolver
            .resolve_or_create(ResolveCriteria::Local {
                username: "ghost".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, IdentityError::InvalidCredentials));
        assert_eq!(store.user_count().await, 0);
    }

    #[tokio::test]
    async fn local_and_provider_identities_stay_separate() {
        let (resolver, store) = resolver_with_store();
        store
            .create(User::new_local("human".to_string(), "hash".to_string()))
            .await
            .unwrap();

        // The same human authenticating via Twitter gets a fresh record;
        // identifiers are not merged across lookup keys.
        let via_twitter = resolver
            .resolve_or_create(ResolveCriteria::Provider(NormalizedProfile {
                provider: ProviderKind::Twitter,
                external_id: "human-tw".to_string(),
                display_name: Some("human".to_string()),
                email: None,
            }))
            .await
            .unwrap();

        assert!(via_twitter.username.is_none());
        assert_eq!(store.user_count().await, 2);
    }
}
