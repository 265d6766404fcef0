//! Static provider registry: the single capability surface the routing
//! layer talks to (`initiate`, `handle_callback` -> profile).

use crate::client::OAuth2Client;
use crate::config::OAuth2ProviderConfig;
use crate::error::{OAuth2Error, OAuth2Result};
use crate::state::InMemoryStateStore;
use crate::types::AuthorizationCallback;
use secrets_identity_core::{NormalizedProfile, ProviderKind};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

const DEFAULT_STATE_TTL_SECONDS: u64 = 600;
const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;

pub struct ProviderRegistry {
    client: OAuth2Client,
    configs: HashMap<ProviderKind, OAuth2ProviderConfig>,
}

impl ProviderRegistry {
    pub fn new() -> OAuth2Result<Self> {
        let state_store = Arc::new(InMemoryStateStore::new());
        let client = OAuth2Client::new(
            state_store,
            DEFAULT_STATE_TTL_SECONDS,
            DEFAULT_HTTP_TIMEOUT_SECONDS,
        )?;

        Ok(Self {
            client,
            configs: HashMap::new(),
        })
    }

    pub fn register(&mut self, config: OAuth2ProviderConfig) {
        info!(provider = %config.provider, "registered identity provider");
        self.configs.insert(config.provider, config);
    }

    pub fn is_enabled(&self, kind: ProviderKind) -> bool {
        self.configs.contains_key(&kind)
    }

    pub fn enabled_providers(&self) -> Vec<ProviderKind> {
        let mut kinds: Vec<_> = self.configs.keys().copied().collect();
        kinds.sort_by_key(|k| k.as_str());
        kinds
    }

    fn config_for(&self, kind: ProviderKind) -> OAuth2Result<&OAuth2ProviderConfig> {
        self.configs
            .get(&kind)
            .ok_or_else(|| OAuth2Error::ProviderNotConfigured(kind.to_string()))
    }

    /// Starts the handshake: returns the authorization URL to redirect
    /// the client to.
    pub async fn initiate(&self, kind: ProviderKind) -> OAuth2Result<String> {
        let config = self.config_for(kind)?;
        let (url, _state) = self.client.authorization_url(config).await?;
        Ok(url)
    }

    /// Completes the handshake: validates state, exchanges the code,
    /// fetches userinfo, and returns the normalized profile.
    pub async fn handle_callback(
        &self,
        kind: ProviderKind,
        callback: &AuthorizationCallback,
    ) -> OAuth2Result<NormalizedProfile> {
        let config = self.config_for(kind)?;

        let tokens = self.client.handle_callback(config, callback).await?;
        let user_info = self.client.get_user_info(config, &tokens.access_token).await?;

        Ok(NormalizedProfile {
            provider: kind,
            external_id: user_info.sub,
            display_name: user_info.name,
            email: user_info.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn generic_config(server_uri: &str) -> OAuth2ProviderConfig {
        OAuth2ProviderConfig::generic(
            "client-id".to_string(),
            "client-secret".to_string(),
            format!("{server_uri}/authorize"),
            format!("{server_uri}/token"),
            format!("{server_uri}/userinfo"),
            "http://localhost:3000/auth/oauth2/secrets".to_string(),
        )
    }

    #[tokio::test]
    async fn initiation_for_unconfigured_provider_fails() {
        let registry = ProviderRegistry::new().unwrap();
        let err = registry.initiate(ProviderKind::Google).await.unwrap_err();
        assert!(matches!(err, OAuth2Error::ProviderNotConfigured(_)));
    }

    #[tokio::test]
    async fn full_callback_flow_against_mock_provider() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=the-code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "mock-access-token",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sub": "g-42",
                "name": "Mock User",
                "email": "mock@example.com"
            })))
            .mount(&mock_server)
            .await;

        let mut registry = ProviderRegistry::new().unwrap();
        registry.register(generic_config(&mock_server.uri()));

        let auth_url = registry.initiate(ProviderKind::OAuth2).await.unwrap();
        let parsed = Url::parse(&auth_url).unwrap();
        let state = parsed
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.to_string())
            .unwrap();

        let profile = registry
            .handle_callback(
                ProviderKind::OAuth2,
                &AuthorizationCallback {
                    code: Some("the-code".to_string()),
                    state: Some(state),
                    error: None,
                    error_description: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(profile.provider, ProviderKind::OAuth2);
        assert_eq!(profile.external_id, "g-42");
        assert_eq!(profile.display_name.as_deref(), Some("Mock User"));
        assert_eq!(profile.email.as_deref(), Some("mock@example.com"));
    }

    #[tokio::test]
    async fn replayed_callback_is_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "mock-access-token",
                "token_type": "Bearer"
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sub": "g-42"
            })))
            .mount(&mock_server)
            .await;

        let mut registry = ProviderRegistry::new().unwrap();
        registry.register(generic_config(&mock_server.uri()));

        let auth_url = registry.initiate(ProviderKind::OAuth2).await.unwrap();
        let state = Url::parse(&auth_url)
            .unwrap()
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.to_string())
            .unwrap();

        let callback = AuthorizationCallback {
            code: Some("the-code".to_string()),
            state: Some(state),
            error: None,
            error_description: None,
        };

        registry
            .handle_callback(ProviderKind::OAuth2, &callback)
            .await
            .unwrap();

        // The state record was consumed by the first callback.
        let err = registry
            .handle_callback(ProviderKind::OAuth2, &callback)
            .await
            .unwrap_err();
        assert!(matches!(err, OAuth2Error::StateNotFound));
    }
}
