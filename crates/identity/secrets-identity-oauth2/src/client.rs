//! Generic Authorization Code client with PKCE support.

use crate::config::OAuth2ProviderConfig;
use crate::error::{OAuth2Error, OAuth2Result};
use crate::state::{AuthFlowState, StateStore};
use crate::types::{AuthorizationCallback, TokenResponse, UserInfoResponse};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, thread_rng};
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

/// PKCE code challenge and verifier pair (S256).
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    pub code_verifier: String,
    pub code_challenge: String,
    pub code_challenge_method: String,
}

impl Default for PkceChallenge {
    fn default() -> Self {
        Self::new()
    }
}

impl PkceChallenge {
    pub fn new() -> Self {
        let code_verifier = Self::generate_code_verifier();
        let code_challenge = Self::generate_code_challenge(&code_verifier);

        Self {
            code_verifier,
            code_challenge,
            code_challenge_method: "S256".to_string(),
        }
    }

    fn generate_code_verifier() -> String {
        let mut rng = thread_rng();
        let bytes: Vec<u8> = (0..64).map(|_| rng.r#gen::<u8>()).collect();
        URL_SAFE_NO_PAD.encode(bytes)
    }

    fn generate_code_challenge(verifier: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }
}

/// HTTP client for the Authorization Code flow, shared by all providers.
#[derive(Clone)]
pub struct OAuth2Client {
    http_client: Client,
    state_store: Arc<dyn StateStore>,
    state_ttl_seconds: u64,
}

impl OAuth2Client {
    pub fn new(
        state_store: Arc<dyn StateStore>,
        state_ttl_seconds: u64,
        http_timeout_seconds: u64,
    ) -> OAuth2Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(http_timeout_seconds))
            .build()
            .map_err(OAuth2Error::HttpError)?;

        Ok(Self {
            http_client,
            state_store,
            state_ttl_seconds,
        })
    }

    /// Builds the provider authorization URL, storing a CSRF state record
    /// (and PKCE verifier where enabled) for the eventual callback.
    pub async fn authorization_url(
        &self,
        provider_config: &OAuth2ProviderConfig,
    ) -> OAuth2Result<(String, String)> {
        let mut url = Url::parse(&provider_config.authorization_endpoint)?;

        let pkce = provider_config.use_pkce.then(PkceChallenge::new);

        let state = AuthFlowState::new(
            provider_config.provider,
            pkce.as_ref().map(|p| p.code_verifier.clone()),
            self.state_ttl_seconds,
        );
        let state_param = state.state.clone();
        self.state_store.store(state).await?;

        let mut params = url.query_pairs_mut();
        params.append_pair("response_type", "code");
        params.append_pair("client_id", &provider_config.client_id);
        params.append_pair("redirect_uri", &provider_config.redirect_uri);
        params.append_pair("state", &state_param);

        if !provider_config.scopes.is_empty() {
            params.append_pair("scope", &provider_config.scopes.join(" "));
        }

        if let Some(pkce) = &pkce {
            params.append_pair("code_challenge", &pkce.code_challenge);
            params.append_pair("code_challenge_method", &pkce.code_challenge_method);
        }

        for (key, value) in &provider_config.auth_params {
            params.append_pair(key, value);
        }

        drop(params);

        debug!(provider = %provider_config.provider, "generated authorization URL");
        Ok((url.to_string(), state_param))
    }

    /// Verifies the callback's state, then exchanges the code for tokens.
    pub async fn handle_callback(
        &self,
        provider_config: &OAuth2ProviderConfig,
        callback: &AuthorizationCallback,
    ) -> OAuth2Result<TokenResponse> {
        if let Some(error) = &callback.error {
            let error_desc = callback
                .error_description
                .as_deref()
                .unwrap_or("No description");
            return Err(OAuth2Error::CallbackError(format!(
                "{error}: {error_desc}"
            )));
        }

        let state_param = callback.state.as_deref().ok_or(OAuth2Error::StateNotFound)?;
        let state = self.state_store.retrieve(state_param).await?;

        if state.provider != provider_config.provider {
            return Err(OAuth2Error::InvalidState);
        }

        let code = callback
            .code
            .as_deref()
            .ok_or_else(|| OAuth2Error::CallbackError("missing authorization code".to_string()))?;

        self.exchange_code(provider_config, code, state.code_verifier.as_deref())
            .await
    }

    async fn exchange_code(
        &self,
        provider_config: &OAuth2ProviderConfig,
        code: &str,
        code_verifier: Option<&str>,
    ) -> OAuth2Result<TokenResponse> {
        let mut params = HashMap::new();
        params.insert("grant_type", "authorization_code");
        params.insert("code", code);
        params.insert("client_id", &provider_config.client_id);
        params.insert("client_secret", &provider_config.client_secret);
        params.insert("redirect_uri", &provider_config.redirect_uri);

        if let Some(verifier) = code_verifier {
            params.insert("code_verifier", verifier);
        }

        let response = self
            .http_client
            .post(&provider_config.token_endpoint)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(provider = %provider_config.provider, "token exchange failed: {error_text}");
            return Err(OAuth2Error::TokenExchangeFailed(error_text));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| OAuth2Error::InvalidTokenResponse(e.to_string()))?;

        info!(provider = %provider_config.provider, "exchanged authorization code for tokens");
        Ok(token_response)
    }

    pub async fn get_user_info(
        &self,
        provider_config: &OAuth2ProviderConfig,
        access_token: &str,
    ) -> OAuth2Result<UserInfoResponse> {
        let response = self
            .http_client
            .get(&provider_config.userinfo_endpoint)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(provider = %provider_config.provider, "userinfo request failed: {error_text}");
            return Err(OAuth2Error::UserInfoFailed(error_text));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OAuth2Error::InvalidUserInfoResponse(e.to_string()))?;

        let user_info = UserInfoResponse::from_value(raw)?;
        debug!(subject = %user_info.sub, "retrieved user info");
        Ok(user_info)
    }
}
