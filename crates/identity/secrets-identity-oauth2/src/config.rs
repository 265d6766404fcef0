//! Static per-provider configuration for the Authorization Code flow.

use secrets_identity_core::ProviderKind;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct OAuth2ProviderConfig {
    pub provider: ProviderKind,
    pub client_id: String,
    pub client_secret: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    /// Provider-specific extra query parameters for the authorization URL.
    pub auth_params: HashMap<String, String>,
    pub use_pkce: bool,
}

impl OAuth2ProviderConfig {
    pub fn google(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            provider: ProviderKind::Google,
            client_id,
            client_secret,
            authorization_endpoint: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_endpoint: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_endpoint: "https://www.googleapis.com/oauth2/v3/userinfo".to_string(),
            redirect_uri,
            scopes: vec!["openid".to_string(), "email".to_string()],
            auth_params: HashMap::new(),
            use_pkce: true,
        }
    }

    pub fn facebook(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            provider: ProviderKind::Facebook,
            client_id,
            client_secret,
            authorization_endpoint: "https://www.facebook.com/v19.0/dialog/oauth".to_string(),
            token_endpoint: "https://graph.facebook.com/v19.0/oauth/access_token".to_string(),
            userinfo_endpoint: "https://graph.facebook.com/me?fields=id,name,email".to_string(),
            redirect_uri,
            scopes: vec!["email".to_string(), "public_profile".to_string()],
            auth_params: HashMap::new(),
            use_pkce: false,
        }
    }

    pub fn twitter(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            provider: ProviderKind::Twitter,
            client_id,
            client_secret,
            authorization_endpoint: "https://twitter.com/i/oauth2/authorize".to_string(),
            token_endpoint: "https://api.twitter.com/2/oauth2/token".to_string(),
            userinfo_endpoint: "https://api.twitter.com/2/users/me".to_string(),
            redirect_uri,
            scopes: vec!["users.read".to_string(), "tweet.read".to_string()],
            auth_params: HashMap::new(),
            // Twitter requires PKCE for the v2 authorization code flow.
            use_pkce: true,
        }
    }

    /// The generic endpoint pair configured entirely from the environment.
    pub fn generic(
        client_id: String,
        client_secret: String,
        authorization_endpoint: String,
        token_endpoint: String,
        userinfo_endpoint: String,
        redirect_uri: String,
    ) -> Self {
        Self {
            provider: ProviderKind::OAuth2,
            client_id,
            client_secret,
            authorization_endpoint,
            token_endpoint,
            userinfo_endpoint,
            redirect_uri,
            scopes: vec!["openid".to_string(), "email".to_string()],
            auth_params: HashMap::new(),
            use_pkce: true,
        }
    }
}
