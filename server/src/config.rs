//! Environment-driven configuration.
//!
//! The session secret is the single fatal requirement; a provider whose
//! credentials are absent is disabled with a warning so the rest of the
//! gateway still serves.

use anyhow::{Context, Result, bail};
use secrets_identity_core::ProviderKind;
use secrets_identity_oauth2::{OAuth2ProviderConfig, ProviderRegistry};
use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct ProviderCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct GenericProviderSettings {
    pub credentials: ProviderCredentials,
    pub authorization_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub server_host: String,
    pub server_port: u16,
    /// Base URL the providers redirect back to, without a trailing slash.
    pub public_base_url: String,
    pub google: Option<ProviderCredentials>,
    pub facebook: Option<ProviderCredentials>,
    pub twitter: Option<ProviderCredentials>,
    pub oauth2: Option<GenericProviderSettings>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let session_secret = env::var("SESSION_SECRET")
            .context("SESSION_SECRET environment variable is required")?;
        if session_secret.len() < 32 {
            bail!("SESSION_SECRET must be at least 32 bytes");
        }

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("SERVER_PORT must be a valid port number")?;

        Ok(Self {
            session_secret,
            session_ttl_hours: env::var("SESSION_TTL_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .context("SESSION_TTL_HOURS must be a number of hours")?,
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{server_port}"))
                .trim_end_matches('/')
                .to_string(),
            google: credential_pair("GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET"),
            facebook: credential_pair("FACEBOOK_CLIENT_ID", "FACEBOOK_CLIENT_SECRET"),
            twitter: credential_pair("TWITTER_CLIENT_ID", "TWITTER_CLIENT_SECRET"),
            oauth2: generic_settings(),
            server_host,
            server_port,
        })
    }

    pub fn callback_url(&self, kind: ProviderKind) -> String {
        format!("{}/auth/{kind}/secrets", self.public_base_url)
    }

    /// Builds the static provider table from whichever providers are
    /// fully configured.
    pub fn build_registry(&self) -> Result<ProviderRegistry> {
        let mut registry = ProviderRegistry::new()?;

        match &self.google {
            Some(creds) => registry.register(OAuth2ProviderConfig::google(
                creds.client_id.clone(),
                creds.client_secret.clone(),
                self.callback_url(ProviderKind::Google),
            )),
            None => warn!("google provider disabled: credentials not configured"),
        }

        match &self.facebook {
            Some(creds) => registry.register(OAuth2ProviderConfig::facebook(
                creds.client_id.clone(),
                creds.client_secret.clone(),
                self.callback_url(ProviderKind::Facebook),
            )),
            None => warn!("facebook provider disabled: credentials not configured"),
        }

        match &self.twitter {
            Some(creds) => registry.register(OAuth2ProviderConfig::twitter(
                creds.client_id.clone(),
                creds.client_secret.clone(),
                self.callback_url(ProviderKind::Twitter),
            )),
            None => warn!("twitter provider disabled: credentials not configured"),
        }

        match &self.oauth2 {
            Some(settings) => registry.register(OAuth2ProviderConfig::generic(
                settings.credentials.client_id.clone(),
                settings.credentials.client_secret.clone(),
                settings.authorization_url.clone(),
                settings.token_url.clone(),
                settings.userinfo_url.clone(),
                self.callback_url(ProviderKind::OAuth2),
            )),
            None => warn!("generic oauth2 provider disabled: not configured"),
        }

        Ok(registry)
    }
}

fn credential_pair(id_var: &str, secret_var: &str) -> Option<ProviderCredentials> {
    match (env::var(id_var), env::var(secret_var)) {
        (Ok(client_id), Ok(client_secret)) => Some(ProviderCredentials {
            client_id,
            client_secret,
        }),
        _ => None,
    }
}

fn generic_settings() -> Option<GenericProviderSettings> {
    let credentials = credential_pair("OAUTH2_CLIENT_ID", "OAUTH2_CLIENT_SECRET")?;
    Some(GenericProviderSettings {
        credentials,
        authorization_url: env::var("OAUTH2_AUTH_URL").ok()?,
        token_url: env::var("OAUTH2_TOKEN_URL").ok()?,
        userinfo_url: env::var("OAUTH2_USERINFO_URL").ok()?,
    })
}
