use thiserror::Error;

#[derive(Debug, Error)]
pub enum OAuth2Error {
    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Authorization state not found or expired")]
    StateNotFound,

    #[error("State does not belong to this provider")]
    InvalidState,

    #[error("Callback error: {0}")]
    CallbackError(String),

    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(String),

    #[error("User info request failed: {0}")]
    UserInfoFailed(String),

    #[error("Invalid user info response: {0}")]
    InvalidUserInfoResponse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type OAuth2Result<T> = Result<T, OAuth2Error>;
