//! Core identity types and the user-store trait shared by every
//! authentication path in the gateway.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Username already taken: {0}")]
    DuplicateUser(String),

    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Identity store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type IdentityResult<T> = Result<T, IdentityError>;

/// The external identity providers the gateway accepts, plus the local
/// username/password path's counterpart field on [`User`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Google,
    Facebook,
    Twitter,
    /// The generic OAuth2 endpoint pair configured at startup.
    OAuth2,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::Google,
        ProviderKind::Facebook,
        ProviderKind::Twitter,
        ProviderKind::OAuth2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Google => "google",
            ProviderKind::Facebook => "facebook",
            ProviderKind::Twitter => "twitter",
            ProviderKind::OAuth2 => "oauth2",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(ProviderKind::Google),
            "facebook" => Ok(ProviderKind::Facebook),
            "twitter" => Ok(ProviderKind::Twitter),
            "oauth2" => Ok(ProviderKind::OAuth2),
            other => Err(IdentityError::ProviderNotFound(other.to_string())),
        }
    }
}

/// Provider-agnostic profile produced by a provider adapter after a
/// successful handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedProfile {
    pub provider: ProviderKind,
    pub external_id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

/// The sole persisted entity. A record is addressable by its local
/// username or by any single non-null provider identifier; the store
/// enforces uniqueness of each of those fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Assigned by the store on creation.
    pub id: String,
    pub username: Option<String>,
    /// PHC-format string carrying the salt and hash parameters.
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub facebook_id: Option<String>,
    pub twitter_id: Option<String>,
    pub oauth2_id: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// A local account holding only a username and password hash.
    pub fn new_local(username: String, password_hash: String) -> Self {
        Self {
            id: String::new(),
            username: Some(username),
            password_hash: Some(password_hash),
            google_id: None,
            facebook_id: None,
            twitter_id: None,
            oauth2_id: None,
            display_name: None,
            email: None,
            created_at: Utc::now(),
        }
    }

    /// An account created from a provider profile; only the fields the
    /// profile supplies are populated.
    pub fn from_profile(profile: &NormalizedProfile) -> Self {
        let mut user = Self {
            id: String::new(),
            username: None,
            password_hash: None,
            google_id: None,
            facebook_id: None,
            twitter_id: None,
            oauth2_id: None,
            display_name: profile.display_name.clone(),
            email: profile.email.clone(),
            created_at: Utc::now(),
        };
        user.set_provider_id(profile.provider, profile.external_id.clone());
        user
    }

    pub fn provider_id(&self, kind: ProviderKind) -> Option<&str> {
        match kind {
            ProviderKind::Google => self.google_id.as_deref(),
            ProviderKind::Facebook => self.facebook_id.as_deref(),
            ProviderKind::Twitter => self.twitter_id.as_deref(),
            ProviderKind::OAuth2 => self.oauth2_id.as_deref(),
        }
    }

    pub fn set_provider_id(&mut self, kind: ProviderKind, external_id: String) {
        let slot = match kind {
            ProviderKind::Google => &mut self.google_id,
            ProviderKind::Facebook => &mut self.facebook_id,
            ProviderKind::Twitter => &mut self.twitter_id,
            ProviderKind::OAuth2 => &mut self.oauth2_id,
        };
        *slot = Some(external_id);
    }
}

/// Partial identity description handed to the resolution policy by one of
/// the authentication paths.
#[derive(Debug, Clone)]
pub enum ResolveCriteria {
    /// A locally verified username. Verification has already happened;
    /// resolution only locates the record.
    Local { username: String },
    /// A profile returned by a provider adapter.
    Provider(NormalizedProfile),
}

/// A piece of free text submitted by an authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedSecret {
    pub user_id: String,
    pub text: String,
    pub submitted_at: DateTime<Utc>,
}

/// Persistence seam for [`User`] records.
///
/// Implementations must enforce the uniqueness invariants and must make
/// `find_or_create_by_provider` atomic with respect to the queried
/// identifier: two concurrent calls with the same new external id yield
/// exactly one record.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> IdentityResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> IdentityResult<Option<User>>;

    async fn find_by_provider_id(
        &self,
        kind: ProviderKind,
        external_id: &str,
    ) -> IdentityResult<Option<User>>;

    /// Assigns the record's id and inserts it. Rejects any record whose
    /// username or provider identifiers collide with an existing one.
    async fn create(&self, user: User) -> IdentityResult<User>;

    /// Serialized check-then-create keyed on the profile's provider
    /// identifier field.
    async fn find_or_create_by_provider(
        &self,
        profile: &NormalizedProfile,
    ) -> IdentityResult<User>;

    async fn add_secret(&self, user_id: &str, text: String) -> IdentityResult<()>;

    async fn secrets_for(&self, user_id: &str) -> IdentityResult<Vec<SubmittedSecret>>;
}
