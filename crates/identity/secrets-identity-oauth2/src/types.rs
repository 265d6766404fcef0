//! Wire types for the Authorization Code flow.

use crate::error::{OAuth2Error, OAuth2Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Query parameters a provider sends back to the callback route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Token endpoint response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: Option<u64>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub id_token: Option<String>,
}

/// Userinfo response, tolerant of the field-name differences between the
/// supported providers:
/// - OpenID Connect endpoints return `sub`;
/// - Google's v1 endpoint and Facebook's Graph API return `id`;
/// - Twitter's v2 `/users/me` nests the payload under a `data` object,
///   which [`UserInfoResponse::from_value`] unwraps first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfoResponse {
    #[serde(alias = "id")]
    pub sub: String,
    pub email: Option<String>,
    pub email_verified: Option<bool>,
    pub name: Option<String>,
    pub picture: Option<String>,
    #[serde(flatten)]
    pub additional_claims: HashMap<String, serde_json::Value>,
}

impl UserInfoResponse {
    pub fn from_value(value: serde_json::Value) -> OAuth2Result<Self> {
        let payload = match value {
            serde_json::Value::Object(mut map) => match map.remove("data") {
                Some(inner @ serde_json::Value::Object(_)) => inner,
                Some(other) => {
                    map.insert("data".to_string(), other);
                    serde_json::Value::Object(map)
                }
                None => serde_json::Value::Object(map),
            },
            other => other,
        };

        serde_json::from_value(payload)
            .map_err(|e| OAuth2Error::InvalidUserInfoResponse(e.to_string()))
    }
}
