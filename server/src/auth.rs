//! Route authorization gate.
//!
//! Protected handlers take an [`AuthSession`] argument; a request without
//! a valid session is redirected to `/login` before the handler runs.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::Redirect;
use axum_extra::extract::SignedCookieJar;
use axum_extra::extract::cookie::Key;
use secrets_identity_core::User;

use crate::{AppState, SESSION_COOKIE};

pub struct AuthSession {
    pub user: User,
    pub token: String,
}

impl FromRequestParts<AppState> for AuthSession {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // `AppState` itself also satisfies `FromRef<AppState>`, so the
        // jar's key type must be pinned down explicitly.
        let jar = SignedCookieJar::<Key>::from_request_parts(parts, state)
            .await
            .map_err(|_| Redirect::to("/login"))?;

        let token = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .ok_or_else(|| Redirect::to("/login"))?;

        let user_id = state
            .sessions
            .resolve(&token)
            .await
            .ok_or_else(|| Redirect::to("/login"))?;

        // A session outliving its user record is treated as no session.
        let user = state
            .store
            .find_by_id(&user_id)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| Redirect::to("/login"))?;

        Ok(AuthSession { user, token })
    }
}
