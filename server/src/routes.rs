//! Request handlers. Failures never escape as 5xx pages; every error arm
//! converts to a redirect or a re-rendered form per the gateway's
//! uniform-failure policy.

use axum::Form;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::SignedCookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use secrets_identity_core::{IdentityError, ProviderKind, ResolveCriteria};
use secrets_identity_oauth2::AuthorizationCallback;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::auth::AuthSession;
use crate::{AppState, SESSION_COOKIE, pages};

#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SecretForm {
    pub secret: String,
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub async fn home() -> Html<&'static str> {
    pages::home()
}

pub async fn login_form() -> Html<String> {
    pages::login(None)
}

pub async fn login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<CredentialsForm>,
) -> Response {
    match state.local.login(&form.username, &form.password).await {
        Ok(user) => {
            let token = state.sessions.establish(&user.id).await;
            info!(user_id = %user.id, "local login succeeded");
            (jar.add(session_cookie(token)), Redirect::to("/secrets")).into_response()
        }
        Err(err) => {
            // One message for wrong password, unknown user, and store
            // failure alike; only the log distinguishes them.
            match err {
                IdentityError::InvalidCredentials => info!("local login rejected"),
                other => error!(error = %other, "local login failed"),
            }
            pages::login(Some("Authentication failed")).into_response()
        }
    }
}

pub async fn register_form() -> Html<&'static str> {
    pages::register()
}

pub async fn register(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<CredentialsForm>,
) -> Response {
    match state.local.register(&form.username, &form.password).await {
        Ok(user) => {
            // Auto-login: the freshly registered user gets a session and
            // the protected page rendered directly.
            let token = state.sessions.establish(&user.id).await;
            (jar.add(session_cookie(token)), pages::secrets(&user, &[])).into_response()
        }
        Err(IdentityError::DuplicateUser(username)) => {
            info!(username, "registration rejected: username taken");
            Redirect::to("/register").into_response()
        }
        Err(err) => {
            error!(error = %err, "registration failed");
            Redirect::to("/register").into_response()
        }
    }
}

pub async fn secrets(State(state): State<AppState>, session: AuthSession) -> Response {
    match state.store.secrets_for(&session.user.id).await {
        Ok(secrets) => pages::secrets(&session.user, &secrets).into_response(),
        Err(err) => {
            error!(error = %err, "failed to load secrets");
            pages::secrets(&session.user, &[]).into_response()
        }
    }
}

pub async fn logout(State(state): State<AppState>, jar: SignedCookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.revoke(cookie.value()).await;
    }

    let mut removal = Cookie::from(SESSION_COOKIE);
    removal.set_path("/");
    let jar = jar.remove(removal);
    (jar, Redirect::to("/login")).into_response()
}

pub async fn submit_form(_session: AuthSession) -> Html<String> {
    pages::submit(None)
}

pub async fn submit(
    State(state): State<AppState>,
    session: AuthSession,
    Form(form): Form<SecretForm>,
) -> Response {
    info!(user_id = %session.user.id, "secret submitted");

    if let Err(err) = state.store.add_secret(&session.user.id, form.secret).await {
        error!(error = %err, "failed to store secret");
        return pages::submit(Some("Could not save your secret, please try again"))
            .into_response();
    }

    Redirect::to("/secrets").into_response()
}

pub async fn auth_initiate(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Redirect {
    let kind: ProviderKind = match provider.parse() {
        Ok(kind) => kind,
        Err(_) => {
            warn!(provider, "initiation for unknown provider");
            return Redirect::to("/login");
        }
    };

    match state.providers.initiate(kind).await {
        Ok(url) => Redirect::to(&url),
        Err(err) => {
            warn!(provider = %kind, error = %err, "provider initiation failed");
            Redirect::to("/login")
        }
    }
}

pub async fn auth_callback(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Path(provider): Path<String>,
    Query(callback): Query<AuthorizationCallback>,
) -> Response {
    let kind: ProviderKind = match provider.parse() {
        Ok(kind) => kind,
        Err(_) => {
            warn!(provider, "callback for unknown provider");
            return Redirect::to("/login").into_response();
        }
    };

    let profile = match state.providers.handle_callback(kind, &callback).await {
        Ok(profile) => profile,
        Err(err) => {
            warn!(provider = %kind, error = %err, "provider callback failed");
            return Redirect::to("/login").into_response();
        }
    };

    match state
        .resolver
        .resolve_or_create(ResolveCriteria::Provider(profile))
        .await
    {
        Ok(user) => {
            let token = state.sessions.establish(&user.id).await;
            info!(user_id = %user.id, provider = %kind, "provider login succeeded");
            (jar.add(session_cookie(token)), Redirect::to("/secrets")).into_response()
        }
        Err(err) => {
            error!(provider = %kind, error = %err, "identity resolution failed");
            Redirect::to("/login").into_response()
        }
    }
}
