//! End-to-end tests for the HTTP surface: local registration/login,
//! the session gate, logout, submissions, and the provider flow against
//! a mocked OAuth2 endpoint pair.

use axum_extra::extract::cookie::Key;
use axum_test::{TestServer, TestServerConfig};
use secrets_gateway_server::{AppState, build_router};
use secrets_identity_core::{
    IdentityError, IdentityResult, NormalizedProfile, ProviderKind, SubmittedSecret, User,
    UserStore,
};
use secrets_identity_oauth2::{OAuth2ProviderConfig, ProviderRegistry};
use secrets_identity_session::SessionManager;
use secrets_identity_store::InMemoryUserStore;
use serde_json::json;
use std::sync::Arc;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn make_server(registry: ProviderRegistry) -> (TestServer, Arc<InMemoryUserStore>) {
    let store = Arc::new(InMemoryUserStore::new());
    let state = AppState::new(
        store.clone(),
        SessionManager::default(),
        registry,
        Key::generate(),
    );

    let config = TestServerConfig {
        save_cookies: true,
        ..Default::default()
    };
    let server = TestServer::new_with_config(build_router(state), config).unwrap();
    (server, store)
}

fn test_server() -> (TestServer, Arc<InMemoryUserStore>) {
    make_server(ProviderRegistry::new().unwrap())
}

fn credentials(username: &str, password: &str) -> serde_json::Value {
    json!({ "username": username, "password": password })
}

#[tokio::test]
async fn register_then_login_round_trip() {
    let (server, _store) = test_server();

    // Registration renders the protected page directly.
    let response = server
        .post("/register")
        .form(&credentials("alice", "pw123"))
        .await;
    response.assert_status_ok();
    response.assert_text_contains("Secrets");

    let response = server.get("/logout").await;
    assert_eq!(response.header("location"), "/login");

    // The same credentials immediately log back in.
    let response = server
        .post("/login")
        .form(&credentials("alice", "pw123"))
        .await;
    assert_eq!(response.header("location"), "/secrets");

    server.get("/secrets").await.assert_status_ok();
}

#[tokio::test]
async fn duplicate_registration_is_rejected_and_original_survives() {
    let (server, _store) = test_server();

    server
        .post("/register")
        .form(&credentials("alice", "pw123"))
        .await
        .assert_status_ok();
    server.get("/logout").await;

    // Second registration bounces back to the form.
    let response = server
        .post("/register")
        .form(&credentials("alice", "hijacked"))
        .await;
    assert_eq!(response.header("location"), "/register");

    // The original password still works; the attempted one does not.
    let response = server
        .post("/login")
        .form(&credentials("alice", "hijacked"))
        .await;
    response.assert_status_ok();
    response.assert_text_contains("Authentication failed");

    let response = server
        .post("/login")
        .form(&credentials("alice", "pw123"))
        .await;
    assert_eq!(response.header("location"), "/secrets");
}

#[tokio::test]
async fn protected_routes_redirect_without_a_session() {
    let (server, _store) = test_server();

    for route in ["/secrets", "/submit"] {
        let response = server.get(route).await;
        assert_eq!(response.header("location"), "/login");
    }

    let response = server.post("/submit").form(&json!({ "secret": "x" })).await;
    assert_eq!(response.header("location"), "/login");
}

#[tokio::test]
async fn wrong_password_leaves_no_session() {
    let (server, _store) = test_server();

    server
        .post("/register")
        .form(&credentials("alice", "pw123"))
        .await
        .assert_status_ok();
    server.get("/logout").await;

    let response = server
        .post("/login")
        .form(&credentials("alice", "wrongpw"))
        .await;
    response.assert_status_ok();
    response.assert_text_contains("Authentication failed");

    // Still gated.
    let response = server.get("/secrets").await;
    assert_eq!(response.header("location"), "/login");

    // Correct password establishes a working session.
    let response = server
        .post("/login")
        .form(&credentials("alice", "pw123"))
        .await;
    assert_eq!(response.header("location"), "/secrets");
    server.get("/secrets").await.assert_status_ok();
}

#[tokio::test]
async fn unknown_user_and_wrong_password_render_the_same_page() {
    let (server, _store) = test_server();
    server
        .post("/register")
        .form(&credentials("alice", "pw123"))
        .await
        .assert_status_ok();
    server.get("/logout").await;

    let unknown = server
        .post("/login")
        .form(&credentials("nobody", "pw123"))
        .await
        .text();
    let wrong = server
        .post("/login")
        .form(&credentials("alice", "badpw"))
        .await
        .text();

    assert_eq!(unknown, wrong);
}

#[tokio::test]
async fn submitted_secrets_show_up_on_the_protected_page() {
    let (server, _store) = test_server();

    server
        .post("/register")
        .form(&credentials("bob", "hunter2"))
        .await
        .assert_status_ok();

    server.get("/submit").await.assert_status_ok();

    let response = server
        .post("/submit")
        .form(&json!({ "secret": "i write rust at work" }))
        .await;
    assert_eq!(response.header("location"), "/secrets");

    let response = server.get("/secrets").await;
    response.assert_status_ok();
    response.assert_text_contains("i write rust at work");
}

/// Delegates everything to an in-memory store except secret writes,
/// which always fail.
struct RejectingSecretsStore(InMemoryUserStore);

#[async_trait::async_trait]
impl UserStore for RejectingSecretsStore {
    async fn find_by_id(&self, id: &str) -> IdentityResult<Option<User>> {
        self.0.find_by_id(id).await
    }

    async fn find_by_username(&self, username: &str) -> IdentityResult<Option<User>> {
        self.0.find_by_username(username).await
    }

    async fn find_by_provider_id(
        &self,
        kind: ProviderKind,
        external_id: &str,
    ) -> IdentityResult<Option<User>> {
        self.0.find_by_provider_id(kind, external_id).await
    }

    async fn create(&self, user: User) -> IdentityResult<User> {
        self.0.create(user).await
    }

    async fn find_or_create_by_provider(
        &self,
        profile: &NormalizedProfile,
    ) -> IdentityResult<User> {
        self.0.find_or_create_by_provider(profile).await
    }

    async fn add_secret(&self, _user_id: &str, _text: String) -> IdentityResult<()> {
        Err(IdentityError::StoreUnavailable(
            "secrets collection offline".to_string(),
        ))
    }

    async fn secrets_for(&self, user_id: &str) -> IdentityResult<Vec<SubmittedSecret>> {
        self.0.secrets_for(user_id).await
    }
}

#[tokio::test]
async fn failed_secret_write_rerenders_the_form_with_a_notice() {
    let store = Arc::new(RejectingSecretsStore(InMemoryUserStore::new()));
    let state = AppState::new(
        store,
        SessionManager::default(),
        ProviderRegistry::new().unwrap(),
        Key::generate(),
    );
    let config = TestServerConfig {
        save_cookies: true,
        ..Default::default()
    };
    let server = TestServer::new_with_config(build_router(state), config).unwrap();

    server
        .post("/register")
        .form(&credentials("erin", "pw"))
        .await
        .assert_status_ok();

    // The user is told instead of being bounced to a page where the
    // submission silently never appears.
    let response = server
        .post("/submit")
        .form(&json!({ "secret": "lost to the void" }))
        .await;
    response.assert_status_ok();
    response.assert_text_contains("Could not save your secret");
    response.assert_text_contains(r#"form action="/submit""#);
}

#[tokio::test]
async fn logout_is_idempotent_and_kills_the_session() {
    let (server, _store) = test_server();

    server
        .post("/register")
        .form(&credentials("carol", "pw"))
        .await
        .assert_status_ok();

    let response = server.get("/logout").await;
    assert_eq!(response.header("location"), "/login");

    // Logging out again without a session behaves the same.
    let response = server.get("/logout").await;
    assert_eq!(response.header("location"), "/login");

    let response = server.get("/secrets").await;
    assert_eq!(response.header("location"), "/login");
}

#[tokio::test]
async fn unknown_or_disabled_providers_redirect_to_login() {
    let (server, _store) = test_server();

    // Not a provider at all.
    let response = server.get("/auth/github").await;
    assert_eq!(response.header("location"), "/login");

    // A real provider kind, but no credentials configured.
    let response = server.get("/auth/google").await;
    assert_eq!(response.header("location"), "/login");

    let response = server.get("/auth/google/secrets").await;
    assert_eq!(response.header("location"), "/login");
}

async fn mock_provider() -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
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
            "name": "External User",
            "email": "ext@example.com"
        })))
        .mount(&mock_server)
        .await;

    mock_server
}

fn registry_for(mock_uri: &str) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new().unwrap();
    registry.register(OAuth2ProviderConfig::generic(
        "client-id".to_string(),
        "client-secret".to_string(),
        format!("{mock_uri}/authorize"),
        format!("{mock_uri}/token"),
        format!("{mock_uri}/userinfo"),
        "http://localhost:3000/auth/oauth2/secrets".to_string(),
    ));
    registry
}

/// Drives `/auth/oauth2` and returns the state parameter the gateway
/// embedded in the provider redirect.
async fn initiate_and_extract_state(server: &TestServer) -> String {
    let response = server.get("/auth/oauth2").await;
    let location = response.header("location");
    let url = Url::parse(location.to_str().unwrap()).unwrap();
    url.query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.to_string())
        .unwrap()
}

#[tokio::test]
async fn provider_callback_creates_one_user_and_a_session() {
    let mock = mock_provider().await;
    let (server, store) = make_server(registry_for(&mock.uri()));

    let state = initiate_and_extract_state(&server).await;

    let response = server
        .get(&format!("/auth/oauth2/secrets?code=the-code&state={state}"))
        .await;
    assert_eq!(response.header("location"), "/secrets");

    server.get("/secrets").await.assert_status_ok();

    // Exactly one record, holding only the generic provider identifier.
    assert_eq!(store.user_count().await, 1);
    let user = store
        .find_by_provider_id(ProviderKind::OAuth2, "g-42")
        .await
        .unwrap()
        .unwrap();
    assert!(user.username.is_none());
    assert!(user.google_id.is_none());

    // A second full handshake with the same external id reuses the record.
    let state = initiate_and_extract_state(&server).await;
    let response = server
        .get(&format!("/auth/oauth2/secrets?code=the-code&state={state}"))
        .await;
    assert_eq!(response.header("location"), "/secrets");
    assert_eq!(store.user_count().await, 1);
}

#[tokio::test]
async fn denied_callback_establishes_nothing() {
    let mock = mock_provider().await;
    let (server, store) = make_server(registry_for(&mock.uri()));

    let state = initiate_and_extract_state(&server).await;

    let response = server
        .get(&format!(
            "/auth/oauth2/secrets?error=access_denied&state={state}"
        ))
        .await;
    assert_eq!(response.header("location"), "/login");

    assert_eq!(store.user_count().await, 0);
    let response = server.get("/secrets").await;
    assert_eq!(response.header("location"), "/login");
}

#[tokio::test]
async fn callback_with_forged_state_is_rejected() {
    let mock = mock_provider().await;
    let (server, store) = make_server(registry_for(&mock.uri()));

    let response = server
        .get("/auth/oauth2/secrets?code=the-code&state=forged")
        .await;
    assert_eq!(response.header("location"), "/login");
    assert_eq!(store.user_count().await, 0);
}
