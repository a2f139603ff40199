//! Integration tests for login, registration and logout against a mock backend.

use rehearse_core::{ApiError, ApiGateway, AuthStore, BackendApi};
use rehearse_types::RegisterRequest;
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api(server: &MockServer, store: AuthStore) -> BackendApi {
    BackendApi::new(ApiGateway::new(format!("{}/api/", server.uri()), store))
}

/// Test: a successful login establishes the full session.
#[tokio::test]
async fn test_login_establishes_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .and(body_json(json!({"email": "a@x.com", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access": "A",
            "refresh": "R",
            "user": {"id": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = AuthStore::in_memory();
    let profile = api(&server, store.clone()).login("a@x.com", "pw").await.unwrap();

    assert_eq!(profile.id, "1");
    assert_eq!(store.access().as_deref(), Some("A"));
    assert_eq!(store.refresh().as_deref(), Some("R"));
    assert!(store.is_authenticated());
    assert_eq!(store.profile().map(|p| p.id), Some("1".to_string()));
}

/// Test: bad credentials are a validation error and never trigger renewal.
#[tokio::test]
async fn test_login_rejected_is_validation_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "No active account found with the given credentials"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "x"})))
        .expect(0)
        .mount(&server)
        .await;

    let store = AuthStore::in_memory();
    let err = api(&server, store.clone())
        .login("a@x.com", "wrong")
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert!(!err.is_auth());
    assert_eq!(
        err.display_message(),
        "No active account found with the given credentials"
    );
    assert!(!store.is_authenticated());
}

/// Test: registration accepts the nested token response.
#[tokio::test]
async fn test_register_accepts_nested_tokens() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/register/"))
        .and(body_json(json!({
            "email": "b@x.com",
            "username": "bee",
            "password": "secret123",
            "password_confirm": "secret123"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "User registered successfully",
            "user": {"id": 2, "email": "b@x.com", "username": "bee"},
            "tokens": {"access": "A2", "refresh": "R2"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = AuthStore::in_memory();
    let request = RegisterRequest {
        email: "b@x.com".into(),
        username: "bee".into(),
        password: "secret123".into(),
        password_confirm: "secret123".into(),
    };
    let profile = api(&server, store.clone()).register(&request).await.unwrap();

    assert_eq!(profile.display_name(), "bee");
    assert_eq!(store.access().as_deref(), Some("A2"));
    assert_eq!(store.refresh().as_deref(), Some("R2"));
}

/// Test: logout clears local credentials even when the server call fails.
#[tokio::test]
async fn test_logout_clears_even_when_server_fails() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout/"))
        .and(header("authorization", "Bearer A"))
        .and(body_json(json!({"refresh": "R"})))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let auth_path = dir.path().join("auth.json");
    let store = AuthStore::file(&auth_path);
    store
        .establish("A", "R", serde_json::from_value(json!({"id": 1})).unwrap())
        .unwrap();
    assert!(auth_path.exists());

    api(&server, store.clone()).logout().await;

    assert!(!store.is_authenticated());
    assert!(!auth_path.exists());
}

/// Test: list endpoints accept the paginated envelope.
#[tokio::test]
async fn test_list_personas_accepts_paginated_shape() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/personas/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "next": null,
            "previous": null,
            "results": [
                {"id": 1, "name": "Mrs. Lan", "difficulty_level": "easy", "personality_type": "friendly"},
                {"id": 2, "name": "Mr. Binh", "difficulty_level": "expert", "personality_type": "demanding", "is_active": false}
            ]
        })))
        .mount(&server)
        .await;

    let store = AuthStore::in_memory();
    store
        .establish("A", "R", serde_json::from_value(json!({"id": 1})).unwrap())
        .unwrap();
    let personas = api(&server, store).list_personas().await.unwrap();

    assert_eq!(personas.len(), 2);
    assert_eq!(personas[0].id, "1");
    assert!(!personas[1].is_active);
}

/// Test: a shape mismatch on success is reported as a network error.
#[tokio::test]
async fn test_unexpected_shape_is_network_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/sessions/s1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
        .mount(&server)
        .await;

    let err = api(&server, AuthStore::in_memory())
        .get_session("s1")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
}
