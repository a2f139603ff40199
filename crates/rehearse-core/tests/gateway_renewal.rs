//! Integration tests for the 401 renewal-and-retry protocol.

use std::time::Duration;

use rehearse_core::{ApiError, ApiGateway, AuthStore, BackendApi};
use rehearse_types::UserProfile;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn logged_in_store() -> AuthStore {
    let store = AuthStore::in_memory();
    store
        .establish(
            "old-access",
            "R",
            UserProfile {
                id: "1".into(),
                email: "a@x.com".into(),
                ..Default::default()
            },
        )
        .unwrap();
    store
}

fn gateway(server: &MockServer, store: AuthStore) -> ApiGateway {
    ApiGateway::new(format!("{}/api", server.uri()), store)
}

async fn mount_expired(server: &MockServer, times: u64) {
    Mock::given(method("GET"))
        .and(path("/api/sessions/"))
        .and(header("authorization", "Bearer old-access"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "expired"})))
        .expect(times)
        .mount(server)
        .await;
}

/// Test: a 401 triggers exactly one renewal and exactly one retry.
#[tokio::test]
async fn test_401_renews_once_and_retries_once() {
    let server = MockServer::start().await;
    mount_expired(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh/"))
        .and(body_json(json!({"refresh": "R"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "new-access"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/sessions/"))
        .and(header("authorization", "Bearer new-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let store = logged_in_store();
    let value = gateway(&server, store.clone()).get("/sessions/").await.unwrap();

    assert_eq!(value, json!([]));
    assert_eq!(store.access().as_deref(), Some("new-access"));
    assert_eq!(store.refresh().as_deref(), Some("R"));
    assert!(store.profile().is_some());
}

/// Test: a failed renewal clears the session and is not retried.
#[tokio::test]
async fn test_renewal_failure_clears_session_without_retry() {
    let server = MockServer::start().await;
    mount_expired(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Token is invalid"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = logged_in_store();
    let err = gateway(&server, store.clone())
        .get("sessions/")
        .await
        .unwrap_err();

    assert_eq!(err, ApiError::Auth);
    assert!(!store.is_authenticated());
    assert!(store.refresh().is_none());
    assert!(store.profile().is_none());
}

/// Test: without a refresh credential the 401 is final.
#[tokio::test]
async fn test_no_refresh_credential_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/sessions/"))
        .respond_with(ResponseTemplate::new(401))
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

    let err = gateway(&server, store.clone())
        .get("sessions/")
        .await
        .unwrap_err();
    assert!(err.is_auth());
    assert!(!store.is_authenticated());
}

/// Test: a 401 on the retried request is final; no second renewal.
#[tokio::test]
async fn test_retry_rejected_is_final() {
    let server = MockServer::start().await;
    mount_expired(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "new-access"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/sessions/"))
        .and(header("authorization", "Bearer new-access"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let store = logged_in_store();
    let err = gateway(&server, store.clone())
        .get("sessions/")
        .await
        .unwrap_err();

    assert_eq!(err, ApiError::Auth);
    assert!(!store.is_authenticated());
}

/// Test: concurrent 401s share a single renewal call.
#[tokio::test]
async fn test_concurrent_401s_coalesce_renewal() {
    let server = MockServer::start().await;
    mount_expired(&server, 2).await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access": "new-access", "refresh": "R2"}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/sessions/"))
        .and(header("authorization", "Bearer new-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let store = logged_in_store();
    let gateway = gateway(&server, store.clone());
    let (first, second) = tokio::join!(gateway.get("sessions/"), gateway.get("sessions/"));

    assert_eq!(first.unwrap(), json!([]));
    assert_eq!(second.unwrap(), json!([]));
    assert_eq!(store.refresh().as_deref(), Some("R2"));
}

/// Test: other error statuses carry status and body verbatim.
#[tokio::test]
async fn test_validation_error_carries_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/sessions/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"persona": ["This field is required."]})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/personas/"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let gateway = gateway(&server, logged_in_store());

    let err = gateway.post("sessions/", &json!({})).await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Validation {
            status: 400,
            body: json!({"persona": ["This field is required."]}),
        }
    );

    let err = gateway.get("personas/").await.unwrap_err();
    assert_eq!(err.status(), Some(502));
    assert_eq!(err.body(), Some(&json!("Bad Gateway")));
}

/// Test: an empty success body decodes as null; a non-JSON one is malformed.
#[tokio::test]
async fn test_success_body_decoding() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/sessions/s1/end/"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/sessions/s1/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let gateway = gateway(&server, logged_in_store());
    assert_eq!(
        gateway.post("sessions/s1/end/", &json!({})).await.unwrap(),
        serde_json::Value::Null
    );
    assert!(matches!(
        gateway.get("sessions/s1/").await,
        Err(ApiError::Network(_))
    ));
}

/// Test: transport failures surface as network errors.
#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let gateway = ApiGateway::new("http://127.0.0.1:9/api", logged_in_store());
    let err = gateway.get("sessions/").await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
    assert_eq!(err.status(), None);
}

/// Test: a renewal that completes after logout does not bring the session
/// back.
#[tokio::test]
async fn test_renewal_overlapping_logout_is_discarded() {
    let server = MockServer::start().await;
    mount_expired(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access": "new-access"}))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/sessions/"))
        .and(header("authorization", "Bearer new-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let store = logged_in_store();
    let api = BackendApi::new(gateway(&server, store.clone()));
    let logout = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        api.logout().await;
    };
    let (result, ()) = tokio::join!(api.gateway().get("sessions/"), logout);

    assert_eq!(result.unwrap_err(), ApiError::Auth);
    assert!(!store.is_authenticated());
    assert!(store.access().is_none());
    assert!(store.refresh().is_none());
    assert!(store.profile().is_none());
}
