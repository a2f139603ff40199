//! Integration tests for listing, session setup and chat commands.

use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::tempdir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_auth(home: &Path) {
    let auth = json!({
        "access": "A",
        "refresh": "R",
        "user": {"id": 1, "email": "a@x.com", "username": "ana"}
    });
    fs::write(home.join("auth.json"), auth.to_string()).unwrap();
}

fn session_json(id: &str, status: &str) -> Value {
    json!({"id": id, "persona": "p1", "persona_name": "Mrs. Lan", "status": status})
}

async fn mount_personas(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/personas/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "p1", "name": "Mrs. Lan", "difficulty_level": "medium", "personality_type": "anxious"},
            {"id": "p2", "name": "Mr. Hidden", "difficulty_level": "easy", "personality_type": "friendly", "is_active": false}
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/sessions/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            session_json("s1", "completed")
        ])))
        .mount(server)
        .await;
}

async fn mount_chat(server: &MockServer, id: &str, status: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/api/sessions/{id}/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_json(id, status)))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/api/sessions/{id}/messages/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "role": "system", "content": "You are a worried parent.", "created_at": "2025-01-01T00:00:00Z"},
            {"id": 2, "role": "assistant", "content": "Good afternoon.", "created_at": "2025-01-01T00:00:01Z"}
        ])))
        .mount(server)
        .await;
}

/// Test: protected commands refuse to run without a stored session.
#[tokio::test]
async fn test_personas_requires_login() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let home = tempdir().unwrap();
    cargo_bin_cmd!("rehearse")
        .env("REHEARSE_HOME", home.path())
        .env("REHEARSE_API_URL", format!("{}/api", server.uri()))
        .arg("personas")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
}

/// Test: only active personas are listed.
#[tokio::test]
async fn test_personas_lists_active_personas() {
    let server = MockServer::start().await;
    mount_personas(&server).await;

    let home = tempdir().unwrap();
    write_auth(home.path());
    cargo_bin_cmd!("rehearse")
        .env("REHEARSE_HOME", home.path())
        .env("REHEARSE_API_URL", format!("{}/api", server.uri()))
        .arg("personas")
        .assert()
        .success()
        .stdout(predicate::str::contains("Mrs. Lan"))
        .stdout(predicate::str::contains("Mr. Hidden").not());
}

/// Test: an expired session that cannot be renewed is reported and forgotten.
#[tokio::test]
async fn test_history_with_expired_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/sessions/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempdir().unwrap();
    write_auth(home.path());
    cargo_bin_cmd!("rehearse")
        .env("REHEARSE_HOME", home.path())
        .env("REHEARSE_API_URL", format!("{}/api", server.uri()))
        .arg("history")
        .assert()
        .failure()
        .stderr(predicate::str::contains("expired"));

    assert!(!home.path().join("auth.json").exists());
}

/// Test: a chat message gets the persona's reply printed before quitting.
#[tokio::test]
async fn test_chat_prints_reply() {
    let server = MockServer::start().await;
    mount_chat(&server, "s1", "active").await;
    Mock::given(method("POST"))
        .and(path("/api/sessions/s1/add_message/"))
        .and(body_json(json!({"role": "user", "content": "hello", "message_type": "text"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "user_message": {"id": 3, "role": "user", "content": "hello"},
            "assistant_message": {"id": 4, "role": "assistant", "content": "Is my son doing well?"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempdir().unwrap();
    write_auth(home.path());
    cargo_bin_cmd!("rehearse")
        .env("REHEARSE_HOME", home.path())
        .env("REHEARSE_API_URL", format!("{}/api", server.uri()))
        .args(["chat", "s1"])
        .write_stdin("hello\n/quit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("persona: Good afternoon."))
        .stdout(predicate::str::contains("persona: Is my son doing well?"))
        .stdout(predicate::str::contains("You are a worried parent.").not());
}

/// Test: /end asks for confirmation and finishes the session.
#[tokio::test]
async fn test_chat_end_after_confirmation() {
    let server = MockServer::start().await;
    mount_chat(&server, "s1", "active").await;
    mount_personas(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/sessions/s1/end/"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_json("s1", "completed")))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempdir().unwrap();
    write_auth(home.path());
    cargo_bin_cmd!("rehearse")
        .env("REHEARSE_HOME", home.path())
        .env("REHEARSE_API_URL", format!("{}/api", server.uri()))
        .args(["chat", "s1"])
        .write_stdin("/end\ny\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("End this session?"))
        .stdout(predicate::str::contains("Session ended."));
}

/// Test: `/end <rating>` sends the rating; an out-of-range rating is refused.
#[tokio::test]
async fn test_chat_end_with_rating() {
    let server = MockServer::start().await;
    mount_chat(&server, "s1", "active").await;
    mount_personas(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/sessions/s1/end/"))
        .and(body_json(json!({"rating": 4})))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_json("s1", "completed")))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempdir().unwrap();
    write_auth(home.path());
    cargo_bin_cmd!("rehearse")
        .env("REHEARSE_HOME", home.path())
        .env("REHEARSE_API_URL", format!("{}/api", server.uri()))
        .args(["chat", "s1"])
        .write_stdin("/end 9\n/end 4\ny\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rating must be a number from 1 to 5."))
        .stdout(predicate::str::contains("Session ended."));
}

/// Test: a completed session opens read-only.
#[tokio::test]
async fn test_completed_session_is_read_only() {
    let server = MockServer::start().await;
    mount_chat(&server, "s1", "completed").await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let home = tempdir().unwrap();
    write_auth(home.path());
    cargo_bin_cmd!("rehearse")
        .env("REHEARSE_HOME", home.path())
        .env("REHEARSE_API_URL", format!("{}/api", server.uri()))
        .args(["chat", "s1"])
        .write_stdin("hello\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("read-only"));
}

/// Test: the setup wizard creates a chat-mode session for the chosen persona.
#[tokio::test]
async fn test_new_creates_session() {
    let server = MockServer::start().await;
    mount_personas(&server).await;
    mount_chat(&server, "s9", "active").await;
    Mock::given(method("POST"))
        .and(path("/api/sessions/"))
        .and(body_json(json!({
            "persona": "p1",
            "mode": "chat",
            "custom_prompt": "Ask about homework."
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(session_json("s9", "active")))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempdir().unwrap();
    write_auth(home.path());
    cargo_bin_cmd!("rehearse")
        .env("REHEARSE_HOME", home.path())
        .env("REHEARSE_API_URL", format!("{}/api", server.uri()))
        .args([
            "new",
            "--persona",
            "p1",
            "--prompt",
            "Ask about homework.",
            "--yes",
            "--no-chat",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Persona:      Mrs. Lan"))
        .stdout(predicate::str::contains("Session s9 created."));
}

/// Test: inactive personas cannot be chosen.
#[tokio::test]
async fn test_new_rejects_inactive_persona() {
    let server = MockServer::start().await;
    mount_personas(&server).await;

    let home = tempdir().unwrap();
    write_auth(home.path());
    cargo_bin_cmd!("rehearse")
        .env("REHEARSE_HOME", home.path())
        .env("REHEARSE_API_URL", format!("{}/api", server.uri()))
        .args(["new", "--persona", "p2", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown or inactive persona 'p2'"));
}
