//! Typed backend endpoints on top of the gateway.

use std::sync::Arc;

use rehearse_types::{
    AddMessageReply, AddMessageRequest, AuthResponse, CreateSessionRequest, EndSessionRequest, Listing,
    LoginRequest, Message, Persona, RegisterRequest, Session, UserProfile,
};
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::auth::AuthStore;
use crate::gateway::{ApiError, ApiGateway, ApiResult};

/// Backend client used by the workflow runtime and the CLI.
#[derive(Clone)]
pub struct BackendApi {
    gateway: Arc<ApiGateway>,
}

impl BackendApi {
    pub fn new(gateway: ApiGateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
        }
    }

    pub fn gateway(&self) -> &ApiGateway {
        &self.gateway
    }

    pub fn store(&self) -> &AuthStore {
        self.gateway.store()
    }

    /// Logs in and establishes the auth session.
    ///
    /// # Errors
    /// `Validation` for rejected credentials, `Network` on transport failure.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<UserProfile> {
        let body = to_body(&LoginRequest { email, password })?;
        let value = self
            .gateway
            .request_public("auth/login/", Method::POST, Some(&body))
            .await?;
        Ok(self.establish(decode(value)?))
    }

    /// Creates an account and establishes the auth session.
    ///
    /// # Errors
    /// `Validation` carrying per-field errors, `Network` on transport failure.
    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<UserProfile> {
        let body = to_body(request)?;
        let value = self
            .gateway
            .request_public("auth/register/", Method::POST, Some(&body))
            .await?;
        Ok(self.establish(decode(value)?))
    }

    /// Tells the server to revoke the refresh credential, then clears the
    /// local session whatever the server answered.
    pub async fn logout(&self) {
        if let Some(refresh) = self.store().refresh() {
            let body = json!({ "refresh": refresh });
            if let Err(err) = self.gateway.post("auth/logout/", &body).await {
                tracing::info!(error = %err, "Server logout failed, clearing locally");
            }
        }
        if let Err(err) = self.store().clear() {
            tracing::warn!(error = %format!("{err:#}"), "Failed to clear auth session");
        }
    }

    /// # Errors
    /// See [`ApiGateway::request`].
    pub async fn list_personas(&self) -> ApiResult<Vec<Persona>> {
        let value = self.gateway.get("personas/").await?;
        decode::<Listing<Persona>>(value).map(Listing::into_vec)
    }

    /// # Errors
    /// See [`ApiGateway::request`].
    pub async fn list_sessions(&self) -> ApiResult<Vec<Session>> {
        let value = self.gateway.get("sessions/").await?;
        decode::<Listing<Session>>(value).map(Listing::into_vec)
    }

    /// # Errors
    /// See [`ApiGateway::request`].
    pub async fn get_session(&self, id: &str) -> ApiResult<Session> {
        let value = self.gateway.get(&format!("sessions/{id}/")).await?;
        decode(value)
    }

    /// # Errors
    /// See [`ApiGateway::request`].
    pub async fn create_session(&self, request: &CreateSessionRequest) -> ApiResult<Session> {
        let body = to_body(request)?;
        let value = self.gateway.post("sessions/", &body).await?;
        decode(value)
    }

    /// # Errors
    /// See [`ApiGateway::request`].
    pub async fn list_messages(&self, session_id: &str) -> ApiResult<Vec<Message>> {
        let value = self
            .gateway
            .get(&format!("sessions/{session_id}/messages/"))
            .await?;
        let mut messages = decode::<Listing<Message>>(value)?.into_vec();
        for message in &mut messages {
            message.session.get_or_insert_with(|| session_id.to_string());
        }
        Ok(messages)
    }

    /// # Errors
    /// See [`ApiGateway::request`].
    pub async fn add_message(&self, session_id: &str, content: &str) -> ApiResult<AddMessageReply> {
        let body = to_body(&AddMessageRequest::user_text(content))?;
        let value = self
            .gateway
            .post(&format!("sessions/{session_id}/add_message/"), &body)
            .await?;
        if value.is_null() {
            return Ok(AddMessageReply::default());
        }
        decode(value)
    }

    /// Marks the session completed, optionally with a rating and feedback.
    ///
    /// # Errors
    /// See [`ApiGateway::request`].
    pub async fn end_session(
        &self,
        session_id: &str,
        request: &EndSessionRequest,
    ) -> ApiResult<()> {
        self.gateway
            .post(&format!("sessions/{session_id}/end/"), &to_body(request)?)
            .await
            .map(|_| ())
    }

    fn establish(&self, auth: AuthResponse) -> UserProfile {
        if let Err(err) = self
            .store()
            .establish(auth.access, auth.refresh, auth.user.clone())
        {
            tracing::warn!(error = %format!("{err:#}"), "Auth session not persisted");
        }
        tracing::info!(user_id = %auth.user.id, "Logged in");
        auth.user
    }
}

fn to_body<T: Serialize>(value: &T) -> ApiResult<Value> {
    serde_json::to_value(value).map_err(|e| ApiError::Network(format!("Failed to encode request: {e}")))
}

fn decode<T: DeserializeOwned>(value: Value) -> ApiResult<T> {
    serde_json::from_value(value)
        .map_err(|e| ApiError::Network(format!("Unexpected response shape: {e}")))
}
