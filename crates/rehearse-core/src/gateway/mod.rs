//! Authenticated request gateway.
//!
//! Every protected call carries the stored access credential. A 401 answer
//! triggers one credential renewal (shared by all callers that hit the 401
//! while it is in flight) followed by exactly one retry of the original
//! request. When renewal is impossible the session is cleared and the call
//! fails with [`ApiError::Auth`].

mod error;

use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use rehearse_types::{RefreshRequest, RefreshResponse};
use reqwest::{Method, Response, StatusCode};
use serde_json::Value;

pub use self::error::ApiError;
use crate::auth::AuthStore;
use crate::config::ApiConfig;

/// Result of a gateway call.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Relative path of the renewal endpoint.
pub const REFRESH_ENDPOINT: &str = "auth/refresh/";

type Renewal = Shared<BoxFuture<'static, ApiResult<String>>>;

pub struct ApiGateway {
    http: reqwest::Client,
    base_url: String,
    store: AuthStore,
    renewal: Mutex<Option<Renewal>>,
}

impl ApiGateway {
    pub fn new(base_url: impl Into<String>, store: AuthStore) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, store)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>, store: AuthStore) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            store,
            renewal: Mutex::new(None),
        }
    }

    /// Builds a gateway from config, applying env overrides and the timeout.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the client cannot be built.
    pub fn from_config(config: &ApiConfig, store: AuthStore) -> Result<Self> {
        let base_url = config.effective_base_url()?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;
        Ok(Self::with_client(http, base_url, store))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &AuthStore {
        &self.store
    }

    /// Full URL for an endpoint relative to the base.
    pub fn url(&self, endpoint: &str) -> String {
        join_url(&self.base_url, endpoint)
    }

    /// Executes a protected request with the renewal-and-retry protocol.
    ///
    /// # Errors
    /// `Auth` when the session cannot be renewed, `Validation` for any other
    /// error status, `Network` for transport failures.
    pub async fn request(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<&Value>,
    ) -> ApiResult<Value> {
        let token = self.store.access();
        let response = self
            .send(&method, endpoint, body, token.as_deref())
            .await?;
        tracing::debug!(%method, endpoint, status = response.status().as_u16(), "API response");

        if response.status() != StatusCode::UNAUTHORIZED {
            return decode_response(response).await;
        }

        let fresh = self.renewed_access(token.as_deref()).await?;
        let retry = self.send(&method, endpoint, body, Some(&fresh)).await?;
        tracing::debug!(
            %method,
            endpoint,
            status = retry.status().as_u16(),
            retry = true,
            "API response"
        );

        if retry.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!(endpoint, "Renewed credential rejected, clearing session");
            clear_session(&self.store);
            return Err(ApiError::Auth);
        }
        decode_response(retry).await
    }

    /// Executes a request without credentials or renewal.
    ///
    /// Used for login and register, where a 401 means bad credentials.
    ///
    /// # Errors
    /// `Validation` for any error status, `Network` for transport failures.
    pub async fn request_public(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<&Value>,
    ) -> ApiResult<Value> {
        let response = self.send(&method, endpoint, body, None).await?;
        tracing::debug!(%method, endpoint, status = response.status().as_u16(), "API response");
        decode_response(response).await
    }

    /// # Errors
    /// See [`ApiGateway::request`].
    pub async fn get(&self, endpoint: &str) -> ApiResult<Value> {
        self.request(endpoint, Method::GET, None).await
    }

    /// # Errors
    /// See [`ApiGateway::request`].
    pub async fn post(&self, endpoint: &str, body: &Value) -> ApiResult<Value> {
        self.request(endpoint, Method::POST, Some(body)).await
    }

    /// # Errors
    /// See [`ApiGateway::request`].
    pub async fn patch(&self, endpoint: &str, body: &Value) -> ApiResult<Value> {
        self.request(endpoint, Method::PATCH, Some(body)).await
    }

    /// # Errors
    /// See [`ApiGateway::request`].
    pub async fn delete(&self, endpoint: &str) -> ApiResult<Value> {
        self.request(endpoint, Method::DELETE, None).await
    }

    async fn send(
        &self,
        method: &Method,
        endpoint: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> ApiResult<Response> {
        let mut request = self.http.request(method.clone(), self.url(endpoint));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await.map_err(|e| {
            tracing::warn!(%method, endpoint, error = %e, "API request failed");
            ApiError::from_transport(&e)
        })
    }

    /// Returns an access credential newer than `rejected`, renewing if needed.
    async fn renewed_access(&self, rejected: Option<&str>) -> ApiResult<String> {
        if let Some(current) = self.store.access()
            && Some(current.as_str()) != rejected
        {
            tracing::debug!("Credential already renewed by another request");
            return Ok(current);
        }

        if self.store.refresh().is_none() {
            tracing::info!("No refresh credential, clearing session");
            clear_session(&self.store);
            return Err(ApiError::Auth);
        }

        let renewal = {
            let mut slot = self.renewal_slot();
            match slot.as_ref() {
                Some(pending) if pending.peek().is_none() => pending.clone(),
                _ => {
                    let fresh = renew(
                        self.http.clone(),
                        self.url(REFRESH_ENDPOINT),
                        self.store.clone(),
                    )
                    .boxed()
                    .shared();
                    *slot = Some(fresh.clone());
                    fresh
                }
            }
        };

        let outcome = renewal.await;

        let mut slot = self.renewal_slot();
        if slot.as_ref().is_some_and(|pending| pending.peek().is_some()) {
            *slot = None;
        }
        outcome
    }

    fn renewal_slot(&self) -> MutexGuard<'_, Option<Renewal>> {
        self.renewal.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Posts the refresh credential and stores the new access credential.
///
/// A rejected or failed renewal clears the session it was issued for. A
/// renewal that lands after the session was cleared or replaced is dropped
/// and leaves the store alone.
async fn renew(http: reqwest::Client, url: String, store: AuthStore) -> ApiResult<String> {
    let Some(refresh) = store.refresh() else {
        clear_session(&store);
        return Err(ApiError::Auth);
    };

    tracing::info!("Renewing access credential");
    let sent = http
        .post(&url)
        .json(&RefreshRequest { refresh: &refresh })
        .send()
        .await;

    let renewed = match sent {
        Ok(response) if response.status().is_success() => {
            response.json::<RefreshResponse>().await.ok()
        }
        Ok(response) => {
            tracing::warn!(status = response.status().as_u16(), "Credential renewal rejected");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "Credential renewal failed");
            None
        }
    };

    let Some(renewed) = renewed else {
        if let Err(err) = store.clear_if_refresh(&refresh) {
            tracing::warn!(error = %format!("{err:#}"), "Failed to clear auth session");
        }
        return Err(ApiError::Auth);
    };

    match store.renew_credentials(&refresh, renewed.access.clone(), renewed.refresh) {
        Ok(true) => {}
        Ok(false) => {
            tracing::info!("Session changed during renewal, discarding renewed credential");
            return Err(ApiError::Auth);
        }
        Err(err) => {
            tracing::warn!(error = %format!("{err:#}"), "Renewed credential not persisted");
        }
    }
    tracing::info!("Access credential renewed");
    Ok(renewed.access)
}

fn clear_session(store: &AuthStore) {
    if let Err(err) = store.clear() {
        tracing::warn!(error = %format!("{err:#}"), "Failed to clear auth session");
    }
}

fn join_url(base: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

async fn decode_response(response: Response) -> ApiResult<Value> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ApiError::from_transport(&e))?;

    if status.is_success() {
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        return serde_json::from_str(&text)
            .map_err(|e| ApiError::Network(format!("Malformed response body: {e}")));
    }

    let body = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };
    Err(ApiError::validation(status.as_u16(), body))
}
