use serde_json::Value;

/// Failure of a backend call as seen by the workflow.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// The session could not be renewed; credentials have been cleared.
    #[error("authentication required")]
    Auth,
    /// Any non-401 error status, with the response body as received.
    #[error("HTTP {status}: {}", summarize_body(.body))]
    Validation { status: u16, body: Value },
    /// Transport failure or a malformed success body.
    #[error("network error: {0}")]
    Network(String),
}

impl ApiError {
    pub fn validation(status: u16, body: Value) -> Self {
        ApiError::Validation { status, body }
    }

    /// Builds a network error from a transport failure.
    pub fn from_transport(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Network(format!("Request timed out: {e}"))
        } else if e.is_connect() {
            ApiError::Network(format!("Connection failed: {e}"))
        } else if e.is_decode() || e.is_body() {
            ApiError::Network(format!("Failed to read response: {e}"))
        } else {
            ApiError::Network(format!("Request error: {e}"))
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Validation { status, .. } => Some(*status),
            ApiError::Auth => Some(401),
            ApiError::Network(_) => None,
        }
    }

    pub fn body(&self) -> Option<&Value> {
        match self {
            ApiError::Validation { body, .. } => Some(body),
            _ => None,
        }
    }

    /// One line suitable for a banner or inline notice.
    pub fn display_message(&self) -> String {
        match self {
            ApiError::Auth => "Your session has expired. Please log in again.".to_string(),
            ApiError::Network(_) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            ApiError::Validation { status, body } => headline(body)
                .or_else(|| {
                    self.field_errors()
                        .into_iter()
                        .next()
                        .map(|(field, msg)| format_field_error(&field, &msg))
                })
                .unwrap_or_else(|| format!("Request failed (HTTP {status})")),
        }
    }

    /// Per-field messages from a validation body, in body order.
    ///
    /// Each field contributes its first message; `non_field_errors` is reported
    /// under that name.
    pub fn field_errors(&self) -> Vec<(String, String)> {
        let Some(Value::Object(map)) = self.body() else {
            return Vec::new();
        };
        map.iter()
            .filter(|(key, _)| !matches!(key.as_str(), "detail" | "error" | "message" | "code"))
            .filter_map(|(key, value)| first_text(value).map(|msg| (key.clone(), msg)))
            .collect()
    }
}

fn headline(body: &Value) -> Option<String> {
    match body {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Object(map) => ["detail", "error", "message"]
            .iter()
            .find_map(|key| map.get(*key).and_then(first_text)),
        _ => None,
    }
}

fn first_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Array(items) => items.iter().find_map(first_text),
        _ => None,
    }
}

fn format_field_error(field: &str, message: &str) -> String {
    if field == "non_field_errors" {
        message.to_string()
    } else {
        format!("{field}: {message}")
    }
}

fn summarize_body(body: &Value) -> String {
    match body {
        Value::Null => "<empty body>".to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
