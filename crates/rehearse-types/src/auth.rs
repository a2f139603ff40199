//! Authentication request/response bodies.

use serde::{Deserialize, Serialize};

use crate::user::UserProfile;

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub password_confirm: String,
}

impl RegisterRequest {
    pub fn passwords_match(&self) -> bool {
        self.password == self.password_confirm
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Body of a successful refresh. Rotating backends also return a new refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct TokenPair {
    access: String,
    refresh: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RawAuthResponse {
    #[serde(default)]
    access: Option<String>,
    #[serde(default)]
    refresh: Option<String>,
    #[serde(default)]
    tokens: Option<TokenPair>,
    user: UserProfile,
}

/// Login/register result: a credential pair plus the user profile.
///
/// Accepts both `{access, refresh, user}` and `{user, tokens: {access, refresh}}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawAuthResponse")]
pub struct AuthResponse {
    pub access: String,
    pub refresh: String,
    pub user: UserProfile,
}

impl TryFrom<RawAuthResponse> for AuthResponse {
    type Error = String;

    fn try_from(raw: RawAuthResponse) -> Result<Self, Self::Error> {
        let (access, refresh) = match (raw.access, raw.refresh, raw.tokens) {
            (Some(access), Some(refresh), _) => (access, refresh),
            (_, _, Some(tokens)) => (tokens.access, tokens.refresh),
            _ => return Err("auth response is missing access/refresh tokens".to_string()),
        };
        Ok(Self {
            access,
            refresh,
            user: raw.user,
        })
    }
}
