// Token acquisition for mutating booking calls
//
// Tokens are never cached: every PUT/PATCH/DELETE asks its provider again.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiError;
use crate::transport::{ApiRequest, Transport};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "password123";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn admin() -> Self {
        Self::new(ADMIN_USERNAME, ADMIN_PASSWORD)
    }

    // POST /auth takes a form body, not JSON
    pub fn to_request(&self) -> ApiRequest {
        ApiRequest::post("/auth").with_form(vec![
            ("username".to_string(), self.username.clone()),
            ("password".to_string(), self.password.clone()),
        ])
    }
}

// Body of POST /auth. Bad credentials still come back with status 200.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AuthResponse {
    Token { token: String },
    Rejected { reason: String },
}

impl AuthResponse {
    pub fn token(&self) -> Option<&str> {
        match self {
            AuthResponse::Token { token } => Some(token),
            AuthResponse::Rejected { .. } => None,
        }
    }
}

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> Result<String, ApiError>;
}

// Logs in through the same transport as the client, once per call
pub struct CredentialsTokenProvider<T: Transport> {
    transport: Arc<T>,
    credentials: Credentials,
}

impl<T: Transport> CredentialsTokenProvider<T> {
    pub fn new(transport: Arc<T>, credentials: Credentials) -> Self {
        Self {
            transport,
            credentials,
        }
    }
}

#[async_trait]
impl<T: Transport> TokenProvider for CredentialsTokenProvider<T> {
    async fn token(&self) -> Result<String, ApiError> {
        let response = self.transport.send(self.credentials.to_request()).await?;

        let parsed = response.json::<AuthResponse>().map_err(|_| ApiError::TokenRejected {
            status: response.status,
            reason: response.body.clone(),
        })?;

        match parsed {
            AuthResponse::Token { token } => {
                tracing::info!(username = %self.credentials.username, "fetched auth token");
                Ok(token)
            }
            AuthResponse::Rejected { reason } => Err(ApiError::TokenRejected {
                status: response.status,
                reason,
            }),
        }
    }
}

// Hands out a fixed token; for tests and for callers that manage login themselves
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<String, ApiError> {
        Ok(self.0.clone())
    }
}
