// Booking API client
//
// Thin wrapper over the restful-booker endpoints. Every call maps onto one
// endpoint and returns the raw response; status codes are left for the
// caller to judge. Mutating calls fetch a fresh token first.

use reqwest::Method;
use serde::Serialize;
use std::sync::Arc;

use crate::auth::{AuthResponse, Credentials, CredentialsTokenProvider, TokenProvider};
use crate::booking::{BookingFilter, BookingId};
use crate::config::ClientConfig;
use crate::error::{ApiError, ClientError};
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, Transport};

pub const TOKEN_COOKIE: &str = "token";

pub struct BookingApiClient<T: Transport = HttpTransport> {
    transport: Arc<T>,
    tokens: Arc<dyn TokenProvider>,
}

impl BookingApiClient<HttpTransport> {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(transport, config.credentials))
    }

    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(ClientConfig::from_env()?)
    }
}

impl<T: Transport> BookingApiClient<T> {
    // Mutating calls log in with `credentials` through the same transport
    pub fn with_transport(transport: T, credentials: Credentials) -> Self {
        let transport = Arc::new(transport);
        let tokens = Arc::new(CredentialsTokenProvider::new(
            Arc::clone(&transport),
            credentials,
        ));
        Self { transport, tokens }
    }

    pub fn with_token_provider(mut self, tokens: Arc<dyn TokenProvider>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // GET /ping
    pub async fn ping(&self) -> Result<ApiResponse, ApiError> {
        self.transport.send(ApiRequest::get("/ping")).await
    }

    // GET /booking with the non-empty filter fields as query parameters
    pub async fn list_booking_ids(&self, filter: &BookingFilter) -> Result<ApiResponse, ApiError> {
        let request = ApiRequest::get("/booking").with_query(filter.query_string());
        self.transport.send(request).await
    }

    pub async fn get_booking(&self, id: BookingId) -> Result<ApiResponse, ApiError> {
        self.transport.send(ApiRequest::get(booking_path(id))).await
    }

    // No local validation: whatever serializes is sent as-is
    pub async fn create_booking<P>(&self, payload: &P) -> Result<ApiResponse, ApiError>
    where
        P: Serialize + ?Sized,
    {
        let body = serde_json::to_value(payload)?;
        let request = ApiRequest::post("/booking").with_json(body);
        self.transport.send(request).await
    }

    // Bad credentials come back as 200 {"reason": "Bad credentials"}; not turned into an error
    pub async fn create_token(&self, username: &str, password: &str) -> Result<ApiResponse, ApiError> {
        let request = Credentials::new(username, password).to_request();
        self.transport.send(request).await
    }

    // Convenience over `create_token` for callers that only want the parsed body
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, ApiError> {
        self.create_token(username, password).await?.json()
    }

    // PUT /booking/{id}: full replace
    pub async fn update_booking<P>(&self, id: BookingId, payload: &P) -> Result<ApiResponse, ApiError>
    where
        P: Serialize + ?Sized,
    {
        let body = serde_json::to_value(payload)?;
        let request = ApiRequest::new(Method::PUT, booking_path(id)).with_json(body);
        self.send_authorized(request).await
    }

    // PATCH /booking/{id}: partial update
    pub async fn partial_update_booking<P>(
        &self,
        id: BookingId,
        payload: &P,
    ) -> Result<ApiResponse, ApiError>
    where
        P: Serialize + ?Sized,
    {
        let body = serde_json::to_value(payload)?;
        let request = ApiRequest::new(Method::PATCH, booking_path(id)).with_json(body);
        self.send_authorized(request).await
    }

    pub async fn delete_booking(&self, id: BookingId) -> Result<ApiResponse, ApiError> {
        let request = ApiRequest::new(Method::DELETE, booking_path(id));
        self.send_authorized(request).await
    }

    async fn send_authorized(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let token = self.tokens.token().await?;
        tracing::info!(method = %request.method, path = %request.path, "sending authorized request");
        self.transport
            .send(request.with_cookie(TOKEN_COOKIE, token))
            .await
    }
}

fn booking_path(id: BookingId) -> String {
    format!("/booking/{}", id)
}
