//! API client for the Mentorlink remote service
//!
//! This crate models the request/response contract of the remote service and
//! provides a reqwest-backed client. Callers depend on the [`ServiceApi`] trait so
//! the session layer can be exercised against in-process fakes.

use async_trait::async_trait;
use mentorlink_core::{AccountStatus, ApiSettings, ErrorContext, MentorlinkError, MentorlinkResult};

pub mod http;
pub mod models;

pub use http::HttpServiceClient;
pub use models::*;

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        ApiSettings::default().into()
    }
}

impl From<ApiSettings> for ApiClientConfig {
    fn from(settings: ApiSettings) -> Self {
        Self {
            base_url: settings.base_url,
            timeout_seconds: settings.timeout_seconds,
            user_agent: settings.user_agent,
        }
    }
}

impl ApiClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// Remote service operations consumed by the client.
///
/// Bearer-authorized calls take the stored session token explicitly; the client
/// itself holds no session state.
#[async_trait]
pub trait ServiceApi: Send + Sync {
    /// `POST /users/register`
    async fn register(&self, request: &RegisterRequest) -> MentorlinkResult<AuthResponse>;

    /// `POST /users/login`
    async fn login(&self, request: &LoginRequest) -> MentorlinkResult<AuthResponse>;

    /// `POST /users/google-login`
    async fn google_login(&self, request: &GoogleLoginRequest) -> MentorlinkResult<AuthResponse>;

    /// `GET /users/profile`
    async fn get_profile(&self, token: &str) -> MentorlinkResult<Profile>;

    /// `PUT /users/profile`
    async fn update_profile(&self, token: &str, update: &ProfileUpdate)
        -> MentorlinkResult<Profile>;

    /// `POST /users/upload`
    async fn upload_image(&self, token: &str, upload: &ImageUpload)
        -> MentorlinkResult<UploadResponse>;

    /// `GET /users/all`
    async fn list_users(&self, token: &str) -> MentorlinkResult<Vec<UserSummary>>;

    /// `PATCH /users/:id/status`
    async fn update_user_status(
        &self,
        token: &str,
        user_id: &str,
        status: AccountStatus,
    ) -> MentorlinkResult<MessageResponse>;

    /// `DELETE /users/:id`
    async fn delete_user(&self, token: &str, user_id: &str) -> MentorlinkResult<MessageResponse>;

    /// `GET /announcements/poster`; `None` when no poster is active
    async fn fetch_poster(&self, token: &str) -> MentorlinkResult<Option<Announcement>>;
}

/// Helper function to create HTTP client with common configuration
pub(crate) fn create_http_client(config: &ApiClientConfig) -> MentorlinkResult<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();

    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_str(&config.user_agent).map_err(|e| {
            MentorlinkError::Config {
                message: format!("Invalid user agent: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            }
        })?,
    );

    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_seconds))
        .default_headers(headers)
        .build()
        .map_err(|e| MentorlinkError::Config {
            message: format!("Failed to create HTTP client: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("http_client").with_operation("create_client"),
        })
}

/// Turn a non-success response into a service error carrying the server's message
pub(crate) async fn handle_response_error(
    response: reqwest::Response,
    operation: &str,
) -> MentorlinkError {
    let status = response.status();
    let url = response.url().path().to_string();
    let body = response.text().await.unwrap_or_default();

    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody { message }) if !message.trim().is_empty() => message,
        _ if !body.trim().is_empty() && !body.trim_start().starts_with('<') => {
            body.trim().to_string()
        }
        _ => status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string(),
    };

    MentorlinkError::Api {
        status: status.as_u16(),
        message,
        context: ErrorContext::new("api_client")
            .with_operation(operation)
            .with_metadata("path", &url)
            .with_suggestion(match status.as_u16() {
                401 => "Sign in again",
                403 => "Your account may not have access to this action",
                404 => "The requested resource does not exist",
                _ => "Check network connectivity and service status",
            }),
    }
}

/// Map a transport failure into a network or timeout error
pub(crate) fn transport_error(
    error: reqwest::Error,
    operation: &str,
    timeout_ms: u64,
) -> MentorlinkError {
    if error.is_timeout() {
        return MentorlinkError::Timeout {
            operation: operation.to_string(),
            duration_ms: timeout_ms,
            context: ErrorContext::new("api_client")
                .with_operation(operation)
                .with_suggestion("Increase api.timeout_seconds"),
        };
    }

    MentorlinkError::Network {
        message: format!("Request failed: {}", error),
        source: Some(Box::new(error)),
        context: ErrorContext::new("api_client")
            .with_operation(operation)
            .with_suggestion("Check network connectivity and api.base_url"),
    }
}
