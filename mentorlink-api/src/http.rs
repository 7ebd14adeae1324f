//! reqwest implementation of [`ServiceApi`]

use async_trait::async_trait;
use mentorlink_core::{
    validation_error, AccountStatus, ErrorContext, MentorlinkError, MentorlinkResult,
};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use crate::models::PosterResponse;
use crate::{
    create_http_client, handle_response_error, transport_error, ApiClientConfig, Announcement,
    AuthResponse, GoogleLoginRequest, ImageUpload, LoginRequest, MessageResponse, Profile,
    ProfileUpdate, RegisterRequest, ServiceApi, StatusUpdate, UploadResponse, UserSummary,
};

/// HTTP client for the remote service
pub struct HttpServiceClient {
    client: reqwest::Client,
    config: ApiClientConfig,
}

/// `GET /users/all` has been served both bare and wrapped
#[derive(Deserialize)]
#[serde(untagged)]
enum UserListResponse {
    Bare(Vec<UserSummary>),
    Wrapped { users: Vec<UserSummary> },
}

impl HttpServiceClient {
    /// Create a new service client
    pub fn new(config: ApiClientConfig) -> MentorlinkResult<Self> {
        let client = create_http_client(&config)?;

        info!("Created service client for {}", config.base_url);

        Ok(Self { client, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    fn request(
        &self,
        method: Method,
        endpoint: &str,
        token: Option<&str>,
    ) -> reqwest::RequestBuilder {
        let url = self.url(endpoint);
        debug!(method = %method, endpoint = endpoint, "Making service request");

        let builder = self.client.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and return the raw body of a successful response
    async fn execute(
        &self,
        builder: reqwest::RequestBuilder,
        operation: &str,
    ) -> MentorlinkResult<String> {
        let response = builder
            .send()
            .await
            .map_err(|e| transport_error(e, operation, self.config.timeout_seconds * 1000))?;

        if !response.status().is_success() {
            return Err(handle_response_error(response, operation).await);
        }

        response
            .text()
            .await
            .map_err(|e| transport_error(e, operation, self.config.timeout_seconds * 1000))
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        operation: &str,
    ) -> MentorlinkResult<T> {
        let body = self.execute(builder, operation).await?;
        serde_json::from_str(&body).map_err(|e| MentorlinkError::Internal {
            message: format!("Unexpected response from service: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("api_client").with_operation(operation),
        })
    }

    async fn execute_ack(
        &self,
        builder: reqwest::RequestBuilder,
        operation: &str,
    ) -> MentorlinkResult<MessageResponse> {
        let body = self.execute(builder, operation).await?;
        if body.trim().is_empty() {
            return Ok(MessageResponse::default());
        }
        match serde_json::from_str(&body) {
            Ok(ack) => Ok(ack),
            Err(e) => {
                debug!(operation, error = %e, "Acknowledgement body is not JSON, ignoring it");
                Ok(MessageResponse::default())
            }
        }
    }
}

#[async_trait]
impl ServiceApi for HttpServiceClient {
    async fn register(&self, request: &RegisterRequest) -> MentorlinkResult<AuthResponse> {
        let builder = self.request(Method::POST, "users/register", None).json(request);
        self.execute_json(builder, "register").await
    }

    async fn login(&self, request: &LoginRequest) -> MentorlinkResult<AuthResponse> {
        let builder = self.request(Method::POST, "users/login", None).json(request);
        self.execute_json(builder, "login").await
    }

    async fn google_login(&self, request: &GoogleLoginRequest) -> MentorlinkResult<AuthResponse> {
        let builder = self
            .request(Method::POST, "users/google-login", None)
            .json(request);
        self.execute_json(builder, "google_login").await
    }

    async fn get_profile(&self, token: &str) -> MentorlinkResult<Profile> {
        let builder = self.request(Method::GET, "users/profile", Some(token));
        self.execute_json(builder, "get_profile").await
    }

    async fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> MentorlinkResult<Profile> {
        let builder = self
            .request(Method::PUT, "users/profile", Some(token))
            .json(update);
        self.execute_json(builder, "update_profile").await
    }

    async fn upload_image(
        &self,
        token: &str,
        upload: &ImageUpload,
    ) -> MentorlinkResult<UploadResponse> {
        let part = reqwest::multipart::Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.content_type)
            .map_err(|e| {
                validation_error!(
                    format!("Invalid content type '{}': {}", upload.content_type, e),
                    "image",
                    "api_client"
                )
            })?;
        let form = reqwest::multipart::Form::new().part("image", part);

        let builder = self
            .request(Method::POST, "users/upload", Some(token))
            .multipart(form);
        self.execute_json(builder, "upload_image").await
    }

    async fn list_users(&self, token: &str) -> MentorlinkResult<Vec<UserSummary>> {
        let builder = self.request(Method::GET, "users/all", Some(token));
        let response: UserListResponse = self.execute_json(builder, "list_users").await?;

        Ok(match response {
            UserListResponse::Bare(users) => users,
            UserListResponse::Wrapped { users } => users,
        })
    }

    async fn update_user_status(
        &self,
        token: &str,
        user_id: &str,
        status: AccountStatus,
    ) -> MentorlinkResult<MessageResponse> {
        let endpoint = format!("users/{}/status", urlencoding::encode(user_id));
        let builder = self
            .request(Method::PATCH, &endpoint, Some(token))
            .json(&StatusUpdate { status });
        self.execute_ack(builder, "update_user_status").await
    }

    async fn delete_user(&self, token: &str, user_id: &str) -> MentorlinkResult<MessageResponse> {
        let endpoint = format!("users/{}", urlencoding::encode(user_id));
        let builder = self.request(Method::DELETE, &endpoint, Some(token));
        self.execute_ack(builder, "delete_user").await
    }

    async fn fetch_poster(&self, token: &str) -> MentorlinkResult<Option<Announcement>> {
        let builder = self.request(Method::GET, "announcements/poster", Some(token));

        let body = match self.execute(builder, "fetch_poster").await {
            Ok(body) => body,
            Err(e) if e.is_no_content() => return Ok(None),
            Err(e) => return Err(e),
        };

        if body.trim().is_empty() {
            return Ok(None);
        }

        let response: PosterResponse =
            serde_json::from_str(&body).map_err(|e| MentorlinkError::Internal {
                message: format!("Unexpected poster response: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("api_client").with_operation("fetch_poster"),
            })?;

        Ok(response.announcement)
    }
}
