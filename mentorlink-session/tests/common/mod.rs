//! In-process service fake shared by the session tests
#![allow(dead_code)]

use async_trait::async_trait;
use mentorlink_api::{
    Announcement, AuthResponse, GoogleLoginRequest, ImageUpload, LoginRequest, MessageResponse,
    Profile, ProfileUpdate, RegisterRequest, ServiceApi, UploadResponse, UserSummary,
};
use mentorlink_core::{AccountStatus, ErrorContext, MentorlinkError, MentorlinkResult};
use mentorlink_session::store::{AUTH_TOKEN_KEY, USER_ID_KEY, USER_NAME_KEY, USER_ROLE_KEY};
use mentorlink_session::{KeyValueStore, MemoryKeyValueStore, SessionContext};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Canned reply that can be produced any number of times
#[derive(Debug, Clone)]
pub enum Reply<T> {
    Ok(T),
    Status(u16, String),
    Unreachable,
}

impl<T: Clone> Reply<T> {
    fn produce(&self, operation: &str) -> MentorlinkResult<T> {
        match self {
            Reply::Ok(value) => Ok(value.clone()),
            Reply::Status(status, message) => Err(MentorlinkError::Api {
                status: *status,
                message: message.clone(),
                context: ErrorContext::new("fake").with_operation(operation),
            }),
            Reply::Unreachable => Err(MentorlinkError::Network {
                message: "connection refused".to_string(),
                source: None,
                context: ErrorContext::new("fake").with_operation(operation),
            }),
        }
    }
}

pub fn status<T>(code: u16, message: &str) -> Reply<T> {
    Reply::Status(code, message.to_string())
}

pub struct FakeServiceApi {
    pub auth: Mutex<Reply<AuthResponse>>,
    pub profile: Mutex<Reply<Profile>>,
    pub update: Mutex<Option<Reply<Profile>>>,
    pub upload: Mutex<Reply<UploadResponse>>,
    pub users: Mutex<Reply<Vec<UserSummary>>>,
    pub ack: Mutex<Reply<MessageResponse>>,
    pub poster: Mutex<Reply<Option<Announcement>>>,
    /// When set, auth and poster calls wait for a permit before answering
    pub gate: Mutex<Option<Arc<Notify>>>,
    /// Tokens the poster endpoint answers with 401
    pub revoked: Mutex<Vec<String>>,
    pub calls: Mutex<Vec<String>>,
    pub last_update: Mutex<Option<ProfileUpdate>>,
    pub last_google_token: Mutex<Option<String>>,
}

impl Default for FakeServiceApi {
    fn default() -> Self {
        Self {
            auth: Mutex::new(Reply::Ok(auth_response("t1", "1", "A", "mentor"))),
            profile: Mutex::new(Reply::Ok(profile("A"))),
            update: Mutex::new(None),
            upload: Mutex::new(Reply::Ok(UploadResponse {
                image_url: "https://cdn.example.com/new.png".to_string(),
            })),
            users: Mutex::new(Reply::Ok(Vec::new())),
            ack: Mutex::new(Reply::Ok(MessageResponse::default())),
            poster: Mutex::new(Reply::Ok(None)),
            gate: Mutex::new(None),
            revoked: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            last_update: Mutex::new(None),
            last_google_token: Mutex::new(None),
        }
    }
}

impl FakeServiceApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_auth(&self, reply: Reply<AuthResponse>) {
        *self.auth.lock().unwrap() = reply;
    }

    pub fn set_poster(&self, reply: Reply<Option<Announcement>>) {
        *self.poster.lock().unwrap() = reply;
    }

    pub fn set_upload(&self, reply: Reply<UploadResponse>) {
        *self.upload.lock().unwrap() = reply;
    }

    pub fn set_update(&self, reply: Reply<Profile>) {
        *self.update.lock().unwrap() = Some(reply);
    }

    pub fn set_users(&self, reply: Reply<Vec<UserSummary>>) {
        *self.users.lock().unwrap() = reply;
    }

    pub fn revoke(&self, token: &str) {
        self.revoked.lock().unwrap().push(token.to_string());
    }

    pub fn gate(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(notify.clone());
        notify
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == operation).count()
    }

    fn record(&self, operation: &str) {
        self.calls.lock().unwrap().push(operation.to_string());
    }

    async fn wait_for_gate(&self) {
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    async fn authenticate(&self, operation: &str) -> MentorlinkResult<AuthResponse> {
        self.record(operation);
        self.wait_for_gate().await;
        let reply = self.auth.lock().unwrap().clone();
        reply.produce(operation)
    }
}

#[async_trait]
impl ServiceApi for FakeServiceApi {
    async fn register(&self, _request: &RegisterRequest) -> MentorlinkResult<AuthResponse> {
        self.authenticate("register").await
    }

    async fn login(&self, _request: &LoginRequest) -> MentorlinkResult<AuthResponse> {
        self.authenticate("login").await
    }

    async fn google_login(&self, request: &GoogleLoginRequest) -> MentorlinkResult<AuthResponse> {
        *self.last_google_token.lock().unwrap() = Some(request.token.clone());
        self.authenticate("google_login").await
    }

    async fn get_profile(&self, _token: &str) -> MentorlinkResult<Profile> {
        self.record("get_profile");
        let reply = self.profile.lock().unwrap().clone();
        reply.produce("get_profile")
    }

    async fn update_profile(
        &self,
        _token: &str,
        update: &ProfileUpdate,
    ) -> MentorlinkResult<Profile> {
        self.record("update_profile");
        *self.last_update.lock().unwrap() = Some(update.clone());

        let configured = self.update.lock().unwrap().clone();
        if let Some(reply) = configured {
            return reply.produce("update_profile");
        }

        // Behave like the server: later profile reads see the update
        let mut stored = self.profile.lock().unwrap();
        let mut current = match &*stored {
            Reply::Ok(profile) => profile.clone(),
            _ => Profile::default(),
        };
        current.name = update.name.clone();
        current.bio = update.bio.clone();
        current.phone = update.phone.clone();
        current.profile_image = update.profile_image.clone();
        *stored = Reply::Ok(current.clone());
        Ok(current)
    }

    async fn upload_image(
        &self,
        _token: &str,
        _upload: &ImageUpload,
    ) -> MentorlinkResult<UploadResponse> {
        self.record("upload_image");
        let reply = self.upload.lock().unwrap().clone();
        reply.produce("upload_image")
    }

    async fn list_users(&self, _token: &str) -> MentorlinkResult<Vec<UserSummary>> {
        self.record("list_users");
        let reply = self.users.lock().unwrap().clone();
        reply.produce("list_users")
    }

    async fn update_user_status(
        &self,
        _token: &str,
        _user_id: &str,
        _status: AccountStatus,
    ) -> MentorlinkResult<MessageResponse> {
        self.record("update_user_status");
        let reply = self.ack.lock().unwrap().clone();
        reply.produce("update_user_status")
    }

    async fn delete_user(&self, _token: &str, _user_id: &str) -> MentorlinkResult<MessageResponse> {
        self.record("delete_user");
        let reply = self.ack.lock().unwrap().clone();
        reply.produce("delete_user")
    }

    async fn fetch_poster(&self, token: &str) -> MentorlinkResult<Option<Announcement>> {
        self.record("fetch_poster");
        self.wait_for_gate().await;
        if self.revoked.lock().unwrap().iter().any(|t| t == token) {
            return status::<Option<Announcement>>(401, "jwt expired").produce("fetch_poster");
        }
        let reply = self.poster.lock().unwrap().clone();
        reply.produce("fetch_poster")
    }
}

pub fn auth_response(token: &str, id: &str, name: &str, role: &str) -> AuthResponse {
    AuthResponse {
        token: token.to_string(),
        name: name.to_string(),
        id: id.to_string(),
        role: role.to_string(),
        status: None,
    }
}

pub fn profile(name: &str) -> Profile {
    Profile {
        id: "1".to_string(),
        name: name.to_string(),
        email: "a@x.com".to_string(),
        ..Default::default()
    }
}

pub fn announcement(id: &str) -> Announcement {
    Announcement {
        id: id.to_string(),
        title: "Mentor week".to_string(),
        message: "Join the sessions".to_string(),
        image_url: None,
        button_text: Some("Register".to_string()),
        button_url: Some("https://example.com/week".to_string()),
        poster_until: Some(chrono::Utc::now() + chrono::Duration::days(7)),
    }
}

/// Session left behind by an earlier run of the client
pub fn stored_session(backend: &dyn KeyValueStore, role: &str) {
    backend
        .set_many(&[
            (AUTH_TOKEN_KEY, "t1"),
            (USER_NAME_KEY, "A"),
            (USER_ID_KEY, "1"),
            (USER_ROLE_KEY, role),
        ])
        .unwrap();
}

pub fn signed_in(role: &str) -> (Arc<MemoryKeyValueStore>, SessionContext) {
    let backend = Arc::new(MemoryKeyValueStore::new());
    stored_session(backend.as_ref(), role);
    let context = SessionContext::open(backend.clone()).unwrap();
    (backend, context)
}

pub fn signed_out() -> (Arc<MemoryKeyValueStore>, SessionContext) {
    let backend = Arc::new(MemoryKeyValueStore::new());
    let context = SessionContext::open(backend.clone()).unwrap();
    (backend, context)
}
