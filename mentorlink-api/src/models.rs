//! Request and response bodies of the remote service

use chrono::{DateTime, Utc};
use mentorlink_core::{AccountStatus, SignupRole};
use serde::{Deserialize, Serialize};

/// `POST /users/login`
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /users/register`
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub role: SignupRole,
}

/// `POST /users/google-login`
#[derive(Debug, Clone, Serialize)]
pub struct GoogleLoginRequest {
    /// Identity-provider token, forwarded untouched
    pub token: String,
}

/// Session descriptor returned by every successful authentication path
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AuthResponse {
    pub token: String,
    pub name: String,
    #[serde(rename = "_id")]
    pub id: String,
    pub role: String,
    #[serde(default)]
    pub status: Option<AccountStatus>,
}

/// Structured failure body, `{ "message": "..." }`
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

/// Generic acknowledgement returned by administrative endpoints
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// `GET /users/profile`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub status: Option<AccountStatus>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, alias = "imageUrl")]
    pub profile_image: Option<String>,
}

/// Editable subset sent with `PUT /users/profile`
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

impl From<&Profile> for ProfileUpdate {
    fn from(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            bio: profile.bio.clone(),
            phone: profile.phone.clone(),
            profile_image: profile.profile_image.clone(),
        }
    }
}

/// Binary asset for `POST /users/upload`
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Build an upload guessing the content type from the file extension
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let extension = file_name
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_lowercase();
        let content_type = match extension.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            _ => "application/octet-stream",
        };

        Self {
            file_name,
            content_type: content_type.to_string(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub image_url: String,
}

/// Entry of `GET /users/all`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub status: Option<AccountStatus>,
}

/// `PATCH /users/:id/status`
#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate {
    pub status: AccountStatus,
}

/// Promotional item served by `GET /announcements/poster`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub button_text: Option<String>,
    #[serde(default)]
    pub button_url: Option<String>,
    #[serde(default)]
    pub poster_until: Option<DateTime<Utc>>,
}

impl Announcement {
    /// Whether the poster window has closed at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.poster_until.is_some_and(|until| until <= now)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct PosterResponse {
    #[serde(default)]
    pub announcement: Option<Announcement>,
}
