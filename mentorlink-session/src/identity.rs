//! Identity-provider token handling on the client side.
//!
//! The provider token is opaque to the client: it is forwarded to the server,
//! which performs the real verification. The payload is only peeked at to show
//! a name and avatar while the exchange is in flight. Nothing decoded here may
//! be used to make an authorization decision.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use tracing::debug;

use crate::{SessionError, SessionResult};

/// Failure reported by the identity provider before any token was issued
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("Google sign-in was cancelled")]
    Cancelled,

    #[error("Google sign-in failed: {0}")]
    Failed(String),
}

/// Display-only claims of an identity-provider token
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IdentityDisplay {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Decode the payload segment of a JWT WITHOUT verifying its signature
pub fn decode_identity_display(token: &str) -> SessionResult<IdentityDisplay> {
    let payload = token
        .split('.')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| SessionError::validation("Identity token is not a JWT"))?;

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| SessionError::validation(format!("Identity token payload: {}", e)))?;

    let claims: IdentityDisplay = serde_json::from_slice(&bytes)?;
    debug!(has_name = claims.name.is_some(), "Decoded identity display claims");
    Ok(claims)
}
