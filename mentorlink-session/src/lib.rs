//! Mentorlink Session - Client-side session and role-authorization lifecycle
//!
//! This crate owns everything that depends on whether the user is signed in:
//!
//! - Durable device-local storage and the single authoritative [`SessionStore`]
//! - The [`CredentialSubmitter`] for password, sign-up and identity-provider flows
//! - The [`RoleRouter`] mapping a server-reported role to a destination view
//! - [`GatedFeature`], the mount/fetch/render state machine shared by every
//!   feature that needs a valid session (poster banner, profile editor)
//! - The administrative [`UserDirectory`]
//!
//! ## Architecture
//!
//! Components never read raw persisted keys. They receive a [`SessionContext`]
//! handle and go through its read/write/logout surface.

pub mod dismissal;
pub mod gated;
pub mod identity;
pub mod notice;
pub mod router;
pub mod storage;
pub mod store;
pub mod submitter;
pub mod users;

pub use dismissal::DismissalStore;
pub use gated::{
    poster::{CallToAction, PosterBanner, PosterSource},
    profile::{ProfileEditor, ProfileSource, SaveOutcome},
    FeatureSource, FeatureState, FootprintObserver, GatedFeature, InactiveReason,
};
pub use identity::{decode_identity_display, IdentityDisplay, ProviderError};
pub use notice::{Notice, NoticeBoard, NoticeKind};
pub use router::{NavigationHistory, Navigator, RoleRouter};
pub use storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use store::{SessionContext, SessionStore};
pub use submitter::{
    classify_failure_message, CredentialSubmitter, Submission, SubmitOutcome,
    INACTIVE_ACCOUNT_PATTERN,
};
pub use users::{UserDirectory, UserFilter};

use mentorlink_core::MentorlinkError;
use std::sync::atomic::{AtomicBool, Ordering};

/// Session-layer error type
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Core error: {0}")]
    Core(#[from] MentorlinkError),

    #[error("Storage error: {message}")]
    Storage {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Another request is already in progress")]
    Busy,

    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;

impl SessionError {
    /// Create a storage error
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Create a storage error with source
    pub fn storage_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state<S: Into<String>>(message: S) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Whether the underlying failure was the server rejecting the session token
    pub fn is_authorization_failure(&self) -> bool {
        matches!(self, SessionError::Core(e) if e.is_authorization_failure())
    }

    /// Text suitable for a user-facing notice
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Core(e) => e.user_message(),
            SessionError::Validation { message } => message.clone(),
            SessionError::NotAuthenticated => "Please sign in to continue.".to_string(),
            other => other.to_string(),
        }
    }
}

/// Recover the guard of a poisoned lock; the protected data is always left consistent.
pub(crate) fn unpoison<T>(result: Result<T, std::sync::PoisonError<T>>) -> T {
    result.unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Marks an operation as running until dropped
pub(crate) struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    /// `None` if the flag is already held
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
