//! Device-local record of dismissed announcements
//!
//! Dismissals are kept per announcement id under their own keys and outlive
//! logout; only the session keys are removed when signing out.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::storage::KeyValueStore;
use crate::SessionResult;

pub const DISMISSAL_KEY_PREFIX: &str = "dismissed_announcement_";

#[derive(Clone)]
pub struct DismissalStore {
    backend: Arc<dyn KeyValueStore>,
}

impl DismissalStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn key_for(announcement_id: &str) -> String {
        format!("{}{}", DISMISSAL_KEY_PREFIX, announcement_id)
    }

    /// Unreadable storage counts as not dismissed
    pub fn is_dismissed(&self, announcement_id: &str) -> bool {
        match self.backend.get(&Self::key_for(announcement_id)) {
            Ok(value) => value.as_deref() == Some("true"),
            Err(e) => {
                warn!(announcement_id, error = %e, "Failed to read dismissal");
                false
            }
        }
    }

    pub fn dismiss(&self, announcement_id: &str) -> SessionResult<()> {
        self.backend.set(&Self::key_for(announcement_id), "true")?;
        debug!(announcement_id, "Announcement dismissed");
        Ok(())
    }
}
