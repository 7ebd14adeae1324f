//! Promotional poster banner shown to signed-in users

use async_trait::async_trait;
use chrono::Utc;
use mentorlink_api::{Announcement, ServiceApi};
use mentorlink_core::MentorlinkResult;
use std::sync::Arc;
use tracing::{debug, info};

use super::{FeatureSource, GatedFeature, InactiveReason};
use crate::dismissal::DismissalStore;
use crate::notice::NoticeBoard;
use crate::store::SessionContext;
use crate::SessionResult;

/// Fetches the current announcement and filters out dismissed or expired ones
pub struct PosterSource {
    api: Arc<dyn ServiceApi>,
    dismissals: DismissalStore,
}

impl PosterSource {
    pub fn new(api: Arc<dyn ServiceApi>, dismissals: DismissalStore) -> Self {
        Self { api, dismissals }
    }

    pub fn dismissals(&self) -> &DismissalStore {
        &self.dismissals
    }
}

#[async_trait]
impl FeatureSource for PosterSource {
    type Content = Announcement;

    fn name(&self) -> &'static str {
        "poster"
    }

    async fn fetch(&self, token: &str) -> MentorlinkResult<Option<Announcement>> {
        self.api.fetch_poster(token).await
    }

    fn is_eligible(&self, announcement: &Announcement) -> bool {
        if self.dismissals.is_dismissed(&announcement.id) {
            debug!(announcement_id = %announcement.id, "Poster previously dismissed");
            return false;
        }
        if announcement.is_expired_at(Utc::now()) {
            debug!(announcement_id = %announcement.id, "Poster window has closed");
            return false;
        }
        true
    }
}

/// Button shown on an active poster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallToAction {
    pub text: String,
    pub url: String,
}

pub type PosterBanner = GatedFeature<PosterSource>;

impl GatedFeature<PosterSource> {
    /// Poster banner sharing the session's device storage for dismissals
    pub fn poster(api: Arc<dyn ServiceApi>, session: SessionContext, notices: NoticeBoard) -> Self {
        let dismissals = DismissalStore::new(session.backend());
        GatedFeature::new(PosterSource::new(api, dismissals), session, notices)
    }

    /// Hide the active poster for good on this device.
    ///
    /// Returns `false` when nothing is showing.
    pub fn dismiss(&self) -> SessionResult<bool> {
        let Some(announcement) = self.state().content().cloned() else {
            return Ok(false);
        };

        self.source().dismissals().dismiss(&announcement.id)?;
        let changed = self.deactivate(InactiveReason::Dismissed);
        info!(announcement_id = %announcement.id, "Poster dismissed");
        Ok(changed)
    }

    /// Button of the active poster, when it has both a label and a link
    pub fn call_to_action(&self) -> Option<CallToAction> {
        let state = self.state();
        let announcement = state.content()?;
        match (&announcement.button_text, &announcement.button_url) {
            (Some(text), Some(url)) if !text.trim().is_empty() && !url.trim().is_empty() => {
                Some(CallToAction {
                    text: text.clone(),
                    url: url.clone(),
                })
            }
            _ => None,
        }
    }
}
