//! Profile view and editor
//!
//! Saving is two-phase: an optional image is uploaded first and the returned
//! URL is placed into the update. If the upload fails the update is never sent.

use async_trait::async_trait;
use mentorlink_api::{ImageUpload, Profile, ProfileUpdate, ServiceApi};
use mentorlink_core::{
    log_operation_error, log_operation_start, log_operation_success, performance, MentorlinkError,
    MentorlinkResult,
};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::{FeatureSource, FeatureState, GatedFeature};
use crate::notice::NoticeBoard;
use crate::store::SessionContext;
use crate::{unpoison, InFlight, SessionError, SessionResult};

pub struct ProfileSource {
    api: Arc<dyn ServiceApi>,
}

impl ProfileSource {
    pub fn new(api: Arc<dyn ServiceApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl FeatureSource for ProfileSource {
    type Content = Profile;

    fn name(&self) -> &'static str {
        "profile"
    }

    async fn fetch(&self, token: &str) -> MentorlinkResult<Option<Profile>> {
        self.api.get_profile(token).await.map(Some)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// Update accepted; carries the re-fetched profile when it could be loaded
    Saved(Option<Profile>),
    /// Image upload failed, no update was sent and the draft is kept
    UploadFailed(String),
    /// Update rejected, the draft is kept
    UpdateFailed(String),
    /// Draft did not pass local checks
    Invalid(String),
}

pub struct ProfileEditor {
    feature: GatedFeature<ProfileSource>,
    api: Arc<dyn ServiceApi>,
    session: SessionContext,
    notices: NoticeBoard,
    draft: Mutex<Option<ProfileUpdate>>,
    saving: AtomicBool,
}

impl ProfileEditor {
    pub fn new(api: Arc<dyn ServiceApi>, session: SessionContext, notices: NoticeBoard) -> Self {
        let feature = GatedFeature::new(
            ProfileSource::new(Arc::clone(&api)),
            session.clone(),
            notices.clone(),
        );
        Self {
            feature,
            api,
            session,
            notices,
            draft: Mutex::new(None),
            saving: AtomicBool::new(false),
        }
    }

    pub fn feature(&self) -> &GatedFeature<ProfileSource> {
        &self.feature
    }

    pub async fn mount(&self) -> FeatureState<Profile> {
        self.feature.mount().await
    }

    pub fn unmount(&self) {
        self.cancel_edit();
        self.feature.unmount();
    }

    pub fn profile(&self) -> Option<Profile> {
        self.feature.state().content().cloned()
    }

    pub fn is_editing(&self) -> bool {
        unpoison(self.draft.lock()).is_some()
    }

    pub fn draft(&self) -> Option<ProfileUpdate> {
        unpoison(self.draft.lock()).clone()
    }

    /// Start editing from the loaded profile
    pub fn begin_edit(&self) -> SessionResult<ProfileUpdate> {
        let profile = self
            .profile()
            .ok_or_else(|| SessionError::invalid_state("Profile is not loaded"))?;
        let draft = ProfileUpdate::from(&profile);
        *unpoison(self.draft.lock()) = Some(draft.clone());
        Ok(draft)
    }

    pub fn edit<F>(&self, apply: F) -> SessionResult<()>
    where
        F: FnOnce(&mut ProfileUpdate),
    {
        let mut draft = unpoison(self.draft.lock());
        let draft = draft
            .as_mut()
            .ok_or_else(|| SessionError::invalid_state("Not editing"))?;
        apply(draft);
        Ok(())
    }

    pub fn cancel_edit(&self) {
        *unpoison(self.draft.lock()) = None;
    }

    /// Upload `image` if given, then send the draft
    pub async fn save(&self, image: Option<ImageUpload>) -> SessionResult<SaveOutcome> {
        let _guard = InFlight::acquire(&self.saving).ok_or(SessionError::Busy)?;
        self.save_inner(image).await
    }

    async fn save_inner(&self, image: Option<ImageUpload>) -> SessionResult<SaveOutcome> {
        self.notices.clear();

        let token = self.session.token().ok_or(SessionError::NotAuthenticated)?;
        let mut update = self
            .draft()
            .ok_or_else(|| SessionError::invalid_state("Not editing"))?;

        if update.name.trim().is_empty() {
            let message = "Name is required.".to_string();
            self.notices.show_error(message.clone());
            return Ok(SaveOutcome::Invalid(message));
        }

        log_operation_start!("save_profile", with_image = image.is_some());

        if let Some(image) = image {
            let uploaded = performance::measure_async(
                "upload_image",
                self.api.upload_image(&token, &image),
            )
            .await;

            match uploaded {
                Ok(response) => {
                    debug!(image_url = %response.image_url, "Image uploaded");
                    update.profile_image = Some(response.image_url);
                    // Keep the URL so a retry after a failed update skips the upload
                    if self
                        .edit(|draft| draft.profile_image = update.profile_image.clone())
                        .is_err()
                    {
                        debug!("Edit was cancelled during upload");
                    }
                }
                Err(e) => {
                    log_operation_error!("save_profile", e, phase = "upload");
                    let message = self.surface_failure(e, &token);
                    return Ok(SaveOutcome::UploadFailed(message));
                }
            }
        }

        let updated = performance::measure_async(
            "update_profile",
            self.api.update_profile(&token, &update),
        )
        .await;

        if let Err(e) = updated {
            log_operation_error!("save_profile", e, phase = "update");
            let message = self.surface_failure(e, &token);
            return Ok(SaveOutcome::UpdateFailed(message));
        }

        self.cancel_edit();
        log_operation_success!("save_profile");

        // Show what the server stored rather than the local draft
        let refreshed = self.feature.refresh().await;
        // A failed re-fetch leaves its own notice in place
        if refreshed.is_active() || self.notices.current().is_none() {
            self.notices.show_success("Profile updated successfully.");
        }
        Ok(SaveOutcome::Saved(refreshed.content().cloned()))
    }

    /// Show the server's message verbatim; a rejected token also signs out
    fn surface_failure(&self, error: MentorlinkError, token: &str) -> String {
        if error.is_authorization_failure() {
            self.session.invalidate("profile", token);
        }
        let message = error.user_message();
        self.notices.show_error(message.clone());
        message
    }
}
