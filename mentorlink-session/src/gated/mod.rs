//! Session-gated features
//!
//! A gated feature renders only while a valid session exists and the remote
//! service has content worth showing. [`GatedFeature`] drives the shared
//! lifecycle:
//!
//! ```text
//! Uninitialized -> (no session) -> Inactive(NoSession)
//! Uninitialized -> Loading -> Active(content)
//!                          -> Inactive(NoContent | Ineligible | SessionExpired | Failed)
//! any -> unmount -> Inactive(Unmounted)
//! ```
//!
//! Each mount or refresh takes a new generation number. A fetch that resolves
//! after a newer generation started, or after unmount, is discarded without
//! touching state, notices or the parent.

pub mod poster;
pub mod profile;

use async_trait::async_trait;
use mentorlink_core::{performance, MentorlinkError, MentorlinkResult};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

use crate::notice::NoticeBoard;
use crate::store::SessionContext;
use crate::unpoison;

/// Remote content behind a gated feature
#[async_trait]
pub trait FeatureSource: Send + Sync {
    type Content: Clone + Send + Sync + 'static;

    /// Stable name used in logs and footprint reports
    fn name(&self) -> &'static str;

    /// `Ok(None)` means the service has nothing to show
    async fn fetch(&self, token: &str) -> MentorlinkResult<Option<Self::Content>>;

    /// Local checks applied to fetched content before it is shown
    fn is_eligible(&self, _content: &Self::Content) -> bool {
        true
    }
}

/// Parent callback receiving the feature's rendered footprint
pub trait FootprintObserver: Send + Sync {
    fn footprint_changed(&self, feature: &str, footprint: u32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InactiveReason {
    NoSession,
    NoContent,
    Ineligible,
    Dismissed,
    SessionExpired,
    Failed,
    Unmounted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureState<C> {
    Uninitialized,
    Loading,
    Active(C),
    Inactive(InactiveReason),
}

impl<C> FeatureState<C> {
    pub fn is_active(&self) -> bool {
        matches!(self, FeatureState::Active(_))
    }

    pub fn content(&self) -> Option<&C> {
        match self {
            FeatureState::Active(content) => Some(content),
            _ => None,
        }
    }

    pub fn inactive_reason(&self) -> Option<InactiveReason> {
        match self {
            FeatureState::Inactive(reason) => Some(*reason),
            _ => None,
        }
    }
}

struct Lifecycle<C> {
    state: FeatureState<C>,
    generation: u64,
    mounted: bool,
    /// Last footprint reported to the observer
    footprint: Option<u32>,
}

enum Failure {
    /// Carries the token the rejected request was made with
    SessionExpired(String),
    Other(MentorlinkError),
}

pub struct GatedFeature<S: FeatureSource> {
    source: S,
    session: SessionContext,
    notices: NoticeBoard,
    observer: Option<Arc<dyn FootprintObserver>>,
    lifecycle: Mutex<Lifecycle<S::Content>>,
}

impl<S: FeatureSource> GatedFeature<S> {
    pub fn new(source: S, session: SessionContext, notices: NoticeBoard) -> Self {
        Self {
            source,
            session,
            notices,
            observer: None,
            lifecycle: Mutex::new(Lifecycle {
                state: FeatureState::Uninitialized,
                generation: 0,
                mounted: false,
                footprint: None,
            }),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn FootprintObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn state(&self) -> FeatureState<S::Content> {
        self.lock().state.clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.lock().mounted
    }

    fn lock(&self) -> MutexGuard<'_, Lifecycle<S::Content>> {
        unpoison(self.lifecycle.lock())
    }

    /// Start the lifecycle: check the session, fetch, and settle
    pub async fn mount(&self) -> FeatureState<S::Content> {
        let generation = {
            let mut lifecycle = self.lock();
            lifecycle.generation += 1;
            lifecycle.mounted = true;
            lifecycle.state = FeatureState::Uninitialized;
            lifecycle.generation
        };
        debug!(feature = self.source.name(), generation, "Mounted");
        self.load(generation).await
    }

    /// Re-run the session check and fetch while mounted
    pub async fn refresh(&self) -> FeatureState<S::Content> {
        let generation = {
            let mut lifecycle = self.lock();
            if !lifecycle.mounted {
                return lifecycle.state.clone();
            }
            lifecycle.generation += 1;
            lifecycle.generation
        };
        self.load(generation).await
    }

    /// Stop the lifecycle; in-flight results are dropped when they arrive
    pub fn unmount(&self) {
        let mut lifecycle = self.lock();
        lifecycle.generation += 1;
        lifecycle.mounted = false;
        lifecycle.state = FeatureState::Inactive(InactiveReason::Unmounted);
        debug!(feature = self.source.name(), "Unmounted");
    }

    /// Record the rendered size of active content
    pub fn report_footprint(&self, footprint: u32) {
        let mut lifecycle = self.lock();
        if !lifecycle.mounted || !lifecycle.state.is_active() {
            return;
        }
        self.notify_footprint(&mut lifecycle, footprint);
    }

    async fn load(&self, generation: u64) -> FeatureState<S::Content> {
        loop {
            let Some(session) = self.session.read() else {
                return self.settle(
                    generation,
                    FeatureState::Inactive(InactiveReason::NoSession),
                    None,
                );
            };

            {
                let mut lifecycle = self.lock();
                if !self.is_current(&lifecycle, generation) {
                    return lifecycle.state.clone();
                }
                lifecycle.state = FeatureState::Loading;
            }

            let result =
                performance::measure_async(self.source.name(), self.source.fetch(&session.token))
                    .await;

            // The answer belongs to a session that has since been replaced
            if self.session.token().as_deref() != Some(session.token.as_str()) {
                debug!(
                    feature = self.source.name(),
                    "Session changed during fetch, loading again"
                );
                continue;
            }

            let (next, failure) = match result {
                Ok(Some(content)) if self.source.is_eligible(&content) => {
                    (FeatureState::Active(content), None)
                }
                Ok(Some(_)) => (FeatureState::Inactive(InactiveReason::Ineligible), None),
                Ok(None) => (FeatureState::Inactive(InactiveReason::NoContent), None),
                Err(e) if e.is_no_content() => {
                    (FeatureState::Inactive(InactiveReason::NoContent), None)
                }
                Err(e) if e.is_authorization_failure() => (
                    FeatureState::Inactive(InactiveReason::SessionExpired),
                    Some(Failure::SessionExpired(session.token)),
                ),
                Err(e) => (
                    FeatureState::Inactive(InactiveReason::Failed),
                    Some(Failure::Other(e)),
                ),
            };

            return self.settle(generation, next, failure);
        }
    }

    fn is_current(&self, lifecycle: &Lifecycle<S::Content>, generation: u64) -> bool {
        lifecycle.mounted && lifecycle.generation == generation
    }

    /// Apply a result if it still belongs to the live generation
    fn settle(
        &self,
        generation: u64,
        next: FeatureState<S::Content>,
        failure: Option<Failure>,
    ) -> FeatureState<S::Content> {
        let mut lifecycle = self.lock();
        if !self.is_current(&lifecycle, generation) {
            debug!(
                feature = self.source.name(),
                generation, "Discarding stale result"
            );
            return lifecycle.state.clone();
        }

        lifecycle.state = next.clone();
        if !next.is_active() {
            self.notify_footprint(&mut lifecycle, 0);
        }
        drop(lifecycle);

        match failure {
            Some(Failure::SessionExpired(token)) => {
                if self.session.invalidate(self.source.name(), &token) {
                    self.notices
                        .show_error("Your session has expired. Please sign in again.");
                }
            }
            Some(Failure::Other(e)) => {
                e.log();
                self.notices.show_error(e.user_message());
            }
            None => {}
        }

        match &next {
            FeatureState::Active(_) => info!(feature = self.source.name(), "Feature active"),
            FeatureState::Inactive(reason) => {
                debug!(feature = self.source.name(), ?reason, "Feature inactive")
            }
            _ => {}
        }
        next
    }

    /// Move an active feature to inactive after a local action
    pub(crate) fn deactivate(&self, reason: InactiveReason) -> bool {
        let mut lifecycle = self.lock();
        if !lifecycle.mounted || !lifecycle.state.is_active() {
            return false;
        }
        lifecycle.state = FeatureState::Inactive(reason);
        self.notify_footprint(&mut lifecycle, 0);
        true
    }

    fn notify_footprint(&self, lifecycle: &mut Lifecycle<S::Content>, footprint: u32) {
        if lifecycle.footprint == Some(footprint) {
            return;
        }
        lifecycle.footprint = Some(footprint);
        if let Some(observer) = &self.observer {
            observer.footprint_changed(self.source.name(), footprint);
        }
    }
}
