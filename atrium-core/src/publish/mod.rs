//! Publish lifecycle - committing a draft and its catalog visibility
//!
//! The publisher owns the lifecycle of one app's publish control: the
//! `Unpublished → Draft → Published` progression derived from the
//! draft/publish timestamp pair, the transient `Publishing`/`Restoring`
//! states, and the orthogonal `posted` visibility sub-state that decides
//! whether the app appears in the shared catalog.
//!
//! Visibility and publish commit together: toggling `posted` only stages
//! the change, and the next `publish()` registers or deregisters the
//! catalog record *before* the publish call. The backend catalog record is
//! the source of truth for visibility; `open()` reconciles against it and
//! never trusts client memory.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::console::{ConsoleApi, ModelVariant, RegisterRecord};
use crate::api::ApiError;
use crate::app::{AppMode, AppRoute};
use crate::notify::Notifier;

/// An application under edit, as the publish control sees it
#[derive(Debug, Clone)]
pub struct AppDraft {
    pub id: String,
    pub mode: AppMode,
    pub description: Option<String>,

    /// When the draft was last committed as the live version
    pub published_at: Option<DateTime<Utc>>,
    pub draft_updated_at: DateTime<Utc>,
}

/// Lifecycle state of the publish control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// No successful publish yet
    Unpublished,
    /// A prior publish exists and the draft has since changed
    Draft,
    /// The current draft matches the last publish
    Published,
    /// A publish request is in flight
    Publishing,
    /// A restore is in flight
    Restoring,
}

/// What a `publish()` call amounted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Published,
    /// Another publish was already in flight; no network call was issued
    AlreadyInFlight,
}

/// Publish failures, split so callers can tell validation from network
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("publishing is disabled for this app")]
    Disabled,

    /// Step (1) failed; no publish call was made and the staged visibility
    /// toggle is left pending for the next attempt
    #[error("catalog registration failed")]
    Registration(#[source] ApiError),

    /// Step (2) failed after any visibility change had been committed
    #[error("publish request failed")]
    Publish(#[source] ApiError),

    /// No installed instance of the app exists in the catalog
    #[error("no installed instance of this app was found in the catalog")]
    NotInstalled,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// The draft editor's side of the publish control
///
/// The editor owns the draft content; the publisher only drives it.
#[async_trait]
pub trait EditorHooks: Send + Sync {
    /// Roll the draft back to the last published snapshot
    async fn restore_draft(&self) -> anyhow::Result<()>;
}

struct PublisherState {
    draft: AppDraft,
    open: bool,
    restoring: bool,
    just_published: bool,
    /// Staged visibility
    posted: bool,
    /// Last visibility the backend acknowledged
    synced_posted: bool,
}

/// Publish lifecycle state machine for one app
pub struct Publisher {
    api: Arc<dyn ConsoleApi>,
    hooks: Arc<dyn EditorHooks>,
    notifier: Arc<dyn Notifier>,
    publish_disabled: bool,
    state: Mutex<PublisherState>,
    publishing: AtomicBool,
}

impl Publisher {
    pub fn new(
        api: Arc<dyn ConsoleApi>,
        draft: AppDraft,
        hooks: Arc<dyn EditorHooks>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            hooks,
            notifier,
            publish_disabled: false,
            state: Mutex::new(PublisherState {
                draft,
                open: false,
                restoring: false,
                just_published: false,
                posted: false,
                synced_posted: false,
            }),
            publishing: AtomicBool::new(false),
        }
    }

    /// Disable publishing for callers without the permission
    pub fn with_publish_disabled(mut self, disabled: bool) -> Self {
        self.publish_disabled = disabled;
        self
    }

    pub fn lifecycle(&self) -> LifecycleState {
        if self.publishing.load(Ordering::SeqCst) {
            return LifecycleState::Publishing;
        }
        let state = self.state.lock().unwrap();
        if state.restoring {
            return LifecycleState::Restoring;
        }
        derive_lifecycle(state.draft.published_at, state.draft.draft_updated_at)
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().unwrap().open
    }

    pub fn posted(&self) -> bool {
        self.state.lock().unwrap().posted
    }

    pub fn just_published(&self) -> bool {
        self.state.lock().unwrap().just_published
    }

    /// Open the control
    ///
    /// Clears the just-published flag and reconciles visibility with a
    /// catalog read: a record's presence *is* the visibility. A failed
    /// probe falls back to not-posted rather than surfacing an error.
    pub async fn open(&self) {
        let app_id = {
            let mut state = self.state.lock().unwrap();
            state.open = true;
            state.just_published = false;
            state.draft.id.clone()
        };

        let posted = match self.api.catalog_record(&app_id).await {
            Ok(record) => record.is_some(),
            Err(err) => {
                warn!("visibility probe failed for {app_id}: {err}");
                false
            }
        };

        let mut state = self.state.lock().unwrap();
        state.posted = posted;
        state.synced_posted = posted;
        debug!(app_id = %state.draft.id, posted, "visibility reconciled");
    }

    /// Close the control; disallowed while a publish is in flight
    pub fn close(&self) {
        if self.publishing.load(Ordering::SeqCst) {
            return;
        }
        self.state.lock().unwrap().open = false;
    }

    /// Stage a visibility change; it commits with the next `publish()`
    pub fn set_posted(&self, posted: bool) {
        let mut state = self.state.lock().unwrap();
        state.posted = posted;
        state.just_published = false;
    }

    /// The editor reports a draft change
    pub fn mark_draft_updated(&self) {
        self.state.lock().unwrap().draft.draft_updated_at = Utc::now();
    }

    /// Commit the draft, registering/deregistering the catalog record first
    /// when the staged visibility differs from the backend's
    ///
    /// Concurrent calls while one is in flight are an idempotent no-op: the
    /// two steps are not atomic across the network, and a second publish
    /// could interleave registration states.
    pub async fn publish(
        &self,
        variant: Option<ModelVariant>,
    ) -> Result<PublishOutcome, PublishError> {
        if self.publish_disabled {
            return Err(PublishError::Disabled);
        }
        if self
            .publishing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("publish already in flight; ignoring");
            return Ok(PublishOutcome::AlreadyInFlight);
        }
        let _publishing = PublishingGuard(&self.publishing);

        let (app_id, posted, synced_posted, description, category) = {
            let state = self.state.lock().unwrap();
            (
                state.draft.id.clone(),
                state.posted,
                state.synced_posted,
                state.draft.description.clone(),
                state.draft.mode.catalog_category().to_string(),
            )
        };

        if posted != synced_posted {
            let step = if posted {
                self.api
                    .register_catalog_record(&RegisterRecord {
                        app_id: app_id.clone(),
                        description,
                        category,
                    })
                    .await
            } else {
                self.api.deregister_catalog_record(&app_id).await
            };

            if let Err(err) = step {
                warn!("catalog registration failed for {app_id}: {err}");
                return Err(PublishError::Registration(err));
            }
            self.state.lock().unwrap().synced_posted = posted;
        }

        match self.api.publish_app(&app_id, variant.as_ref()).await {
            Ok(()) => {
                let mut state = self.state.lock().unwrap();
                state.draft.published_at = Some(Utc::now());
                state.just_published = true;
                info!(app_id = %state.draft.id, posted, "draft published");
                Ok(PublishOutcome::Published)
            }
            Err(err) => {
                self.state.lock().unwrap().just_published = false;
                warn!("publish failed for {app_id}: {err}");
                Err(PublishError::Publish(err))
            }
        }
    }

    /// Roll the draft back to the last published snapshot
    ///
    /// Success closes the control. Failure is surfaced through the notifier
    /// and leaves the lifecycle untouched.
    pub async fn restore(&self) {
        {
            let mut state = self.state.lock().unwrap();
            if state.restoring {
                return;
            }
            state.restoring = true;
        }

        match self.hooks.restore_draft().await {
            Ok(()) => {
                let mut state = self.state.lock().unwrap();
                state.restoring = false;
                state.open = false;
                // the draft now matches the published snapshot
                if let Some(published_at) = state.draft.published_at {
                    state.draft.draft_updated_at = published_at;
                }
            }
            Err(err) => {
                warn!("restore failed: {err:#}");
                self.notifier.error("Failed to restore the published version");
                self.state.lock().unwrap().restoring = false;
            }
        }
    }

    /// Locate the installed instance of this app in the catalog
    ///
    /// A missing installation is a validation failure, distinct from the
    /// probe itself failing.
    pub async fn open_in_catalog(&self) -> Result<AppRoute, PublishError> {
        let app_id = self.state.lock().unwrap().draft.id.clone();
        let installed = self.api.installed_apps(Some(&app_id)).await?;

        match installed.first() {
            Some(installed_app) => Ok(AppRoute::InstalledApp {
                installed_app_id: installed_app.id.clone(),
            }),
            None => Err(PublishError::NotInstalled),
        }
    }
}

fn derive_lifecycle(
    published_at: Option<DateTime<Utc>>,
    draft_updated_at: DateTime<Utc>,
) -> LifecycleState {
    match published_at {
        None => LifecycleState::Unpublished,
        Some(published_at) if published_at >= draft_updated_at => LifecycleState::Published,
        Some(_) => LifecycleState::Draft,
    }
}

struct PublishingGuard<'a>(&'a AtomicBool);

impl Drop for PublishingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
