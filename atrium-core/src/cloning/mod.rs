//! App-cloning pipeline - catalog entry to owned workspace app
//!
//! Three stages, strictly sequential per invocation: fetch the exported
//! definition, import it under a new identity with caller-supplied
//! metadata, then run the post-clone steps (success hook, best-effort
//! dependency resolution for workflow apps, raise the catalog refresh
//! signal, navigate to the new app's editor).
//!
//! Stage failures are total failures of the invocation; no partial clone is
//! ever visible. The one exception is dependency resolution, which is the
//! resolver's responsibility and never re-surfaces as a clone failure.
//! Cloning is not deduplicated by source id: re-running the pipeline always
//! creates a new distinct app.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::console::{ConsoleApi, ImportKind, ImportRequest};
use crate::api::ApiError;
use crate::app::{editor_route, AppMode, AppRoute};
use crate::catalog::{AppIcon, RefreshSignal};

/// Plugin-dependency resolver, invoked after cloning a workflow app
///
/// Treated as a black box: it either succeeds or fails for a given app id,
/// and its failures are its own to report.
#[async_trait]
pub trait DependencyResolver: Send + Sync {
    async fn resolve(&self, app_id: &str) -> anyhow::Result<()>;
}

/// Route navigation collaborator
pub trait Navigator: Send + Sync {
    fn open(&self, route: &AppRoute);
}

/// Observer invoked after a clone succeeds, before navigation (e.g. a list
/// refresh)
pub trait CloneObserver: Send + Sync {
    fn on_cloned(&self, app: &ClonedApp);
}

/// Caller input for one clone
#[derive(Debug, Clone)]
pub struct CloneRequest {
    pub source_app_id: String,
    pub name: String,
    pub icon: AppIcon,
    pub description: Option<String>,
}

/// The app a successful clone produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClonedApp {
    pub app_id: String,
    pub mode: AppMode,
}

/// Clone failures
///
/// `CreationFailed` is deliberately generic: backend internals from the
/// import endpoint are logged, not shown.
#[derive(Debug, Error)]
pub enum CloneError {
    #[error("app is not available in the catalog")]
    SourceUnavailable,

    #[error("failed to fetch the app definition")]
    Fetch(#[source] ApiError),

    #[error("app creation failed")]
    CreationFailed,
}

/// The app-cloning pipeline
pub struct ClonePipeline {
    api: Arc<dyn ConsoleApi>,
    resolver: Arc<dyn DependencyResolver>,
    navigator: Arc<dyn Navigator>,
    refresh: RefreshSignal,
    observer: Option<Arc<dyn CloneObserver>>,
}

impl ClonePipeline {
    pub fn new(
        api: Arc<dyn ConsoleApi>,
        resolver: Arc<dyn DependencyResolver>,
        navigator: Arc<dyn Navigator>,
        refresh: RefreshSignal,
    ) -> Self {
        Self {
            api,
            resolver,
            navigator,
            refresh,
            observer: None,
        }
    }

    /// Register a success observer
    pub fn with_observer(mut self, observer: Arc<dyn CloneObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Run the pipeline for one catalog entry
    ///
    /// `can_edit` is the caller's edit permission in the target workspace;
    /// it selects the destination route.
    pub async fn clone_app(
        &self,
        request: CloneRequest,
        can_edit: bool,
    ) -> Result<ClonedApp, CloneError> {
        // Stage 1: fetch the exported definition
        let record = self
            .api
            .catalog_record(&request.source_app_id)
            .await
            .map_err(CloneError::Fetch)?
            .ok_or(CloneError::SourceUnavailable)?;

        // Stage 2: import it under a new identity
        let import = ImportRequest {
            mode: ImportKind::YamlContent,
            yaml_content: record.export_data,
            name: request.name,
            icon_type: request.icon.icon_type,
            icon: request.icon.icon,
            icon_background: request.icon.icon_background,
            description: request.description,
        };

        let created = match self.api.import_app(&import).await {
            Ok(created) => created,
            Err(err) => {
                warn!("import failed for {}: {err}", request.source_app_id);
                return Err(CloneError::CreationFailed);
            }
        };

        let cloned = ClonedApp {
            app_id: created.app_id,
            mode: created.mode,
        };
        info!(
            source = %request.source_app_id,
            app_id = %cloned.app_id,
            mode = %cloned.mode,
            "app cloned"
        );

        // Stage 3: post-clone
        if let Some(observer) = &self.observer {
            observer.on_cloned(&cloned);
        }

        if cloned.mode == AppMode::Workflow {
            // best-effort; the resolver owns its failures
            if let Err(err) = self.resolver.resolve(&cloned.app_id).await {
                warn!("dependency resolution failed for {}: {err:#}", cloned.app_id);
            }
        }

        self.refresh.raise();
        self.navigator
            .open(&editor_route(can_edit, cloned.mode, &cloned.app_id));

        Ok(cloned)
    }
}
