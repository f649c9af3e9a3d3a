//! Console API - the workspace backend
//!
//! Publish, catalog registration and listing, app imports, installed apps,
//! and the current-workspace read. The trait keeps the components testable;
//! [`HttpConsoleApi`] is the production implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ensure_success, http_client, normalize_base_url, ApiError};
use crate::app::{AppMode, WorkspaceRole};
use crate::catalog::CatalogEntry;
use crate::session::SessionProvider;

/// A model variant attached to a publish request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVariant {
    pub provider: String,
    pub model: String,

    /// Provider-specific parameters, passed through opaquely
    #[serde(default)]
    pub parameters: serde_json::Value,
}

/// Registration payload for the shared catalog
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRecord {
    pub app_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Catalog category, derived from the app mode
    pub category: String,
}

/// The catalog's record of a published app
///
/// Presence of this record is what makes an app visible in the catalog; the
/// same read supplies the exported definition the cloning pipeline imports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppRecord {
    pub app_id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    pub mode: AppMode,

    /// Serialized application manifest
    pub export_data: String,
}

/// Query for one page of the explore source
#[derive(Debug, Clone)]
pub struct ExploreQuery {
    /// 1-based page number as the server counts pages
    pub page: u32,
    pub limit: u32,
    /// Category filter: `recommended` or a concrete app mode
    pub category: String,
    pub name: String,
}

/// One page from the explore source
#[derive(Debug, Clone, Deserialize)]
pub struct ExplorePage {
    pub data: Vec<CatalogEntry>,
    pub total: u64,
    pub limit: u64,
}

/// Query for one page of the tag-bound (favorites) source
#[derive(Debug, Clone)]
pub struct TagQuery {
    /// 1-based page number as the server counts pages
    pub page: u32,
    pub limit: u32,
    pub name: String,
    pub tag_ids: Vec<String>,
}

/// One page from the tag-bound source
#[derive(Debug, Clone, Deserialize)]
pub struct TagPage {
    pub data: Vec<CatalogEntry>,
    pub has_more: bool,
}

/// The unpaged catalog overview: category names plus the recommended and
/// community listings
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogOverview {
    #[serde(default)]
    pub categories: Vec<String>,

    #[serde(default, rename = "recommended_apps")]
    pub recommended: Vec<CatalogEntry>,

    #[serde(default)]
    pub community: Vec<CatalogEntry>,
}

impl CatalogOverview {
    /// Community and recommended entries as one listing, ordered by the
    /// source-defined position key
    pub fn merged(&self) -> Vec<CatalogEntry> {
        let mut merged: Vec<CatalogEntry> = self
            .community
            .iter()
            .chain(self.recommended.iter())
            .cloned()
            .collect();
        merged.sort_by_key(|entry| entry.position);
        merged
    }
}

/// Import kind accepted by the create-from-definition endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportKind {
    YamlContent,
}

/// Create-from-definition request
#[derive(Debug, Clone, Serialize)]
pub struct ImportRequest {
    pub mode: ImportKind,
    /// The serialized manifest being imported
    pub yaml_content: String,
    pub name: String,
    pub icon_type: String,
    pub icon: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_background: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Identity handed back by a successful import
#[derive(Debug, Clone, Deserialize)]
pub struct ImportedApp {
    pub app_id: String,
    pub mode: AppMode,
}

/// A workspace-local installation of a published app
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstalledApp {
    pub id: String,
    pub app_id: String,

    #[serde(default)]
    pub is_pinned: bool,
}

/// The workspace the current actor operates in
#[derive(Debug, Clone, Deserialize)]
pub struct Workspace {
    pub id: String,

    #[serde(default)]
    pub name: String,

    pub role: WorkspaceRole,
}

/// The workspace console backend
#[async_trait]
pub trait ConsoleApi: Send + Sync {
    /// Commit the draft as the live version, optionally pinning a model
    /// variant
    async fn publish_app(
        &self,
        app_id: &str,
        variant: Option<&ModelVariant>,
    ) -> Result<(), ApiError>;

    /// Register the app with the shared catalog (makes it visible)
    async fn register_catalog_record(&self, record: &RegisterRecord) -> Result<(), ApiError>;

    /// Remove the app's catalog record (makes it invisible)
    async fn deregister_catalog_record(&self, app_id: &str) -> Result<(), ApiError>;

    /// Fetch the catalog record for an app; `None` means not visible
    async fn catalog_record(&self, app_id: &str) -> Result<Option<AppRecord>, ApiError>;

    /// One page of the explore source
    async fn explore_apps(&self, query: &ExploreQuery) -> Result<ExplorePage, ApiError>;

    /// One page of the tag-bound (favorites) source
    async fn apps_by_tag(&self, query: &TagQuery) -> Result<TagPage, ApiError>;

    /// The unpaged catalog overview
    async fn catalog_overview(&self) -> Result<CatalogOverview, ApiError>;

    /// Create a new app from an exported definition
    async fn import_app(&self, request: &ImportRequest) -> Result<ImportedApp, ApiError>;

    /// Installed instances, optionally narrowed to one source app
    async fn installed_apps(&self, app_id: Option<&str>) -> Result<Vec<InstalledApp>, ApiError>;

    /// Remove an installed instance
    async fn uninstall_app(&self, installed_app_id: &str) -> Result<(), ApiError>;

    /// Pin or unpin an installed instance
    async fn set_pin_status(&self, installed_app_id: &str, pinned: bool) -> Result<(), ApiError>;

    /// The current workspace and the actor's role in it
    async fn current_workspace(&self) -> Result<Workspace, ApiError>;
}

/// HTTP implementation of [`ConsoleApi`]
pub struct HttpConsoleApi {
    client: reqwest::Client,
    base_url: String,
    session: Arc<dyn SessionProvider>,
}

impl HttpConsoleApi {
    pub fn new(
        base_url: impl Into<String>,
        session: Arc<dyn SessionProvider>,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            client: http_client()?,
            base_url: normalize_base_url(base_url),
            session,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let token = self.session.bearer_token().await?;
        let response = request.bearer_auth(token).send().await?;
        ensure_success(response).await
    }
}

#[derive(Debug, Deserialize)]
struct InstalledAppsEnvelope {
    #[serde(default)]
    installed_apps: Vec<InstalledApp>,
}

#[derive(Debug, Serialize)]
struct PinStatusBody {
    is_pinned: bool,
}

#[async_trait]
impl ConsoleApi for HttpConsoleApi {
    async fn publish_app(
        &self,
        app_id: &str,
        variant: Option<&ModelVariant>,
    ) -> Result<(), ApiError> {
        let request = self.client.post(self.url(&format!("/apps/{app_id}/publish")));
        let request = match variant {
            Some(variant) => request.json(variant),
            None => request.json(&serde_json::json!({})),
        };
        self.send(request).await?;
        Ok(())
    }

    async fn register_catalog_record(&self, record: &RegisterRecord) -> Result<(), ApiError> {
        let request = self.client.post(self.url("/explore/apps")).json(record);
        self.send(request).await?;
        Ok(())
    }

    async fn deregister_catalog_record(&self, app_id: &str) -> Result<(), ApiError> {
        let request = self.client.delete(self.url(&format!("/explore/apps/{app_id}")));
        self.send(request).await?;
        Ok(())
    }

    async fn catalog_record(&self, app_id: &str) -> Result<Option<AppRecord>, ApiError> {
        let token = self.session.bearer_token().await?;
        let response = self
            .client
            .get(self.url(&format!("/explore/apps/{app_id}")))
            .bearer_auth(token)
            .send()
            .await?;

        // Absence of the record is a regular answer, not a failure
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = ensure_success(response).await?;
        Ok(Some(response.json().await?))
    }

    async fn explore_apps(&self, query: &ExploreQuery) -> Result<ExplorePage, ApiError> {
        let request = self.client.get(self.url("/explore/apps")).query(&[
            ("page", query.page.to_string()),
            ("limit", query.limit.to_string()),
            ("mode", query.category.clone()),
            ("name", query.name.clone()),
        ]);
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    async fn apps_by_tag(&self, query: &TagQuery) -> Result<TagPage, ApiError> {
        let mut params = vec![
            ("page", query.page.to_string()),
            ("limit", query.limit.to_string()),
            ("name", query.name.clone()),
        ];
        for tag_id in &query.tag_ids {
            params.push(("tag_ids", tag_id.clone()));
        }
        let request = self.client.get(self.url("/apps")).query(&params);
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    async fn catalog_overview(&self) -> Result<CatalogOverview, ApiError> {
        let request = self.client.get(self.url("/explore/apps/overview"));
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    async fn import_app(&self, request_body: &ImportRequest) -> Result<ImportedApp, ApiError> {
        let request = self.client.post(self.url("/apps/imports")).json(request_body);
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    async fn installed_apps(&self, app_id: Option<&str>) -> Result<Vec<InstalledApp>, ApiError> {
        let mut request = self.client.get(self.url("/installed-apps"));
        if let Some(app_id) = app_id {
            request = request.query(&[("app_id", app_id)]);
        }
        let response = self.send(request).await?;
        let envelope: InstalledAppsEnvelope = response.json().await?;
        Ok(envelope.installed_apps)
    }

    async fn uninstall_app(&self, installed_app_id: &str) -> Result<(), ApiError> {
        let request = self
            .client
            .delete(self.url(&format!("/installed-apps/{installed_app_id}")));
        self.send(request).await?;
        Ok(())
    }

    async fn set_pin_status(&self, installed_app_id: &str, pinned: bool) -> Result<(), ApiError> {
        let request = self
            .client
            .patch(self.url(&format!("/installed-apps/{installed_app_id}")))
            .json(&PinStatusBody { is_pinned: pinned });
        self.send(request).await?;
        Ok(())
    }

    async fn current_workspace(&self) -> Result<Workspace, ApiError> {
        let request = self.client.get(self.url("/workspaces/current"));
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }
}
