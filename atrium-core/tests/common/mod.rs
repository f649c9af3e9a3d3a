//! Shared mocks for integration tests
//!
//! This module is shared across the test files using the tests/common/
//! pattern. The mocks record every backend call so tests can assert on
//! ordering and on calls that must *not* happen; gates (zero-permit
//! semaphores) let a test hold a response in flight while it pokes the
//! component from the outside.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use atrium_core::api::billing::{BillingApi, UserProfile};
use atrium_core::api::console::{
    AppRecord, CatalogOverview, ConsoleApi, ExplorePage, ExploreQuery, ImportRequest, ImportedApp,
    InstalledApp, ModelVariant, RegisterRecord, TagPage, TagQuery, Workspace,
};
use atrium_core::api::ApiError;
use atrium_core::app::{AppMode, AppRoute, WorkspaceRole};
use atrium_core::catalog::{AppIcon, CatalogEntry, EntrySource};
use atrium_core::cloning::{CloneObserver, ClonedApp, DependencyResolver, Navigator};
use atrium_core::ledger::UsageEvent;
use atrium_core::notify::Notifier;
use atrium_core::publish::EditorHooks;

pub fn entry(id: &str, mode: AppMode, position: i64) -> CatalogEntry {
    CatalogEntry {
        id: id.to_string(),
        name: format!("app {id}"),
        mode,
        description: None,
        icon: AppIcon::default(),
        author_name: None,
        source: EntrySource::Community,
        position,
    }
}

fn boom(endpoint: &str) -> ApiError {
    ApiError::Status {
        endpoint: endpoint.to_string(),
        status: 500,
        body: "boom".to_string(),
    }
}

async fn wait_for_gate(gate: &Mutex<Option<Arc<Semaphore>>>) {
    let gate = gate.lock().unwrap().clone();
    if let Some(gate) = gate {
        let _permit = gate.acquire().await.unwrap();
    }
}

/// Recording console backend with configurable responses
pub struct MockConsoleApi {
    pub calls: Mutex<Vec<String>>,

    /// Total item count the explore source reports
    pub explore_total: u64,
    /// Number of favorite pages before `has_more` turns false
    pub favorite_pages: u32,

    pub record: Mutex<Option<AppRecord>>,
    pub fail_register: AtomicBool,
    pub fail_publish: AtomicBool,
    pub fail_import: AtomicBool,

    /// Mode the import endpoint resolves for created apps
    pub import_mode: Mutex<AppMode>,
    pub last_import: Mutex<Option<ImportRequest>>,

    pub installed: Mutex<Vec<InstalledApp>>,
    pub workspace_role: Mutex<WorkspaceRole>,

    /// When set, `publish_app` / `explore_apps` block until a permit is
    /// added
    pub publish_gate: Mutex<Option<Arc<Semaphore>>>,
    pub explore_gate: Mutex<Option<Arc<Semaphore>>>,

    pub clone_counter: AtomicUsize,
}

impl Default for MockConsoleApi {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            explore_total: 0,
            favorite_pages: 0,
            record: Mutex::new(None),
            fail_register: AtomicBool::new(false),
            fail_publish: AtomicBool::new(false),
            fail_import: AtomicBool::new(false),
            import_mode: Mutex::new(AppMode::Chat),
            last_import: Mutex::new(None),
            installed: Mutex::new(Vec::new()),
            workspace_role: Mutex::new(WorkspaceRole::Editor),
            publish_gate: Mutex::new(None),
            explore_gate: Mutex::new(None),
            clone_counter: AtomicUsize::new(0),
        }
    }
}

impl MockConsoleApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl ConsoleApi for MockConsoleApi {
    async fn publish_app(
        &self,
        app_id: &str,
        _variant: Option<&ModelVariant>,
    ) -> Result<(), ApiError> {
        self.log(format!("publish:{app_id}"));
        wait_for_gate(&self.publish_gate).await;
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(boom("/publish"));
        }
        Ok(())
    }

    async fn register_catalog_record(&self, record: &RegisterRecord) -> Result<(), ApiError> {
        self.log(format!("register:{}", record.app_id));
        if self.fail_register.load(Ordering::SeqCst) {
            return Err(boom("/explore/apps"));
        }
        Ok(())
    }

    async fn deregister_catalog_record(&self, app_id: &str) -> Result<(), ApiError> {
        self.log(format!("deregister:{app_id}"));
        if self.fail_register.load(Ordering::SeqCst) {
            return Err(boom("/explore/apps"));
        }
        Ok(())
    }

    async fn catalog_record(&self, app_id: &str) -> Result<Option<AppRecord>, ApiError> {
        self.log(format!("record:{app_id}"));
        Ok(self.record.lock().unwrap().clone())
    }

    async fn explore_apps(&self, query: &ExploreQuery) -> Result<ExplorePage, ApiError> {
        self.log(format!(
            "explore:p{}:{}:{}",
            query.page, query.category, query.name
        ));
        wait_for_gate(&self.explore_gate).await;

        let limit = u64::from(query.limit);
        let start = u64::from(query.page - 1) * limit;
        let count = limit.min(self.explore_total.saturating_sub(start));
        let data = (0..count)
            .map(|i| entry(&format!("exp-{}-{i}", query.page), AppMode::Chat, 0))
            .collect();

        Ok(ExplorePage {
            data,
            total: self.explore_total,
            limit,
        })
    }

    async fn apps_by_tag(&self, query: &TagQuery) -> Result<TagPage, ApiError> {
        self.log(format!("tag:p{}:{}", query.page, query.name));

        let data = if query.page <= self.favorite_pages {
            (0..query.limit)
                .map(|i| entry(&format!("fav-{}-{i}", query.page), AppMode::Chat, 0))
                .collect()
        } else {
            Vec::new()
        };

        Ok(TagPage {
            data,
            has_more: query.page < self.favorite_pages,
        })
    }

    async fn catalog_overview(&self) -> Result<CatalogOverview, ApiError> {
        self.log("overview".to_string());
        Ok(CatalogOverview {
            categories: Vec::new(),
            recommended: Vec::new(),
            community: Vec::new(),
        })
    }

    async fn import_app(&self, request: &ImportRequest) -> Result<ImportedApp, ApiError> {
        self.log(format!("import:{}", request.name));
        *self.last_import.lock().unwrap() = Some(request.clone());
        if self.fail_import.load(Ordering::SeqCst) {
            return Err(boom("/apps/imports"));
        }

        let n = self.clone_counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ImportedApp {
            app_id: format!("cloned-{n}"),
            mode: *self.import_mode.lock().unwrap(),
        })
    }

    async fn installed_apps(&self, app_id: Option<&str>) -> Result<Vec<InstalledApp>, ApiError> {
        self.log(format!("installed:{}", app_id.unwrap_or("*")));
        let installed = self.installed.lock().unwrap();
        Ok(installed
            .iter()
            .filter(|app| app_id.map_or(true, |id| app.app_id == id))
            .cloned()
            .collect())
    }

    async fn uninstall_app(&self, installed_app_id: &str) -> Result<(), ApiError> {
        self.log(format!("uninstall:{installed_app_id}"));
        Ok(())
    }

    async fn set_pin_status(&self, installed_app_id: &str, pinned: bool) -> Result<(), ApiError> {
        self.log(format!("pin:{installed_app_id}:{pinned}"));
        Ok(())
    }

    async fn current_workspace(&self) -> Result<Workspace, ApiError> {
        self.log("workspace".to_string());
        Ok(Workspace {
            id: "ws-1".to_string(),
            name: "test workspace".to_string(),
            role: *self.workspace_role.lock().unwrap(),
        })
    }
}

pub fn profile(subscription: f64, extra: f64, purchased: f64) -> UserProfile {
    UserProfile {
        id: "user-1".to_string(),
        name: "Tester".to_string(),
        email: "tester@example.com".to_string(),
        role: None,
        level: None,
        subscription_credits: subscription,
        extra_credits: extra,
        subscription_purchased_credits: purchased,
    }
}

/// Recording billing backend
pub struct MockBillingApi {
    pub calls: Mutex<Vec<String>>,
    pub cost: Mutex<f64>,
    pub fail: AtomicBool,
    pub profile: Mutex<UserProfile>,
}

impl Default for MockBillingApi {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            cost: Mutex::new(0.0),
            fail: AtomicBool::new(false),
            profile: Mutex::new(profile(0.0, 0.0, 0.0)),
        }
    }
}

impl MockBillingApi {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BillingApi for MockBillingApi {
    async fn usage_cost(&self, event: &UsageEvent) -> Result<f64, ApiError> {
        self.calls.lock().unwrap().push(event.kind().to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(boom("/pricing"));
        }
        Ok(*self.cost.lock().unwrap())
    }

    async fn fetch_profile(&self) -> Result<UserProfile, ApiError> {
        self.calls.lock().unwrap().push("profile".to_string());
        Ok(self.profile.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    pub routes: Mutex<Vec<AppRoute>>,
}

impl Navigator for RecordingNavigator {
    fn open(&self, route: &AppRoute) {
        self.routes.lock().unwrap().push(route.clone());
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub successes: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.successes.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

#[derive(Default)]
pub struct RecordingResolver {
    pub resolved: Mutex<Vec<String>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl DependencyResolver for RecordingResolver {
    async fn resolve(&self, app_id: &str) -> anyhow::Result<()> {
        self.resolved.lock().unwrap().push(app_id.to_string());
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("resolver unavailable");
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingHooks {
    pub restores: AtomicUsize,
    pub fail: AtomicBool,
}

#[async_trait]
impl EditorHooks for RecordingHooks {
    async fn restore_draft(&self) -> anyhow::Result<()> {
        self.restores.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("draft store unavailable");
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    pub cloned: Mutex<Vec<ClonedApp>>,
}

impl CloneObserver for RecordingObserver {
    fn on_cloned(&self, app: &ClonedApp) {
        self.cloned.lock().unwrap().push(app.clone());
    }
}
