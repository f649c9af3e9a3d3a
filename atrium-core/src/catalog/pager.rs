//! Dual-source catalog pager
//!
//! Presents the favorites source and the explore source as one logical,
//! infinitely scrolling catalog. The page-advance trigger (a visibility
//! sentinel in a UI, a loop in the CLI) calls [`CatalogPager::load_more`];
//! an in-flight latch makes duplicate triggers harmless and an epoch
//! counter cancels the *effect* of responses that arrive after the active
//! category or search term has changed.
//!
//! The favorites tag id is configuration, injected through [`PagerConfig`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::debug;

use super::{CatalogEntry, PageCursor, PAGE_SIZE};
use crate::api::console::{ConsoleApi, ExploreQuery, TagQuery};
use crate::api::ApiError;
use crate::app::AppMode;

/// Window after the last keystroke before a search term takes effect
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Explore-source filter: the default recommendation feed or one app mode
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExploreFilter {
    #[default]
    Recommended,
    Mode(AppMode),
}

impl ExploreFilter {
    /// Value of the `mode` query parameter
    pub fn as_query(&self) -> String {
        match self {
            ExploreFilter::Recommended => "recommended".to_string(),
            ExploreFilter::Mode(mode) => mode.as_str().to_string(),
        }
    }
}

/// Exclusive category selector
///
/// `Favorite` is the reserved value: it switches the whole pager to the
/// favorites source instead of filtering the explore source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Category {
    Favorite,
    Explore(ExploreFilter),
}

/// Pager configuration
#[derive(Debug, Clone)]
pub struct PagerConfig {
    /// Tag that marks an app as a favorite of the current workspace
    pub favorite_tag_id: String,
    pub page_size: u32,
}

impl PagerConfig {
    pub fn new(favorite_tag_id: impl Into<String>) -> Self {
        Self {
            favorite_tag_id: favorite_tag_id.into(),
            page_size: PAGE_SIZE,
        }
    }
}

/// What a `load_more` trigger amounted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page merged; the count of entries it appended
    Loaded(usize),
    /// The active source is terminal; no request was issued
    Exhausted,
    /// A page fetch is already in flight; no request was issued
    AlreadyLoading,
    /// The response belonged to an outdated category/search key and was
    /// dropped
    Superseded,
}

#[derive(Default)]
struct SourceState {
    cursor: PageCursor,
    pages: Vec<Vec<CatalogEntry>>,
}

impl SourceState {
    fn reset(&mut self) {
        self.cursor.reset();
        self.pages.clear();
    }

    fn entries(&self) -> Vec<CatalogEntry> {
        self.pages.iter().flatten().cloned().collect()
    }
}

struct PagerState {
    favorite_active: bool,
    /// Last explore filter; kept while the favorites source is active so
    /// switching back re-reveals the frozen explore cache
    explore_filter: ExploreFilter,
    staged_keywords: String,
    /// The committed term that actually drives requests
    keywords: String,
    /// Bumped on every category/search change; responses carrying an older
    /// epoch are dropped instead of merged
    epoch: u64,
    explore: SourceState,
    favorite: SourceState,
}

impl PagerState {
    fn active_source(&self) -> &SourceState {
        if self.favorite_active {
            &self.favorite
        } else {
            &self.explore
        }
    }
}

struct PagerInner {
    api: Arc<dyn ConsoleApi>,
    config: PagerConfig,
    state: Mutex<PagerState>,
    loading: AtomicBool,
    search_generation: AtomicU64,
}

/// Snapshot of the request key taken before the network call
struct PageRequest {
    epoch: u64,
    favorite: bool,
    category: String,
    keywords: String,
    page: u32,
}

/// The dual-source catalog pager
pub struct CatalogPager {
    inner: Arc<PagerInner>,
}

impl CatalogPager {
    pub fn new(api: Arc<dyn ConsoleApi>, config: PagerConfig) -> Self {
        Self {
            inner: Arc::new(PagerInner {
                api,
                config,
                state: Mutex::new(PagerState {
                    favorite_active: false,
                    explore_filter: ExploreFilter::default(),
                    staged_keywords: String::new(),
                    keywords: String::new(),
                    epoch: 0,
                    explore: SourceState::default(),
                    favorite: SourceState::default(),
                }),
                loading: AtomicBool::new(false),
                search_generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn category(&self) -> Category {
        let state = self.inner.state.lock().unwrap();
        if state.favorite_active {
            Category::Favorite
        } else {
            Category::Explore(state.explore_filter.clone())
        }
    }

    /// Switch the exclusive category selector
    ///
    /// Bumps the epoch so stale in-flight pages are dropped. The
    /// now-inactive source keeps its cache frozen; only moving between two
    /// different explore filters invalidates the explore cache, because
    /// those pages belong to a different query key.
    pub fn set_category(&self, category: Category) {
        let mut state = self.inner.state.lock().unwrap();
        match category {
            Category::Favorite => {
                if state.favorite_active {
                    return;
                }
                state.favorite_active = true;
                state.epoch += 1;
            }
            Category::Explore(filter) => {
                if !state.favorite_active && state.explore_filter == filter {
                    return;
                }
                if state.explore_filter != filter {
                    state.explore_filter = filter;
                    state.explore.reset();
                }
                state.favorite_active = false;
                state.epoch += 1;
            }
        }
    }

    /// Stage raw search input; the effective term updates after the
    /// debounce window (last keystroke wins, bursts coalesce into one
    /// page-0 request)
    pub fn input_keywords(&self, text: impl Into<String>) {
        let text = text.into();
        {
            let mut state = self.inner.state.lock().unwrap();
            state.staged_keywords = text.clone();
        }

        let generation = self.inner.search_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(SEARCH_DEBOUNCE).await;
            // a later keystroke supersedes this one
            if inner.search_generation.load(Ordering::SeqCst) != generation {
                return;
            }
            commit_keywords(&inner, &text);
        });
    }

    /// Commit a search term immediately, bypassing the debounce
    pub fn set_keywords(&self, text: impl Into<String>) {
        let text = text.into();
        self.inner.search_generation.fetch_add(1, Ordering::SeqCst);
        commit_keywords(&self.inner, &text);
    }

    /// The committed term driving requests
    pub fn keywords(&self) -> String {
        self.inner.state.lock().unwrap().keywords.clone()
    }

    pub fn staged_keywords(&self) -> String {
        self.inner.state.lock().unwrap().staged_keywords.clone()
    }

    /// The merged view: the active source's pages flattened in arrival
    /// order
    pub fn entries(&self) -> Vec<CatalogEntry> {
        self.inner.state.lock().unwrap().active_source().entries()
    }

    pub fn is_exhausted(&self) -> bool {
        self.inner
            .state
            .lock()
            .unwrap()
            .active_source()
            .cursor
            .is_exhausted()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.loading.load(Ordering::SeqCst)
    }

    /// The page-advance trigger
    ///
    /// At most one page fetch runs at a time; a trigger that fires while
    /// one is in flight returns [`LoadOutcome::AlreadyLoading`] without
    /// touching the cursor. An exhausted source issues no request.
    pub async fn load_more(&self) -> Result<LoadOutcome, ApiError> {
        let inner = &self.inner;
        if inner.loading.swap(true, Ordering::SeqCst) {
            return Ok(LoadOutcome::AlreadyLoading);
        }
        let _loading = LoadingGuard(&inner.loading);

        let request = {
            let state = inner.state.lock().unwrap();
            let source = state.active_source();
            if source.cursor.is_exhausted() {
                return Ok(LoadOutcome::Exhausted);
            }
            PageRequest {
                epoch: state.epoch,
                favorite: state.favorite_active,
                category: state.explore_filter.as_query(),
                keywords: state.keywords.clone(),
                page: source.cursor.next_page(),
            }
        };

        if request.favorite {
            self.load_favorite_page(request).await
        } else {
            self.load_explore_page(request).await
        }
    }

    async fn load_explore_page(&self, request: PageRequest) -> Result<LoadOutcome, ApiError> {
        let inner = &self.inner;
        let query = ExploreQuery {
            page: request.page + 1,
            limit: inner.config.page_size,
            category: request.category,
            name: request.keywords,
        };

        let page = match inner.api.explore_apps(&query).await {
            Ok(page) => page,
            Err(err) => return self.stale_or(request.epoch, err),
        };

        let mut state = inner.state.lock().unwrap();
        if state.epoch != request.epoch {
            debug!(page = request.page, "dropping stale explore page");
            return Ok(LoadOutcome::Superseded);
        }

        let appended = page.data.len();
        let limit = if page.limit == 0 {
            u64::from(inner.config.page_size)
        } else {
            page.limit
        };
        state.explore.pages.push(page.data);
        state.explore.cursor.advance();
        if page.total <= u64::from(state.explore.cursor.pages_fetched()) * limit {
            state.explore.cursor.mark_exhausted();
        }
        Ok(LoadOutcome::Loaded(appended))
    }

    async fn load_favorite_page(&self, request: PageRequest) -> Result<LoadOutcome, ApiError> {
        let inner = &self.inner;
        let query = TagQuery {
            page: request.page + 1,
            limit: inner.config.page_size,
            name: request.keywords,
            tag_ids: vec![inner.config.favorite_tag_id.clone()],
        };

        let page = match inner.api.apps_by_tag(&query).await {
            Ok(page) => page,
            Err(err) => return self.stale_or(request.epoch, err),
        };

        let mut state = inner.state.lock().unwrap();
        if state.epoch != request.epoch {
            debug!(page = request.page, "dropping stale favorites page");
            return Ok(LoadOutcome::Superseded);
        }

        let appended = page.data.len();
        state.favorite.pages.push(page.data);
        state.favorite.cursor.advance();
        if !page.has_more {
            state.favorite.cursor.mark_exhausted();
        }
        Ok(LoadOutcome::Loaded(appended))
    }

    /// A failure for an outdated key is as stale as a success for one
    fn stale_or(&self, epoch: u64, err: ApiError) -> Result<LoadOutcome, ApiError> {
        if self.inner.state.lock().unwrap().epoch != epoch {
            return Ok(LoadOutcome::Superseded);
        }
        Err(err)
    }
}

fn commit_keywords(inner: &PagerInner, keywords: &str) {
    let mut state = inner.state.lock().unwrap();
    state.staged_keywords = keywords.to_string();
    if state.keywords == keywords {
        return;
    }
    state.keywords = keywords.to_string();
    state.epoch += 1;
    state.explore.reset();
    state.favorite.reset();
    debug!(keywords, "effective search term updated");
}

struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
