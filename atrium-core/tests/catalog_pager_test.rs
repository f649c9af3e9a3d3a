//! Dual-source catalog pager integration tests

mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::sync::Semaphore;

use atrium_core::app::AppMode;
use atrium_core::catalog::{
    CatalogPager, Category, ExploreFilter, LoadOutcome, PagerConfig, SEARCH_DEBOUNCE,
};

use common::MockConsoleApi;

fn pager(api: Arc<MockConsoleApi>) -> CatalogPager {
    CatalogPager::new(api, PagerConfig::new("tag-favorites"))
}

#[tokio::test]
async fn test_explore_terminates_on_total() {
    let api = Arc::new(MockConsoleApi {
        explore_total: 25,
        ..MockConsoleApi::new()
    });
    let pager = pager(api.clone());

    assert_eq!(pager.load_more().await.unwrap(), LoadOutcome::Loaded(10));
    assert_eq!(pager.load_more().await.unwrap(), LoadOutcome::Loaded(10));
    assert_eq!(pager.load_more().await.unwrap(), LoadOutcome::Loaded(5));

    // 25 <= 3 * 10: the fourth trigger issues no request
    assert_eq!(pager.load_more().await.unwrap(), LoadOutcome::Exhausted);
    assert_eq!(api.count_calls("explore:"), 3);
    assert_eq!(pager.entries().len(), 25);
    assert!(pager.is_exhausted());
}

#[tokio::test]
async fn test_favorites_terminate_on_has_more() {
    let api = Arc::new(MockConsoleApi {
        favorite_pages: 2,
        ..MockConsoleApi::new()
    });
    let pager = pager(api.clone());
    pager.set_category(Category::Favorite);

    assert_eq!(pager.load_more().await.unwrap(), LoadOutcome::Loaded(10));
    assert_eq!(pager.load_more().await.unwrap(), LoadOutcome::Loaded(10));
    assert_eq!(pager.load_more().await.unwrap(), LoadOutcome::Exhausted);

    assert_eq!(api.count_calls("tag:"), 2);
    assert_eq!(api.count_calls("explore:"), 0);
}

#[tokio::test]
async fn test_duplicate_trigger_does_not_double_advance() {
    let api = Arc::new(MockConsoleApi {
        explore_total: 25,
        ..MockConsoleApi::new()
    });
    let gate = Arc::new(Semaphore::new(0));
    *api.explore_gate.lock().unwrap() = Some(gate.clone());

    let pager = Arc::new(pager(api.clone()));
    let first = {
        let pager = pager.clone();
        tokio::spawn(async move { pager.load_more().await })
    };
    tokio::task::yield_now().await;

    // The sentinel fires again while the fetch is in flight
    assert_eq!(
        pager.load_more().await.unwrap(),
        LoadOutcome::AlreadyLoading
    );

    gate.add_permits(1);
    assert_eq!(first.await.unwrap().unwrap(), LoadOutcome::Loaded(10));
    assert_eq!(api.count_calls("explore:"), 1);
}

#[tokio::test]
async fn test_stale_page_is_dropped_after_category_switch() {
    let api = Arc::new(MockConsoleApi {
        explore_total: 25,
        favorite_pages: 1,
        ..MockConsoleApi::new()
    });
    let gate = Arc::new(Semaphore::new(0));
    *api.explore_gate.lock().unwrap() = Some(gate.clone());

    let pager = Arc::new(pager(api.clone()));
    let stale = {
        let pager = pager.clone();
        tokio::spawn(async move { pager.load_more().await })
    };
    tokio::task::yield_now().await;

    // The active key changes while the explore page is still in flight
    pager.set_category(Category::Favorite);
    gate.add_permits(1);

    assert_eq!(stale.await.unwrap().unwrap(), LoadOutcome::Superseded);
    assert_eq!(pager.entries().len(), 0);

    // The favorites source works normally afterwards
    assert_eq!(pager.load_more().await.unwrap(), LoadOutcome::Loaded(10));
}

#[tokio::test]
async fn test_category_switch_freezes_the_inactive_source() {
    let api = Arc::new(MockConsoleApi {
        explore_total: 25,
        favorite_pages: 1,
        ..MockConsoleApi::new()
    });
    let pager = pager(api.clone());

    pager.load_more().await.unwrap();
    assert_eq!(pager.entries().len(), 10);

    // Favorites take over; the explore cache is frozen, not refetched
    pager.set_category(Category::Favorite);
    pager.load_more().await.unwrap();
    assert_eq!(pager.entries().len(), 10);
    assert_eq!(api.count_calls("explore:"), 1);

    // Switching back re-reveals the frozen explore pages with no request
    pager.set_category(Category::Explore(ExploreFilter::Recommended));
    assert_eq!(
        pager.category(),
        Category::Explore(ExploreFilter::Recommended)
    );
    assert_eq!(pager.entries().len(), 10);
    assert_eq!(api.count_calls("explore:"), 1);
}

#[tokio::test]
async fn test_explore_filter_change_resets_the_explore_source() {
    let api = Arc::new(MockConsoleApi {
        explore_total: 25,
        ..MockConsoleApi::new()
    });
    let pager = pager(api.clone());

    pager.load_more().await.unwrap();
    pager.load_more().await.unwrap();
    pager.load_more().await.unwrap();
    assert!(pager.is_exhausted());

    // A different mode filter is a different query key: cursor back to
    // page 0, terminal flag cleared
    pager.set_category(Category::Explore(ExploreFilter::Mode(AppMode::Workflow)));
    assert_eq!(pager.entries().len(), 0);
    assert!(!pager.is_exhausted());

    pager.load_more().await.unwrap();
    let calls = api.calls();
    assert_eq!(calls.last().unwrap(), "explore:p1:workflow:");
}

#[tokio::test]
async fn test_search_commit_resets_both_sources() {
    let api = Arc::new(MockConsoleApi {
        explore_total: 25,
        favorite_pages: 2,
        ..MockConsoleApi::new()
    });
    let pager = pager(api.clone());

    pager.load_more().await.unwrap();
    pager.set_category(Category::Favorite);
    pager.load_more().await.unwrap();

    pager.set_keywords("digest");
    assert_eq!(pager.entries().len(), 0);
    assert!(!pager.is_exhausted());

    pager.load_more().await.unwrap();
    assert_eq!(api.calls().last().unwrap(), "tag:p1:digest");

    pager.set_category(Category::Explore(ExploreFilter::Recommended));
    assert_eq!(pager.entries().len(), 0);
    pager.load_more().await.unwrap();
    assert_eq!(api.calls().last().unwrap(), "explore:p1:recommended:digest");
}

#[tokio::test(start_paused = true)]
async fn test_debounce_coalesces_keystrokes() {
    let api = Arc::new(MockConsoleApi {
        explore_total: 25,
        ..MockConsoleApi::new()
    });
    let pager = pager(api.clone());

    // Keystrokes at t = 0, 100, 200, 300 ms
    for (text, pause_ms) in [("d", 100), ("di", 100), ("dig", 100), ("dige", 0)] {
        pager.input_keywords(text);
        tokio::task::yield_now().await;
        if pause_ms > 0 {
            tokio::time::advance(Duration::from_millis(pause_ms)).await;
        }
    }

    // Just before t = 300 + 500: nothing committed yet
    tokio::time::advance(SEARCH_DEBOUNCE - Duration::from_millis(1)).await;
    tokio::task::yield_now().await;
    assert_eq!(pager.keywords(), "");
    assert_eq!(pager.staged_keywords(), "dige");

    // At t = 800 the final keystroke's value commits, exactly once
    tokio::time::advance(Duration::from_millis(1)).await;
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;
    assert_eq!(pager.keywords(), "dige");

    pager.load_more().await.unwrap();
    assert_eq!(api.calls().last().unwrap(), "explore:p1:recommended:dige");
}

#[tokio::test(start_paused = true)]
async fn test_stale_debounce_generation_commits_nothing() {
    let api = Arc::new(MockConsoleApi::new());
    let pager = pager(api);

    pager.input_keywords("old");
    tokio::task::yield_now().await;
    tokio::time::advance(Duration::from_millis(100)).await;

    // An immediate commit supersedes the pending debounce task
    pager.set_keywords("new");
    tokio::time::advance(SEARCH_DEBOUNCE).await;
    tokio::task::yield_now().await;

    assert_eq!(pager.keywords(), "new");
}

#[tokio::test]
async fn test_entries_flatten_in_arrival_order() {
    let api = Arc::new(MockConsoleApi {
        explore_total: 12,
        ..MockConsoleApi::new()
    });
    let pager = pager(api);

    pager.load_more().await.unwrap();
    pager.load_more().await.unwrap();

    let ids: Vec<String> = pager.entries().iter().map(|e| e.id.clone()).collect();
    assert_eq!(ids.len(), 12);
    assert_eq!(ids[0], "exp-1-0");
    assert_eq!(ids[9], "exp-1-9");
    assert_eq!(ids[10], "exp-2-0");
    assert_eq!(ids[11], "exp-2-1");
}
