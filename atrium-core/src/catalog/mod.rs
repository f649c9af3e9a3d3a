//! Shared catalog - the browsable listing of published apps
//!
//! Two independently paginated backend sources (favorites, explore) are
//! presented as one seamless scroll by [`CatalogPager`]. The reserved
//! `favorite` category switches the whole pager to the alternate source
//! rather than filtering the current one.
//!
//! # Overview
//!
//! ```text
//! explore source   GET /explore/apps?page&mode&name   (total/limit terminal)
//! favorite source  GET /apps?page&tag_ids&name        (has_more terminal)
//!        │
//!        ▼
//! CatalogPager ── per-source PageCursor + cache, epoch-guarded merges,
//!        │        debounced search, in-flight latch on the advance trigger
//!        ▼
//! entries() ── per-page flatten in arrival order, no cross-source dedup
//! ```

mod cursor;
mod entry;
mod pager;
mod refresh;

pub use cursor::{PageCursor, PAGE_SIZE};
pub use entry::{AppIcon, CatalogEntry, EntrySource};
pub use pager::{CatalogPager, Category, ExploreFilter, LoadOutcome, PagerConfig, SEARCH_DEBOUNCE};
pub use refresh::RefreshSignal;
