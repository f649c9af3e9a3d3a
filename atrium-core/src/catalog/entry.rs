//! Catalog entry - read-only projection of a published app
//!
//! Entries are created server-side on publish/recommend and never mutated
//! by the client. Identity is unique within one source's page; the same app
//! may appear under several sources at once, so nothing here assumes global
//! uniqueness.

use serde::{Deserialize, Serialize};

use crate::app::AppMode;

/// Which backend source an entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    Favorite,
    #[default]
    Community,
    Recommended,
}

/// Icon descriptor, flattened into the entry on the wire
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppIcon {
    #[serde(default = "default_icon_type")]
    pub icon_type: String,

    #[serde(default)]
    pub icon: String,

    #[serde(default)]
    pub icon_background: Option<String>,

    #[serde(default)]
    pub icon_url: Option<String>,
}

fn default_icon_type() -> String {
    "emoji".to_string()
}

/// One entry of the browsable catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub mode: AppMode,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(flatten)]
    pub icon: AppIcon,

    #[serde(default)]
    pub author_name: Option<String>,

    #[serde(default)]
    pub source: EntrySource,

    /// Ordering key within the entry's own source
    #[serde(default)]
    pub position: i64,
}
