//! Browser bookmarks provider
//!
//! Reads the Chromium-format `Bookmarks` JSON store (also written by Chrome
//! and Edge), flattening the folder tree into plain url candidates. A missing
//! or malformed store degrades to an empty candidate list; the launcher keeps
//! working without bookmarks.

use crate::error::AppError;
use crate::provider::{Provider, ProviderMetadata, ResultItem};
use crate::search::Query;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One bookmarked page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    pub title: String,
    pub url: String,
}

/// Top level of the Chromium bookmark store
#[derive(Debug, Deserialize)]
struct BookmarkStore {
    roots: HashMap<String, BookmarkNode>,
}

/// Folder or url node of the bookmark tree
#[derive(Debug, Deserialize)]
struct BookmarkNode {
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default)]
    kind: String,
    url: Option<String>,
    #[serde(default)]
    children: Vec<BookmarkNode>,
}

/// Provider over the bookmarks of locally installed Chromium-family browsers
pub struct BookmarksProvider {
    bookmarks: Vec<Bookmark>,
    wildcard: String,
}

impl BookmarksProvider {
    /// Load from the default browser profile locations.
    pub fn new(wildcard: &str) -> Self {
        Self::from_files(default_store_paths(), wildcard)
    }

    /// Load from explicit store files, deduplicating by url across browsers.
    pub fn from_files(paths: Vec<PathBuf>, wildcard: &str) -> Self {
        let mut bookmarks: Vec<Bookmark> = Vec::new();
        for path in paths {
            for bookmark in load_store(&path) {
                if !bookmarks.iter().any(|b| b.url == bookmark.url) {
                    bookmarks.push(bookmark);
                }
            }
        }
        debug!(count = bookmarks.len(), "loaded bookmarks");
        Self {
            bookmarks,
            wildcard: wildcard.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.bookmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
    }
}

impl Provider for BookmarksProvider {
    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            id: "bookmarks".to_string(),
            name: "Bookmarks".to_string(),
            action_keyword: self.wildcard.clone(),
            enabled: true,
            pre_scored: false,
        }
    }

    fn query(&self, query: &Query) -> Result<Vec<ResultItem>, AppError> {
        if query.is_empty_search() {
            return Ok(Vec::new());
        }

        Ok(self
            .bookmarks
            .iter()
            .map(|bookmark| {
                let url = bookmark.url.clone();
                ResultItem::new(bookmark.title.as_str(), bookmark.url.as_str())
                    .with_icon("bookmark")
                    .with_action(move || match webbrowser::open(&url) {
                        Ok(_) => true,
                        Err(e) => {
                            warn!(url = %url, error = %e, "failed to open bookmark");
                            false
                        }
                    })
            })
            .collect())
    }
}

/// Read and flatten one store file. Any failure means no bookmarks from it.
fn load_store(path: &Path) -> Vec<Bookmark> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(_) => return Vec::new(),
    };
    let store: BookmarkStore = match serde_json::from_str(&data) {
        Ok(store) => store,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable bookmark store");
            return Vec::new();
        }
    };

    let mut bookmarks = Vec::new();
    for root in store.roots.values() {
        collect(root, &mut bookmarks);
    }
    // HashMap root order is unstable; sort for a deterministic candidate set.
    bookmarks.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.url.cmp(&b.url)));
    bookmarks
}

fn collect(node: &BookmarkNode, out: &mut Vec<Bookmark>) {
    if node.kind == "url" {
        if let Some(url) = &node.url {
            out.push(Bookmark {
                title: node.name.clone(),
                url: url.clone(),
            });
        }
        return;
    }
    for child in &node.children {
        collect(child, out);
    }
}

/// Default profile store locations for the Chromium family
fn default_store_paths() -> Vec<PathBuf> {
    let Some(config_dir) = dirs::config_dir() else {
        return Vec::new();
    };
    ["google-chrome", "chromium", "BraveSoftware/Brave-Browser"]
        .iter()
        .map(|browser| config_dir.join(browser).join("Default").join("Bookmarks"))
        .collect()
}
