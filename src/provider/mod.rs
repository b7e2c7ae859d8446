//! Result providers
//!
//! A provider is a pluggable source of launcher results bound to an action
//! keyword (or the wildcard marker, routing it to every query). Each provider
//! exposes a fast synchronous query and, optionally, a slow cancellable
//! enrichment pass.

pub mod bookmarks;
pub mod programs;
pub mod websearch;

use crate::error::AppError;
use crate::search::Query;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub use bookmarks::BookmarksProvider;
pub use programs::ProgramsProvider;
pub use websearch::{SearchSource, WebSearchProvider};

/// Invoked when the user selects a result; returns whether the launcher
/// window should close.
pub type Action = Arc<dyn Fn() -> bool + Send + Sync>;

/// One entry of the displayed result list
#[derive(Clone)]
pub struct ResultItem {
    /// Display label, the candidate the matcher scores
    pub title: String,
    pub subtitle: String,
    /// Icon reference, resolved by the presentation layer
    pub icon: String,
    /// Ranking score; 0 means unscored (the pipeline scores the title) for
    /// providers that do not pre-score, and "filtered" after scoring
    pub score: u32,
    /// Resolved action keyword; empty when the provider was wildcard-matched
    pub action_keyword: String,
    /// Matched character positions in the title, for highlighting
    pub match_positions: Vec<u32>,
    /// Selection callback
    pub action: Option<Action>,
}

impl ResultItem {
    pub fn new(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
            icon: String::new(),
            score: 0,
            action_keyword: String::new(),
            match_positions: Vec::new(),
            action: None,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_score(mut self, score: u32) -> Self {
        self.score = score;
        self
    }

    pub fn with_action_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.action_keyword = keyword.into();
        self
    }

    pub fn with_action<F>(mut self, action: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(action));
        self
    }

    /// Run the selection callback. Defaults to closing the launcher when the
    /// item carries no action.
    pub fn invoke(&self) -> bool {
        match &self.action {
            Some(action) => action(),
            None => true,
        }
    }
}

impl fmt::Debug for ResultItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultItem")
            .field("title", &self.title)
            .field("subtitle", &self.subtitle)
            .field("icon", &self.icon)
            .field("score", &self.score)
            .field("action_keyword", &self.action_keyword)
            .field("match_positions", &self.match_positions)
            .field("action", &self.action.as_ref().map(|_| "..."))
            .finish()
    }
}

/// Registration data describing a provider to the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderMetadata {
    /// Stable identifier, used for batch tagging and tie-breaking
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Registered routing keyword, or the wildcard marker
    pub action_keyword: String,
    pub enabled: bool,
    /// Whether the provider supplies its own scores. When false the pipeline
    /// scores result titles with the fuzzy matcher and filters non-matches.
    pub pre_scored: bool,
}

/// A pluggable source of launcher results.
///
/// `query` must be fast and must not perform blocking I/O; failures degrade
/// to an empty batch at the pipeline boundary and never affect other
/// providers. `enrich` may be slow; it must check the cancellation token
/// before each unit of work and return `AppError::Cancelled` (which is never
/// logged as a failure) when the generation has been superseded.
#[async_trait]
pub trait Provider: Send + Sync {
    fn metadata(&self) -> ProviderMetadata;

    fn query(&self, query: &Query) -> Result<Vec<ResultItem>, AppError>;

    /// Whether [`enrich`](Provider::enrich) does anything for this provider
    fn supports_enrichment(&self) -> bool {
        false
    }

    async fn enrich(
        &self,
        _query: &Query,
        _cancel: &CancellationToken,
    ) -> Result<Vec<ResultItem>, AppError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoke_defaults_to_close() {
        let item = ResultItem::new("title", "subtitle");
        assert!(item.invoke());
    }

    #[test]
    fn test_invoke_runs_action() {
        let item = ResultItem::new("title", "subtitle").with_action(|| false);
        assert!(!item.invoke());
    }

    #[test]
    fn test_builder_fields() {
        let item = ResultItem::new("Install", "a package")
            .with_icon("package")
            .with_score(6)
            .with_action_keyword("pkg");
        assert_eq!(item.icon, "package");
        assert_eq!(item.score, 6);
        assert_eq!(item.action_keyword, "pkg");
    }
}
