//! Web search provider
//!
//! One provider instance per configured search source. The synchronous phase
//! returns a single type-through entry ("Search DuckDuckGo: <term>") with the
//! source's fixed score; the asynchronous phase fetches completion
//! suggestions from the source's OpenSearch endpoint, cooperating with the
//! generation's cancellation token before and after the network call.

use crate::error::AppError;
use crate::provider::{Provider, ProviderMetadata, ResultItem};
use crate::search::Query;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Fixed score of the type-through entry, kept low so real matches from
/// other providers outrank it.
const SEARCH_ENTRY_SCORE: u32 = 6;
/// Suggestions slot directly under the type-through entry.
const SUGGESTION_SCORE: u32 = 5;
/// Score of the browse entry shown for a bare keyword.
const BROWSE_ENTRY_SCORE: u32 = 10;

/// One configured search engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSource {
    /// Routing keyword, or the wildcard marker for type-anywhere search
    pub keyword: String,
    /// Display name ("Google")
    pub title: String,
    /// Search page with a `{q}` placeholder
    pub url_template: String,
    /// OpenSearch suggestion endpoint with a `{q}` placeholder
    pub suggestion_url: Option<String>,
    pub icon: String,
}

impl SearchSource {
    /// The stock sources: DuckDuckGo routed by keyword, Google as the
    /// type-anywhere fallback.
    pub fn defaults(wildcard: &str) -> Vec<SearchSource> {
        vec![
            SearchSource {
                keyword: wildcard.to_string(),
                title: "Google".to_string(),
                url_template: "https://www.google.com/search?q={q}".to_string(),
                suggestion_url: Some(
                    "https://suggestqueries.google.com/complete/search?client=firefox&q={q}"
                        .to_string(),
                ),
                icon: "google".to_string(),
            },
            SearchSource {
                keyword: "ddg".to_string(),
                title: "DuckDuckGo".to_string(),
                url_template: "https://duckduckgo.com/?q={q}".to_string(),
                suggestion_url: Some("https://duckduckgo.com/ac/?q={q}&type=list".to_string()),
                icon: "duckduckgo".to_string(),
            },
        ]
    }
}

/// Provider wrapping one [`SearchSource`]
pub struct WebSearchProvider {
    source: SearchSource,
    wildcard: String,
    client: reqwest::Client,
}

impl WebSearchProvider {
    pub fn new(source: SearchSource, wildcard: &str) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .user_agent("quickcast/0.2")
            .build()
            .map_err(|e| AppError::Internal(format!("http client: {}", e)))?;
        Ok(Self {
            source,
            wildcard: wildcard.to_string(),
            client,
        })
    }

    /// Whether this source runs on every query rather than its own keyword
    fn wildcard_matched(&self) -> bool {
        self.source.keyword == self.wildcard
    }

    /// Keyword recorded on emitted results; empty when wildcard-matched
    fn resolved_keyword(&self) -> String {
        if self.wildcard_matched() {
            String::new()
        } else {
            self.source.keyword.clone()
        }
    }

    fn search_entry(&self, term: &str) -> ResultItem {
        let source = self.source.clone();
        let url = fill_template(&self.source.url_template, term);
        ResultItem::new(term, format!("Search {}", source.title))
            .with_icon(&source.icon)
            .with_score(SEARCH_ENTRY_SCORE)
            .with_action_keyword(self.resolved_keyword())
            .with_action(move || match webbrowser::open(&url) {
                Ok(_) => true,
                Err(e) => {
                    warn!(source = %source.title, error = %e, "failed to open browser");
                    false
                }
            })
    }

    fn suggestion_entry(&self, suggestion: &str) -> ResultItem {
        self.search_entry(suggestion).with_score(SUGGESTION_SCORE)
    }
}

#[async_trait]
impl Provider for WebSearchProvider {
    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            id: format!("websearch-{}", self.source.title.to_lowercase()),
            name: format!("Web Search ({})", self.source.title),
            action_keyword: self.source.keyword.clone(),
            enabled: true,
            pre_scored: true,
        }
    }

    fn query(&self, query: &Query) -> Result<Vec<ResultItem>, AppError> {
        if query.is_empty_search() {
            // Bare keyword: show a browse entry only for keyword-routed
            // sources; a wildcard source on an empty launcher stays quiet.
            if self.wildcard_matched() {
                return Ok(Vec::new());
            }
            let entry = ResultItem::new(
                format!("Search {}", self.source.title),
                "Type to search",
            )
            .with_icon(&self.source.icon)
            .with_score(BROWSE_ENTRY_SCORE)
            .with_action_keyword(self.resolved_keyword());
            return Ok(vec![entry]);
        }

        Ok(vec![self.search_entry(&query.search)])
    }

    fn supports_enrichment(&self) -> bool {
        self.source.suggestion_url.is_some()
    }

    async fn enrich(
        &self,
        query: &Query,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResultItem>, AppError> {
        let Some(template) = &self.source.suggestion_url else {
            return Ok(Vec::new());
        };
        if query.is_empty_search() {
            return Ok(Vec::new());
        }
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let url = fill_template(template, &query.search);
        debug!(source = %self.source.title, url = %url, "fetching suggestions");

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AppError::Cancelled),
            response = self.client.get(&url).send() => response?,
        };
        let payload: Value = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AppError::Cancelled),
            payload = response.json() => payload?,
        };
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        Ok(parse_suggestions(&payload)
            .iter()
            .map(|suggestion| self.suggestion_entry(suggestion))
            .collect())
    }
}

/// Substitute the percent-encoded term into a `{q}` url template
fn fill_template(template: &str, term: &str) -> String {
    template.replace("{q}", &urlencoding::encode(term))
}

/// Extract suggestions from the OpenSearch response shape
/// `[query, [suggestion, ...], ...]`, tolerating anything else.
fn parse_suggestions(payload: &Value) -> Vec<String> {
    payload
        .get(1)
        .and_then(Value::as_array)
        .map(|suggestions| {
            suggestions
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ddg() -> WebSearchProvider {
        let source = SearchSource::defaults("*").remove(1);
        WebSearchProvider::new(source, "*").unwrap()
    }

    fn google() -> WebSearchProvider {
        let source = SearchSource::defaults("*").remove(0);
        WebSearchProvider::new(source, "*").unwrap()
    }

    #[test]
    fn test_fill_template_percent_encodes() {
        assert_eq!(
            fill_template("https://duckduckgo.com/?q={q}", "rust async & await"),
            "https://duckduckgo.com/?q=rust%20async%20%26%20await"
        );
    }

    #[test]
    fn test_parse_suggestions_opensearch_shape() {
        let payload: Value =
            serde_json::from_str(r#"["rus", ["rust", "rust lang", "russia"], []]"#).unwrap();
        assert_eq!(parse_suggestions(&payload), vec!["rust", "rust lang", "russia"]);
    }

    #[test]
    fn test_parse_suggestions_tolerates_garbage() {
        let payload: Value = serde_json::from_str(r#"{"unexpected": true}"#).unwrap();
        assert!(parse_suggestions(&payload).is_empty());
        let payload: Value = serde_json::from_str(r#"["only-query"]"#).unwrap();
        assert!(parse_suggestions(&payload).is_empty());
    }

    #[test]
    fn test_query_emits_fixed_score_entry() {
        let provider = ddg();
        let query = Query {
            raw: "ddg rust".to_string(),
            action_keyword: "ddg".to_string(),
            search: "rust".to_string(),
        };
        let items = provider.query(&query).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "rust");
        assert_eq!(items[0].subtitle, "Search DuckDuckGo");
        assert_eq!(items[0].score, SEARCH_ENTRY_SCORE);
        assert_eq!(items[0].action_keyword, "ddg");
    }

    #[test]
    fn test_wildcard_source_resolves_empty_keyword() {
        let provider = google();
        let items = provider.query(&Query::plain("rust")).unwrap();
        assert_eq!(items[0].action_keyword, "");
    }

    #[test]
    fn test_bare_keyword_shows_browse_entry() {
        let provider = ddg();
        let query = Query {
            raw: "ddg".to_string(),
            action_keyword: "ddg".to_string(),
            search: String::new(),
        };
        let items = provider.query(&query).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Search DuckDuckGo");
        assert_eq!(items[0].score, BROWSE_ENTRY_SCORE);
    }

    #[test]
    fn test_wildcard_source_stays_quiet_on_empty_input() {
        let provider = google();
        assert!(provider.query(&Query::plain("")).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_enrich_honors_cancellation_before_network() {
        let provider = ddg();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = provider
            .enrich(&Query::plain("rust"), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_enrich_skips_empty_term() {
        let provider = ddg();
        let cancel = CancellationToken::new();
        let items = provider.enrich(&Query::plain(""), &cancel).await.unwrap();
        assert!(items.is_empty());
    }
}
