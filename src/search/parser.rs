//! Query Parser
//!
//! Splits raw launcher input into a routing keyword and the remaining search
//! term. The keyword is the first whitespace-delimited token, and only when a
//! provider actually registered it; everything else stays in the search term
//! verbatim.

use std::collections::HashSet;

/// Parsed launcher input, immutable for the lifetime of one query cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Original unmodified input
    pub raw: String,
    /// Routing keyword; empty when the input carries none
    pub action_keyword: String,
    /// Remaining search term, matched against candidates
    pub search: String,
}

impl Query {
    /// Query with no keyword and the whole input as search term
    pub fn plain(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            action_keyword: String::new(),
            search: raw.trim().to_string(),
        }
    }

    /// Whether there is nothing to match against
    pub fn is_empty_search(&self) -> bool {
        self.search.is_empty()
    }
}

/// Query parser bound to the set of registered action keywords
#[derive(Debug, Clone, Default)]
pub struct QueryParser {
    keywords: HashSet<String>,
}

impl QueryParser {
    /// Create a parser recognizing the given keywords. The wildcard marker
    /// must not be included; it is a registration token, never typed input.
    pub fn new(keywords: impl IntoIterator<Item = String>) -> Self {
        Self {
            keywords: keywords.into_iter().collect(),
        }
    }

    /// Parse raw input into a [`Query`].
    ///
    /// The first token becomes the action keyword only if some provider
    /// registered it; otherwise the query routes through the wildcard and
    /// the full trimmed input is the search term.
    pub fn parse(&self, raw: &str) -> Query {
        let trimmed = raw.trim();
        if let Some(first) = trimmed.split_whitespace().next() {
            if self.keywords.contains(first) {
                let rest = trimmed[first.len()..].trim_start();
                return Query {
                    raw: raw.to_string(),
                    action_keyword: first.to_string(),
                    search: rest.to_string(),
                };
            }
        }
        Query::plain(raw)
    }
}
