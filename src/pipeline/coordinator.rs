//! Query Coordinator
//!
//! Turns raw input into a structured query, selects the providers registered
//! for its action keyword (or the wildcard), allocates a generation, and
//! drives each provider through its synchronous query and optional
//! asynchronous enrichment. Every piece of background work is bound to the
//! generation's cancellation token; superseded work exits quietly.

use crate::config::LauncherConfig;
use crate::pipeline::aggregator::{AggregatorMessage, ResultBatch};
use crate::pipeline::generation::{GenerationTracker, QueryContext};
use crate::provider::{Provider, ProviderMetadata, ResultItem};
use crate::search::{FuzzyMatcher, Query, QueryParser};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Score given to unscored items when the search term is empty, so
/// keyword-routed browsing ("g " listing its search entry) still displays.
const EMPTY_TERM_SCORE: u32 = 10;

/// One registered provider with its pipeline bookkeeping
struct RegisteredProvider {
    provider: Arc<dyn Provider>,
    metadata: ProviderMetadata,
}

/// Drives the query cycle: parse, select, dispatch, enrich.
pub struct QueryCoordinator {
    providers: Vec<RegisteredProvider>,
    parser: QueryParser,
    matcher: FuzzyMatcher,
    tracker: Arc<GenerationTracker>,
    tx: mpsc::Sender<AggregatorMessage>,
    config: LauncherConfig,
}

impl QueryCoordinator {
    /// Register providers in display-priority order (the order doubles as
    /// the score tie-break) and wire the aggregator channel.
    pub fn new(
        config: LauncherConfig,
        providers: Vec<Arc<dyn Provider>>,
        tx: mpsc::Sender<AggregatorMessage>,
    ) -> Self {
        let providers: Vec<RegisteredProvider> = providers
            .into_iter()
            .map(|provider| {
                let metadata = provider.metadata();
                RegisteredProvider { provider, metadata }
            })
            .collect();
        let keywords = providers
            .iter()
            .filter(|p| p.metadata.action_keyword != config.wildcard_marker)
            .map(|p| p.metadata.action_keyword.clone())
            .filter(|k| !k.is_empty());
        let parser = QueryParser::new(keywords);
        Self {
            providers,
            parser,
            matcher: FuzzyMatcher::new(),
            tracker: Arc::new(GenerationTracker::new()),
            tx,
            config,
        }
    }

    /// Provider registration order, for the aggregator's tie-break.
    pub fn provider_order(&self) -> Vec<String> {
        self.providers
            .iter()
            .map(|p| p.metadata.id.clone())
            .collect()
    }

    /// Registered provider metadata, in registration order.
    pub fn provider_metadata(&self) -> Vec<ProviderMetadata> {
        self.providers.iter().map(|p| p.metadata.clone()).collect()
    }

    /// Start a new query cycle for `raw` input.
    ///
    /// Supersedes the previous cycle before any provider runs, announces the
    /// new generation to the aggregator, then spawns one task per selected
    /// provider. Returns the parsed query; results flow through the
    /// aggregator's update channel.
    pub async fn dispatch(&self, raw: &str) -> Query {
        let query = self.parser.parse(raw);
        let selected: Vec<&RegisteredProvider> = self
            .providers
            .iter()
            .filter(|p| {
                p.metadata.enabled
                    && (p.metadata.action_keyword == query.action_keyword
                        || p.metadata.action_keyword == self.config.wildcard_marker)
            })
            .collect();

        let ctx = self.tracker.begin();
        debug!(
            generation = ctx.generation,
            providers = selected.len(),
            keyword = %query.action_keyword,
            "dispatching query"
        );

        if self
            .tx
            .send(AggregatorMessage::Begin {
                generation: ctx.generation,
                query: query.clone(),
                expected_final: selected.len(),
            })
            .await
            .is_err()
        {
            debug!("aggregator gone; dropping dispatch");
            return query;
        }

        for registered in selected {
            let worker = ProviderWorker {
                provider: Arc::clone(&registered.provider),
                metadata: registered.metadata.clone(),
                matcher: self.matcher,
                tracker: Arc::clone(&self.tracker),
                tx: self.tx.clone(),
                enrichment_enabled: self.config.enrichment_enabled,
                grace_window: self.config.grace_window(),
            };
            let query = query.clone();
            let ctx = ctx.clone();
            tokio::spawn(async move {
                worker.run(query, ctx).await;
            });
        }

        query
    }
}

/// Everything one provider task needs, detached from the coordinator.
struct ProviderWorker {
    provider: Arc<dyn Provider>,
    metadata: ProviderMetadata,
    matcher: FuzzyMatcher,
    tracker: Arc<GenerationTracker>,
    tx: mpsc::Sender<AggregatorMessage>,
    enrichment_enabled: bool,
    grace_window: Duration,
}

impl ProviderWorker {
    async fn run(self, query: Query, ctx: QueryContext) {
        // Synchronous phase. A failing provider degrades to an empty batch
        // and never affects its peers.
        let raw_items = match self.provider.query(&query) {
            Ok(items) => items,
            Err(e) => {
                warn!(
                    provider = %self.metadata.id,
                    code = e.error_code(),
                    error = %e,
                    "provider query failed"
                );
                Vec::new()
            }
        };
        let mut items = self.score_items(&query, raw_items);

        let enrich = self.enrichment_enabled && self.provider.supports_enrichment();
        if !enrich {
            self.send_batch(&ctx, items, true).await;
            return;
        }

        // Enrichment phase, raced against the grace window: finish in time
        // and the results ride along with the synchronous delivery; miss it
        // and the synchronous results go out first, with the cumulative list
        // following whenever the enrichment completes - unless this
        // generation has been superseded by then.
        let enrich_fut = self.provider.enrich(&query, &ctx.cancel);
        tokio::pin!(enrich_fut);

        match tokio::time::timeout(self.grace_window, &mut enrich_fut).await {
            Ok(outcome) => {
                self.absorb_enrichment(&query, &mut items, outcome);
                self.send_batch(&ctx, items, true).await;
            }
            Err(_) => {
                self.send_batch(&ctx, items.clone(), false).await;

                tokio::select! {
                    biased;

                    _ = ctx.cancel.cancelled() => {
                        debug!(provider = %self.metadata.id, "enrichment cancelled");
                    }

                    outcome = &mut enrich_fut => {
                        if !self.tracker.is_current(ctx.generation) || ctx.cancel.is_cancelled() {
                            // Superseded while the response was in flight;
                            // drop it unprocessed.
                            debug!(provider = %self.metadata.id, "late enrichment discarded");
                            return;
                        }
                        self.absorb_enrichment(&query, &mut items, outcome);
                        self.send_batch(&ctx, items, true).await;
                    }
                }
            }
        }
    }

    /// Fold an enrichment outcome into the cumulative item list. Failures
    /// are logged and swallowed; cancellation is expected and not a failure.
    fn absorb_enrichment(
        &self,
        query: &Query,
        items: &mut Vec<ResultItem>,
        outcome: Result<Vec<ResultItem>, crate::error::AppError>,
    ) {
        match outcome {
            Ok(extra) => items.extend(self.score_items(query, extra)),
            Err(e) if e.is_cancelled() => {
                debug!(provider = %self.metadata.id, "enrichment cancelled");
            }
            Err(e) => {
                warn!(
                    provider = %self.metadata.id,
                    code = e.error_code(),
                    error = %e,
                    "enrichment failed"
                );
            }
        }
    }

    /// Apply matcher scoring for providers that do not pre-score, then drop
    /// non-matches. Pre-scored providers only get the zero filter.
    fn score_items(&self, query: &Query, mut items: Vec<ResultItem>) -> Vec<ResultItem> {
        if !self.metadata.pre_scored {
            if query.is_empty_search() {
                for item in &mut items {
                    item.score = EMPTY_TERM_SCORE;
                    item.match_positions.clear();
                }
            } else {
                for item in &mut items {
                    let result = self.matcher.evaluate(&item.title, &query.search);
                    item.score = result.score;
                    item.match_positions = result.positions;
                }
            }
        }
        items.retain(|item| item.score > 0);
        items
    }

    async fn send_batch(&self, ctx: &QueryContext, results: Vec<ResultItem>, is_final: bool) {
        let batch = ResultBatch {
            provider_id: self.metadata.id.clone(),
            generation: ctx.generation,
            is_final,
            results,
        };
        if self.tx.send(AggregatorMessage::Batch(batch)).await.is_err() {
            debug!(provider = %self.metadata.id, "aggregator gone; batch dropped");
        }
    }
}
