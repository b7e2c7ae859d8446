//! Result Aggregator
//!
//! Consumes generation-tagged result batches from one ordered channel, keeps
//! the working set for the current generation only, and publishes the sorted,
//! truncated display list. Batches from superseded generations are dropped
//! silently; a late high scorer can never be crowded out by an earlier
//! truncation because the cap is applied only after the full sort.

use crate::provider::ResultItem;
use crate::search::Query;
use std::collections::HashMap;
use tokio::sync::{mpsc, watch};
use tracing::{debug, trace};

/// Ordered sequence of results from one provider for one generation
#[derive(Debug, Clone)]
pub struct ResultBatch {
    pub provider_id: String,
    pub generation: u64,
    /// False for a synchronous delivery that a later enrichment delivery
    /// will replace
    pub is_final: bool,
    pub results: Vec<ResultItem>,
}

/// Messages consumed by the aggregator task
#[derive(Debug, Clone)]
pub enum AggregatorMessage {
    /// A new generation started; all prior state is superseded
    Begin {
        generation: u64,
        query: Query,
        /// Number of final batches that will eventually arrive, used to
        /// distinguish "still pending" from "complete and empty"
        expected_final: usize,
    },
    Batch(ResultBatch),
}

/// The current display list, published after every distinct change
#[derive(Debug, Clone)]
pub struct ResultsUpdate {
    pub generation: u64,
    pub query: Query,
    pub results: Vec<ResultItem>,
    /// True once every selected provider has delivered its final batch; an
    /// empty complete list is a valid terminal state, not an error
    pub complete: bool,
}

impl ResultsUpdate {
    /// State before any query has been dispatched
    pub fn initial() -> Self {
        Self {
            generation: 0,
            query: Query::plain(""),
            results: Vec::new(),
            complete: true,
        }
    }
}

/// Per-provider slot in the working set
struct ProviderEntry {
    /// Sequence number of the provider's first delivery this generation
    arrival: u64,
    items: Vec<ResultItem>,
}

/// Merges batches into the display list for the current generation.
pub struct ResultAggregator {
    rx: mpsc::Receiver<AggregatorMessage>,
    updates: watch::Sender<ResultsUpdate>,
    /// Provider registration order, the documented score tie-break
    provider_rank: HashMap<String, usize>,
    max_results: usize,

    generation: u64,
    query: Query,
    expected_final: usize,
    finals_seen: usize,
    entries: HashMap<String, ProviderEntry>,
    arrivals: u64,
    /// Fingerprint of the last published list, for coalescing
    last_published: Option<(u64, Vec<(String, u32)>, bool)>,
}

impl ResultAggregator {
    pub fn new(
        rx: mpsc::Receiver<AggregatorMessage>,
        updates: watch::Sender<ResultsUpdate>,
        provider_order: &[String],
        max_results: usize,
    ) -> Self {
        let provider_rank = provider_order
            .iter()
            .enumerate()
            .map(|(rank, id)| (id.clone(), rank))
            .collect();
        Self {
            rx,
            updates,
            provider_rank,
            max_results,
            generation: 0,
            query: Query::plain(""),
            expected_final: 0,
            finals_seen: 0,
            entries: HashMap::new(),
            arrivals: 0,
            last_published: None,
        }
    }

    /// Consume messages until the channel closes.
    pub async fn run(mut self) {
        while let Some(message) = self.rx.recv().await {
            match message {
                AggregatorMessage::Begin {
                    generation,
                    query,
                    expected_final,
                } => self.begin(generation, query, expected_final),
                AggregatorMessage::Batch(batch) => self.merge(batch),
            }
        }
        debug!("aggregator channel closed");
    }

    fn begin(&mut self, generation: u64, query: Query, expected_final: usize) {
        debug!(generation, expected_final, "generation started");
        self.generation = generation;
        self.query = query;
        self.expected_final = expected_final;
        self.finals_seen = 0;
        self.entries.clear();
        self.arrivals = 0;
        self.publish();
    }

    fn merge(&mut self, batch: ResultBatch) {
        if batch.generation != self.generation {
            trace!(
                batch_generation = batch.generation,
                current = self.generation,
                provider = %batch.provider_id,
                "discarding stale batch"
            );
            return;
        }

        if batch.is_final {
            self.finals_seen += 1;
        }

        // A later batch from the same provider carries the cumulative list
        // and replaces the earlier one; the original arrival slot is kept so
        // tie-breaking stays stable across the replacement.
        let arrival = self
            .entries
            .get(&batch.provider_id)
            .map(|e| e.arrival)
            .unwrap_or_else(|| {
                self.arrivals += 1;
                self.arrivals
            });
        self.entries.insert(
            batch.provider_id,
            ProviderEntry {
                arrival,
                items: batch.results,
            },
        );
        self.publish();
    }

    /// Sort, truncate, and publish - only when something actually changed.
    fn publish(&mut self) {
        let mut rows: Vec<(&String, u64, usize, &ResultItem)> = Vec::new();
        for (provider_id, entry) in &self.entries {
            for (index, item) in entry.items.iter().enumerate() {
                if item.score == 0 {
                    continue;
                }
                rows.push((provider_id, entry.arrival, index, item));
            }
        }

        rows.sort_by(|a, b| {
            b.3.score
                .cmp(&a.3.score)
                .then_with(|| self.rank(a.0).cmp(&self.rank(b.0)))
                .then_with(|| a.1.cmp(&b.1))
                .then_with(|| a.2.cmp(&b.2))
        });
        rows.truncate(self.max_results);

        let complete = self.finals_seen >= self.expected_final;
        let fingerprint: Vec<(String, u32)> = rows
            .iter()
            .map(|(id, _, _, item)| (format!("{}\u{1}{}", id, item.title), item.score))
            .collect();
        let results: Vec<ResultItem> = rows.into_iter().map(|(_, _, _, item)| item.clone()).collect();

        if self
            .last_published
            .as_ref()
            .map(|last| *last == (self.generation, fingerprint.clone(), complete))
            .unwrap_or(false)
        {
            return;
        }
        self.last_published = Some((self.generation, fingerprint, complete));

        let update = ResultsUpdate {
            generation: self.generation,
            query: self.query.clone(),
            results,
            complete,
        };
        // Send fails only when every subscriber is gone; keep aggregating so
        // late batches are still drained in order.
        let _ = self.updates.send(update);
    }

    fn rank(&self, provider_id: &str) -> usize {
        self.provider_rank
            .get(provider_id)
            .copied()
            .unwrap_or(usize::MAX)
    }
}
