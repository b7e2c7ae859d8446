//! Query pipeline
//!
//! Wires the coordinator, the aggregator, and the generation tracker into
//! one launcher instance: raw input goes in through [`Launcher::dispatch`],
//! coalesced [`ResultsUpdate`] values come out of the watch channel.

pub mod aggregator;
pub mod coordinator;
pub mod generation;


pub use aggregator::{AggregatorMessage, ResultAggregator, ResultBatch, ResultsUpdate};
pub use coordinator::QueryCoordinator;
pub use generation::{GenerationTracker, QueryContext};

use crate::config::LauncherConfig;
use crate::provider::{Provider, ProviderMetadata};
use crate::search::Query;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Capacity of the batch channel between coordinator tasks and aggregator
const BATCH_CHANNEL_CAPACITY: usize = 64;

/// An assembled launcher pipeline.
pub struct Launcher {
    coordinator: QueryCoordinator,
    updates: watch::Receiver<ResultsUpdate>,
}

impl Launcher {
    /// Build the pipeline and spawn the aggregator task. Provider order is
    /// display-priority order.
    pub fn new(config: LauncherConfig, providers: Vec<Arc<dyn Provider>>) -> Self {
        let (batch_tx, batch_rx) = mpsc::channel(BATCH_CHANNEL_CAPACITY);
        let (update_tx, updates) = watch::channel(ResultsUpdate::initial());

        let coordinator = QueryCoordinator::new(config.clone(), providers, batch_tx);
        let aggregator = ResultAggregator::new(
            batch_rx,
            update_tx,
            &coordinator.provider_order(),
            config.max_results,
        );
        tokio::spawn(aggregator.run());

        Self {
            coordinator,
            updates,
        }
    }

    /// Start a query cycle; supersedes the previous one.
    pub async fn dispatch(&self, raw: &str) -> Query {
        self.coordinator.dispatch(raw).await
    }

    /// Subscribe to display-list updates.
    pub fn updates(&self) -> watch::Receiver<ResultsUpdate> {
        self.updates.clone()
    }

    /// Registered provider metadata, in registration order.
    pub fn provider_metadata(&self) -> Vec<ProviderMetadata> {
        self.coordinator.provider_metadata()
    }

    /// Dispatch and wait until every selected provider has delivered its
    /// final batch, returning the terminal display list.
    pub async fn query_to_completion(&self, raw: &str) -> ResultsUpdate {
        let query = self.dispatch(raw).await;
        let mut updates = self.updates();
        loop {
            {
                let update = updates.borrow_and_update();
                if update.complete && update.query == query {
                    return update.clone();
                }
            }
            if updates.changed().await.is_err() {
                return ResultsUpdate::initial();
            }
        }
    }
}
