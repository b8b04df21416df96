//! Concurrent dispatch of chunks to the scoring service and aggregation of
//! their partial results.

use std::num::NonZeroUsize;

use futures::future::try_join_all;
use tokio::sync::Semaphore;
use tracing::debug;
use tracing::info;

use crate::NUM_PRINCIPAL_COMPONENTS;
use crate::partition::Chunk;
use crate::scoring;
use crate::scoring::PartialResult;

/// The sum of the partial results of every chunk.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AggregateScore {
    /// The summed raw score.
    prs: f64,

    /// The element-wise summed loadings.
    loadings: [f64; NUM_PRINCIPAL_COMPONENTS],
}

impl AggregateScore {
    /// Gets the summed raw score.
    pub fn prs(&self) -> f64 {
        self.prs
    }

    /// Gets the summed loadings.
    pub fn loadings(&self) -> &[f64; NUM_PRINCIPAL_COMPONENTS] {
        &self.loadings
    }

    /// Adds a partial result into the aggregate.
    pub fn add(&mut self, partial: &PartialResult) {
        self.prs += partial.prs();

        for (total, loading) in self.loadings.iter_mut().zip(partial.loadings()) {
            *total += loading;
        }
    }
}

impl Default for AggregateScore {
    fn default() -> Self {
        Self {
            prs: 0.0,
            loadings: [0.0; NUM_PRINCIPAL_COMPONENTS],
        }
    }
}

impl FromIterator<PartialResult> for AggregateScore {
    fn from_iter<I: IntoIterator<Item = PartialResult>>(iter: I) -> Self {
        let mut aggregate = Self::default();

        for partial in iter {
            aggregate.add(&partial);
        }

        aggregate
    }
}

/// Sends every chunk to the scoring service and sums the results.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    /// The scoring service client.
    client: scoring::Client,

    /// The maximum number of requests in flight, if bounded.
    limit: Option<NonZeroUsize>,
}

impl Dispatcher {
    /// Creates a new [`Dispatcher`] that sends every request at once.
    pub fn new(client: scoring::Client) -> Self {
        Self {
            client,
            limit: None,
        }
    }

    /// Bounds the number of requests in flight at the same time.
    pub fn with_limit(mut self, limit: Option<NonZeroUsize>) -> Self {
        self.limit = limit;
        self
    }

    /// Scores every chunk concurrently and waits for all of them.
    ///
    /// The first failing chunk aborts the whole dispatch and its error is
    /// returned; requests still in flight are dropped.
    pub async fn dispatch(&self, chunks: &[Chunk]) -> Result<AggregateScore, scoring::Error> {
        info!(
            "dispatching {} chunks to {}",
            chunks.len(),
            self.client.endpoint()
        );

        let semaphore = self.limit.map(|limit| Semaphore::new(limit.get()));

        let requests = chunks.iter().map(|chunk| {
            let semaphore = semaphore.as_ref();

            async move {
                // NOTE: the semaphore is never closed, so acquiring cannot fail.
                let _permit = match semaphore {
                    Some(semaphore) => semaphore.acquire().await.ok(),
                    None => None,
                };

                self.client.score(chunk).await
            }
        });

        let partials = try_join_all(requests).await?;
        let aggregate = partials.into_iter().collect::<AggregateScore>();

        debug!(
            "aggregated raw score {} with loadings {:?}",
            aggregate.prs(),
            aggregate.loadings()
        );

        Ok(aggregate)
    }
}
