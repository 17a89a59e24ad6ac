//! Batch planning and dispatch for historical imports.
//!
//! Events are split into chunks of at most [`MAX_BATCH_SIZE`], one request
//! per chunk. Chunks go out in rounds of at most the concurrency limit
//! ([`DEFAULT_MAX_CONCURRENT_REQUESTS`] when none is set); a round starts
//! only once the previous one has completed. Failures never abort the run: each failed
//! chunk is recorded and the rest are still sent.
//!
//! ```text
//! 130 events, default          -> [50] [50] [30]            one round
//! 130 events, max_batch_size 30 -> [30] [30] [30] [30] [10]  one round
//! 130 events, max_batch_size 100 -> [50] [50] | [30]         two rounds
//! ```

use crate::response::RequestError;
use mp_common::Event;
use mp_config::ImportDefaults;
use serde::{Serialize, Serializer};
use std::ops::Range;
use tracing::{debug, warn};

/// Largest number of events the import endpoint accepts per request.
pub const MAX_BATCH_SIZE: usize = 50;

/// Requests in flight at once when neither option sets a limit.
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 16;

/// Caller options for a batch import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportOptions {
    /// Events per request. Values above [`MAX_BATCH_SIZE`] are capped and
    /// the surplus is read as a request for more concurrent requests.
    pub max_batch_size: Option<usize>,

    /// Requests in flight at once.
    pub max_concurrent_requests: Option<usize>,
}

impl ImportOptions {
    /// Set the events per request.
    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = Some(size);
        self
    }

    /// Set the requests in flight at once.
    pub fn with_max_concurrent_requests(mut self, limit: usize) -> Self {
        self.max_concurrent_requests = Some(limit);
        self
    }

    /// Fill unset fields from configured defaults.
    pub fn or_defaults(self, defaults: &ImportDefaults) -> Self {
        ImportOptions {
            max_batch_size: self.max_batch_size.or(defaults.max_batch_size),
            max_concurrent_requests: self
                .max_concurrent_requests
                .or(defaults.max_concurrent_requests),
        }
    }
}

/// How a list of events will be split and scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchPlan {
    pub total_events: usize,
    /// Events per request; the last request may carry fewer.
    pub batch_size: usize,
    pub request_count: usize,
    /// Explicit requests per round; `None` uses
    /// [`DEFAULT_MAX_CONCURRENT_REQUESTS`].
    pub concurrency: Option<usize>,
}

impl BatchPlan {
    pub fn new(total_events: usize, options: &ImportOptions) -> Self {
        let requested = options.max_batch_size.filter(|&size| size > 0);
        let batch_size = requested.unwrap_or(MAX_BATCH_SIZE).min(MAX_BATCH_SIZE);

        let concurrency = options
            .max_concurrent_requests
            .filter(|&limit| limit > 0)
            .or_else(|| {
                requested
                    .filter(|&size| size > MAX_BATCH_SIZE)
                    .map(|size| size.div_ceil(MAX_BATCH_SIZE))
            });

        BatchPlan {
            total_events,
            batch_size,
            request_count: total_events.div_ceil(batch_size),
            concurrency,
        }
    }

    /// Requests sent together in each round.
    pub fn round_width(&self) -> usize {
        self.concurrency
            .unwrap_or(DEFAULT_MAX_CONCURRENT_REQUESTS)
            .min(self.request_count)
            .max(1)
    }

    pub fn round_count(&self) -> usize {
        self.request_count.div_ceil(self.round_width())
    }

    /// Event index range of each request, in order.
    pub fn ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.request_count).map(move |i| {
            let start = i * self.batch_size;
            start..(start + self.batch_size).min(self.total_events)
        })
    }
}

/// A request that failed during a batch import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    /// Position of the chunk in send order.
    pub batch_index: usize,
    pub event_count: usize,
    #[serde(serialize_with = "serialize_display")]
    pub error: RequestError,
}

fn serialize_display<S: Serializer>(error: &RequestError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Outcome of a batch import, delivered once every request has finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub plan: BatchPlan,
    /// Requests actually sent.
    pub requests: usize,
    pub events: usize,
    /// Failed requests ordered by `batch_index`; empty on full success.
    pub errors: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Events carried by failed requests.
    pub fn failed_events(&self) -> usize {
        self.errors.iter().map(|failure| failure.event_count).sum()
    }
}

/// Send every chunk of `events` according to `plan`.
///
/// `send` is called once per chunk with the chunk index; each call in a
/// round runs on its own scoped thread. A worker that cannot be started is
/// recorded as a failure of its chunk.
pub fn dispatch<F>(plan: &BatchPlan, events: &[Event], send: F) -> Vec<BatchFailure>
where
    F: Fn(usize, &[Event]) -> Result<(), RequestError> + Sync,
{
    let chunks: Vec<&[Event]> = plan.ranges().map(|range| &events[range]).collect();
    let width = plan.round_width();
    let mut failures = Vec::new();

    for (round, group) in chunks.chunks(width).enumerate() {
        let first = round * width;
        debug!(
            round,
            requests = group.len(),
            first_batch = first,
            "dispatching import round"
        );

        let results: Vec<(usize, usize, Result<(), RequestError>)> = std::thread::scope(|scope| {
            let send = &send;
            let handles: Vec<_> = group
                .iter()
                .enumerate()
                .map(|(offset, &chunk)| {
                    let index = first + offset;
                    let handle = std::thread::Builder::new()
                        .name(format!("mp-import-{}", index))
                        .spawn_scoped(scope, move || send(index, chunk));
                    (index, chunk.len(), handle)
                })
                .collect();

            handles
                .into_iter()
                .map(|(index, len, handle)| {
                    let result = match handle {
                        Ok(handle) => handle.join().unwrap_or(Err(RequestError::WorkerPanicked)),
                        Err(err) => Err(RequestError::WorkerSpawn(err.to_string())),
                    };
                    (index, len, result)
                })
                .collect()
        });

        for (batch_index, event_count, result) in results {
            if let Err(error) = result {
                warn!(batch_index, event_count, error = %error, "import batch failed");
                failures.push(BatchFailure {
                    batch_index,
                    event_count,
                    error,
                });
            }
        }
    }

    failures
}
