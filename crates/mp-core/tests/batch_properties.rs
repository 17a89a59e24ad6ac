//! Property-based tests for batch planning and dispatch.
//!
//! Uses proptest to check chunking holds for arbitrary list sizes and options.

use mp_common::Event;
use mp_core::batch::dispatch;
use mp_core::{
    BatchPlan, ImportOptions, RequestError, DEFAULT_MAX_CONCURRENT_REQUESTS, MAX_BATCH_SIZE,
};
use proptest::prelude::*;
use std::sync::Mutex;

fn options() -> impl Strategy<Value = ImportOptions> {
    (
        proptest::option::of(0usize..200),
        proptest::option::of(0usize..8),
    )
        .prop_map(|(max_batch_size, max_concurrent_requests)| ImportOptions {
            max_batch_size,
            max_concurrent_requests,
        })
}

fn events(count: usize) -> Vec<Event> {
    (0..count)
        .map(|i| Event::new("test").property("time", i as i64))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Chunks cover every event exactly once, in order, and never exceed the cap.
    #[test]
    fn ranges_partition_the_events(total in 0usize..600, opts in options()) {
        let plan = BatchPlan::new(total, &opts);

        prop_assert!(plan.batch_size >= 1);
        prop_assert!(plan.batch_size <= MAX_BATCH_SIZE);
        prop_assert_eq!(plan.request_count, total.div_ceil(plan.batch_size));

        let mut next = 0;
        for range in plan.ranges() {
            prop_assert_eq!(range.start, next);
            prop_assert!(!range.is_empty());
            prop_assert!(range.len() <= plan.batch_size);
            next = range.end;
        }
        prop_assert_eq!(next, total);
    }

    /// Rounds never run more requests at once than the concurrency limit.
    #[test]
    fn rounds_respect_concurrency(total in 1usize..600, opts in options()) {
        let plan = BatchPlan::new(total, &opts);
        let limit = plan.concurrency.unwrap_or(DEFAULT_MAX_CONCURRENT_REQUESTS);
        prop_assert!(plan.round_width() <= limit);
        if plan.request_count <= limit {
            prop_assert_eq!(plan.round_count(), 1);
        }
        prop_assert!(plan.round_width() * plan.round_count() >= plan.request_count);
    }

    /// Oversized batch requests fall back to 50 with ceil(size / 50) in flight.
    #[test]
    fn oversized_batches_limit_concurrency(size in 51usize..500, total in 1usize..600) {
        let plan = BatchPlan::new(total, &ImportOptions::default().with_max_batch_size(size));
        prop_assert_eq!(plan.batch_size, MAX_BATCH_SIZE);
        prop_assert_eq!(plan.concurrency, Some(size.div_ceil(MAX_BATCH_SIZE)));
    }

    /// Dispatch hands each chunk to `send` once and reports exactly the failures.
    #[test]
    fn dispatch_reports_failed_chunks(total in 0usize..300, opts in options(), failing in 0usize..7) {
        let events = events(total);
        let plan = BatchPlan::new(total, &opts);
        let seen = Mutex::new(Vec::new());

        let failures = dispatch(&plan, &events, |index, chunk| {
            seen.lock().unwrap().push((index, chunk.len()));
            if index % 7 == failing {
                Err(RequestError::Server("0".into()))
            } else {
                Ok(())
            }
        });

        let mut seen = seen.into_inner().unwrap();
        seen.sort_unstable();
        let expected: Vec<(usize, usize)> =
            plan.ranges().enumerate().map(|(i, r)| (i, r.len())).collect();
        prop_assert_eq!(&seen, &expected);

        let failed: Vec<usize> = failures.iter().map(|f| f.batch_index).collect();
        let expected_failed: Vec<usize> =
            (0..plan.request_count).filter(|i| i % 7 == failing).collect();
        prop_assert_eq!(failed, expected_failed);
    }
}
