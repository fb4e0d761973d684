//! Ordering, backpressure and failure behavior of the executor through the
//! public library API.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use cltool_lib::CltoolError;
use cltool_lib::executor::{
    InputSequencer, IterSource, OrderedExecutor, OutputSink, QUEUE_SLOTS_PER_THREAD, Task,
};
use proptest::prelude::*;
use rstest::rstest;

#[test]
fn test_short_words_finish_first_but_are_written_last() {
    let words = ["aaaaa", "bbbb", "ccc", "dd", "e"];
    let executor = OrderedExecutor::new(3).unwrap();
    let mut out: Vec<String> = Vec::new();

    let summary = executor
        .run(
            &IterSource::new(words),
            &|word: &str| {
                let word = word.to_string();
                Task::new(move || {
                    thread::sleep(Duration::from_millis(10 * (6 - word.len() as u64)));
                    Ok(word.to_uppercase())
                })
            },
            &mut out,
        )
        .unwrap();

    assert_eq!(out, ["AAAAA", "BBBB", "CCC", "DD", "E"]);
    assert_eq!(summary.inputs, 5);
    assert_eq!(summary.outputs, 5);
}

/// Sink that records the largest number of started but unwritten tasks.
struct InFlightSink {
    started: Arc<AtomicU64>,
    written: u64,
    max_in_flight: u64,
}

impl OutputSink<u64> for InFlightSink {
    fn write(&mut self, result: u64) -> io::Result<()> {
        assert_eq!(result, self.written);
        let in_flight = self.started.load(Ordering::SeqCst) - self.written;
        self.max_in_flight = self.max_in_flight.max(in_flight);
        self.written += 1;
        Ok(())
    }
}

#[rstest]
#[case(2)]
#[case(4)]
#[case(8)]
fn test_started_tasks_are_bounded_by_buffer(#[case] threads: usize) {
    let started = Arc::new(AtomicU64::new(0));
    let executor = OrderedExecutor::new(threads).unwrap();
    let mut sink = InFlightSink { started: Arc::clone(&started), written: 0, max_in_flight: 0 };

    let summary = executor
        .run(
            &IterSource::new(0..2_000u64),
            &|i: u64| {
                let started = Arc::clone(&started);
                Task::new(move || {
                    started.fetch_add(1, Ordering::SeqCst);
                    // The first task is slow so the buffer fills up behind it.
                    if i == 0 {
                        thread::sleep(Duration::from_millis(50));
                    }
                    Ok(i)
                })
            },
            &mut sink,
        )
        .unwrap();

    let bound = (QUEUE_SLOTS_PER_THREAD * threads + 1) as u64;
    assert_eq!(sink.written, 2_000);
    assert!(sink.max_in_flight <= bound, "{} in flight with bound {bound}", sink.max_in_flight);
    assert!(summary.peak_queue_depth <= QUEUE_SLOTS_PER_THREAD * threads);
}

#[rstest]
#[case(1)]
#[case(4)]
fn test_failed_task_stops_the_run(#[case] threads: usize) {
    let executed = Arc::new(AtomicUsize::new(0));
    let executor = OrderedExecutor::new(threads).unwrap();
    let mut out: Vec<u64> = Vec::new();

    let err = executor
        .run(
            &IterSource::new(0..100_000u64),
            &|i: u64| {
                let executed = Arc::clone(&executed);
                Task::new(move || {
                    executed.fetch_add(1, Ordering::SeqCst);
                    anyhow::ensure!(i != 50, "bad record {i}");
                    Ok(i)
                })
            },
            &mut out,
        )
        .unwrap_err();

    assert!(matches!(err, CltoolError::TaskFailed { index: 50, .. }), "{err:?}");
    assert_eq!(out, (0..50).collect::<Vec<_>>());
    assert!(executed.load(Ordering::SeqCst) < 1_000);
}

#[test]
fn test_panicking_task_is_reported_with_its_index() {
    let executor = OrderedExecutor::new(3).unwrap();
    let mut out: Vec<u64> = Vec::new();

    let err = executor
        .run(
            &IterSource::new(0..20u64),
            &|i: u64| {
                Task::new(move || {
                    assert!(i != 7, "boom at {i}");
                    Ok(i)
                })
            },
            &mut out,
        )
        .unwrap_err();

    match err {
        CltoolError::TaskPanicked { index, message } => {
            assert_eq!(index, 7);
            assert!(message.contains("boom at 7"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(out, (0..7).collect::<Vec<_>>());
}

/// Source that yields `good` items and then fails.
struct FailingSource {
    next: AtomicU64,
    good: u64,
}

impl InputSequencer for FailingSource {
    type Item = u64;

    fn next_input(&self) -> io::Result<Option<u64>> {
        let i = self.next.fetch_add(1, Ordering::SeqCst);
        if i < self.good {
            Ok(Some(i))
        } else {
            Err(io::Error::new(io::ErrorKind::InvalidData, "truncated input"))
        }
    }
}

#[rstest]
#[case(1)]
#[case(6)]
fn test_input_error_after_earlier_results_are_written(#[case] threads: usize) {
    let source = FailingSource { next: AtomicU64::new(0), good: 30 };
    let executor = OrderedExecutor::new(threads).unwrap();
    let mut out: Vec<u64> = Vec::new();

    let err = executor.run(&source, &|i: u64| Task::new(move || Ok(i * 2)), &mut out).unwrap_err();

    assert!(matches!(err, CltoolError::Input(_)), "{err:?}");
    assert_eq!(out, (0..30).map(|i| i * 2).collect::<Vec<_>>());
}

fn delayed_run(threads: usize, delays: &[u8]) -> Vec<usize> {
    let executor = OrderedExecutor::new(threads).unwrap();
    let mut out = Vec::new();
    executor
        .run(
            &IterSource::new(delays.iter().copied().enumerate()),
            &|(i, delay): (usize, u8)| {
                Task::new(move || {
                    thread::sleep(Duration::from_micros(u64::from(delay) * 20));
                    Ok(i)
                })
            },
            &mut out,
        )
        .unwrap();
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_output_order_matches_input_order(
        threads in prop::sample::select(vec![1usize, 2, 8]),
        delays in prop::collection::vec(any::<u8>(), 0..120),
    ) {
        let expected: Vec<usize> = (0..delays.len()).collect();
        prop_assert_eq!(delayed_run(threads, &delays), expected);
    }
}
