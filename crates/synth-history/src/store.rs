//! Bounded FIFO history store.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use synth_core::VerificationOutcome;

/// Number of outcomes kept by default.
pub const DEFAULT_CAPACITY: usize = 10;

/// Insertion-ordered outcomes, oldest evicted first once full.
#[derive(Debug)]
pub struct History {
    capacity: usize,
    entries: Mutex<VecDeque<VerificationOutcome>>,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// History bounded to `capacity` entries (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append an outcome, evicting the oldest entry when full.
    pub fn record(&self, outcome: VerificationOutcome) {
        let mut entries = self.lock();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        debug!(
            tid = %outcome.tid,
            succeeded = outcome.succeeded,
            kind = %outcome.kind,
            "outcome recorded"
        );
        entries.push_back(outcome);
    }

    /// Most recently recorded outcome.
    pub fn latest(&self) -> Option<VerificationOutcome> {
        self.lock().back().cloned()
    }

    /// Snapshot, oldest to newest.
    pub fn all(&self) -> Vec<VerificationOutcome> {
        self.lock().iter().cloned().collect()
    }

    /// Snapshot, newest to oldest.
    pub fn recent_first(&self) -> Vec<VerificationOutcome> {
        self.lock().iter().rev().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Pass when nothing has been recorded yet or the latest outcome succeeded.
    pub fn is_healthy(&self) -> bool {
        self.lock().back().is_none_or(|o| o.succeeded)
    }

    // Poison is ignored: every critical section is a single deque operation.
    fn lock(&self) -> MutexGuard<'_, VecDeque<VerificationOutcome>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use synth_core::OutcomeKind;

    fn ok(n: i64) -> VerificationOutcome {
        VerificationOutcome::success(format!("tid-{n}"), Utc.timestamp_opt(n, 0).unwrap())
    }

    fn failed(n: i64) -> VerificationOutcome {
        VerificationOutcome::failure(
            OutcomeKind::NotFound,
            format!("tid-{n}"),
            Utc.timestamp_opt(n, 0).unwrap(),
            "Image not found. Response status code: 404.",
        )
    }

    fn tids(outcomes: &[VerificationOutcome]) -> Vec<String> {
        outcomes.iter().map(|o| o.tid.clone()).collect()
    }

    #[test]
    fn empty_history_is_healthy() {
        let history = History::new();
        assert!(history.is_empty());
        assert!(history.latest().is_none());
        assert!(history.is_healthy());
    }

    #[test]
    fn health_follows_latest_outcome() {
        let history = History::new();
        history.record(ok(1));
        assert!(history.is_healthy());
        history.record(failed(2));
        assert!(!history.is_healthy());
        history.record(ok(3));
        assert!(history.is_healthy());
    }

    #[test]
    fn eleventh_record_evicts_the_first() {
        let history = History::new();
        for n in 1..=11 {
            history.record(ok(n));
        }
        assert_eq!(history.len(), 10);

        let all = history.all();
        let expected: Vec<String> = (2..=11).map(|n| format!("tid-{n}")).collect();
        assert_eq!(tids(&all), expected);
    }

    #[test]
    fn never_exceeds_capacity() {
        let history = History::with_capacity(3);
        for n in 0..50 {
            history.record(ok(n));
            assert!(history.len() <= 3);
        }
        assert_eq!(tids(&history.all()), vec!["tid-47", "tid-48", "tid-49"]);
    }

    #[test]
    fn ten_successes_then_failure() {
        let history = History::new();
        for n in 1..=10 {
            history.record(ok(n));
        }
        history.record(failed(11));

        let latest = history.latest().unwrap();
        assert!(!latest.succeeded);
        assert_eq!(latest.tid, "tid-11");

        let all = history.all();
        assert_eq!(all.len(), 10);
        assert_eq!(all.iter().filter(|o| o.succeeded).count(), 9);
        assert_eq!(all[0].tid, "tid-2");
    }

    #[test]
    fn recent_first_reverses_all() {
        let history = History::new();
        for n in 1..=4 {
            history.record(ok(n));
        }
        let mut all = history.all();
        all.reverse();
        assert_eq!(history.recent_first(), all);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let history = History::with_capacity(0);
        history.record(ok(1));
        history.record(ok(2));
        assert_eq!(history.capacity(), 1);
        assert_eq!(tids(&history.all()), vec!["tid-2"]);
    }

    #[test]
    fn concurrent_writers_stay_bounded() {
        let history = Arc::new(History::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let history = Arc::clone(&history);
                std::thread::spawn(move || {
                    for n in 0..100 {
                        history.record(ok(t * 1000 + n));
                        let _ = history.all();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(history.len(), DEFAULT_CAPACITY);
    }
}
