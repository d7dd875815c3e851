//! Test progress aggregation.
//!
//! The board folds a stream of per-test state reports into the summary the
//! commander window displays: the worst state seen so far, monotonic
//! executed/failed counters, and a most-recent-first table of tests. A
//! single test may report the same state many times (retries, re-runs of
//! the notification); counters only move on actual state transitions.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use xoanon_core::{ApplicationInfo, TestInfo, TestState};

/// An immutable copy of the board, safe to render or assert on without
/// holding any lock.
#[derive(Clone, Debug)]
pub struct ProgressSnapshot {
    pub worst: TestState,
    pub total: u64,
    pub executed: u64,
    pub failed: u64,
    pub rows: Vec<TestInfo>,
    pub application: Option<ApplicationInfo>,
    pub elapsed: Duration,
}

pub struct ProgressBoard {
    worst: TestState,
    total: u64,
    executed: u64,
    failed: u64,
    states: HashMap<String, TestState>,
    rows: Vec<TestInfo>,
    application: Option<ApplicationInfo>,
    started: Instant,
}

impl ProgressBoard {
    pub fn new() -> Self {
        Self {
            worst: TestState::Initial,
            total: 0,
            executed: 0,
            failed: 0,
            states: HashMap::new(),
            rows: Vec::new(),
            application: None,
            started: Instant::now(),
        }
    }

    /// Fold one test report into the board.
    pub fn observe(&mut self, test: TestInfo) {
        let previous = self.states.insert(test.id.clone(), test.state);
        if previous != Some(test.state) {
            match test.state {
                TestState::Running => self.executed += 1,
                TestState::Failed => self.failed += 1,
                TestState::Initial | TestState::Succeeded => {}
            }
        }

        // Once anything has failed, the run as a whole stays failed.
        if self.worst != TestState::Failed {
            self.worst = test.state;
        }

        self.rows.retain(|row| row.name != test.name);
        self.rows.push(test);
        self.rows.sort_by(|a, b| b.time.cmp(&a.time));
    }

    /// The expected number of tests in the run, used for the progress
    /// fraction. Zero means unknown.
    pub fn set_total(&mut self, total: u64) {
        self.total = total;
    }

    pub fn set_application(&mut self, info: ApplicationInfo) {
        self.application = Some(info);
    }

    pub fn worst(&self) -> TestState {
        self.worst
    }

    /// Fraction of the expected tests that have started, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.executed as f64 / self.total as f64).min(1.0)
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            worst: self.worst,
            total: self.total,
            executed: self.executed,
            failed: self.failed,
            rows: self.rows.clone(),
            application: self.application.clone(),
            elapsed: self.started.elapsed(),
        }
    }
}

impl Default for ProgressBoard {
    fn default() -> Self {
        Self::new()
    }
}
