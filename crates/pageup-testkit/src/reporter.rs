//! Recording reporter
//!
//! Keeps every result and completion it receives so tests can assert on
//! counts and ordering after a run.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use pageup::{HarnessError, Outcome, Reporter, RunResult};

/// Owned copy of a [`RunResult`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedResult {
    pub error: Option<String>,
    pub actual_status: Option<u16>,
    pub expected_status: u16,
    pub url: String,
    pub outcome: Outcome,
}

/// Reporter that records everything
#[derive(Debug, Default)]
pub struct RecordingReporter {
    results: Mutex<Vec<RecordedResult>>,
    done: Mutex<Vec<Option<String>>>,
    result_after_done: AtomicBool,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Results in the order they arrived
    pub fn results(&self) -> Vec<RecordedResult> {
        self.results.lock().clone()
    }

    /// Result recorded for `url`, if any
    pub fn result_for(&self, url: &str) -> Option<RecordedResult> {
        self.results.lock().iter().find(|r| r.url == url).cloned()
    }

    /// Error messages passed to each `on_done` call
    pub fn done_calls(&self) -> Vec<Option<String>> {
        self.done.lock().clone()
    }

    /// Whether `on_done` fired exactly once and nothing arrived after it
    pub fn completed_once(&self) -> bool {
        self.done.lock().len() == 1 && !self.result_after_done.load(Ordering::SeqCst)
    }
}

impl Reporter for RecordingReporter {
    fn on_result(&self, result: &RunResult) {
        if !self.done.lock().is_empty() {
            self.result_after_done.store(true, Ordering::SeqCst);
        }

        self.results.lock().push(RecordedResult {
            error: result.error.as_ref().map(|e| e.to_string()),
            actual_status: result.actual_status,
            expected_status: result.expected_status,
            url: result.url.to_string(),
            outcome: result.outcome(),
        });
    }

    fn on_done(&self, error: Option<&HarnessError>) {
        self.done.lock().push(error.map(|e| e.to_string()));
    }
}
