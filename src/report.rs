//! Result reporting
//!
//! The [`Reporter`] trait is how a run hands its results back to the caller:
//! `on_result` once per request, in completion order, then `on_done` exactly
//! once after every result has been delivered.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::debug;
use url::Url;

use crate::dispatch::TransportError;
use crate::harness::HarnessError;

/// Outcome of a single request
#[derive(Debug)]
pub struct RunResult {
    /// Set when no response was obtained at all
    pub error: Option<TransportError>,
    /// Status of the response, if one was obtained
    pub actual_status: Option<u16>,
    pub expected_status: u16,
    pub url: Url,
}

/// How a [`RunResult`] compares against its expectation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Mismatch,
    Errored,
}

impl RunResult {
    /// Classify this result
    pub fn outcome(&self) -> Outcome {
        match (&self.error, self.actual_status) {
            (Some(_), _) | (None, None) => Outcome::Errored,
            (None, Some(actual)) if actual == self.expected_status => Outcome::Passed,
            (None, Some(_)) => Outcome::Mismatch,
        }
    }

    pub fn passed(&self) -> bool {
        self.outcome() == Outcome::Passed
    }
}

/// Receives the results of a run
///
/// Results may arrive in any order. Implementations must tolerate being
/// shared across tasks.
pub trait Reporter: Send + Sync {
    /// Called once per request
    fn on_result(&self, result: &RunResult);

    /// Called exactly once, after the last `on_result` of the run
    ///
    /// `error` is set only when the run failed before dispatching (file
    /// discovery, parsing or URL resolution); request failures are reported
    /// through `on_result` alone.
    fn on_done(&self, error: Option<&HarnessError>);
}

/// Reporter built from two closures
pub struct FnReporter<R, D> {
    on_result: R,
    on_done: D,
}

impl<R, D> FnReporter<R, D>
where
    R: Fn(&RunResult) + Send + Sync,
    D: Fn(Option<&HarnessError>) + Send + Sync,
{
    pub fn new(on_result: R, on_done: D) -> Self {
        Self { on_result, on_done }
    }
}

impl<R, D> Reporter for FnReporter<R, D>
where
    R: Fn(&RunResult) + Send + Sync,
    D: Fn(Option<&HarnessError>) + Send + Sync,
{
    fn on_result(&self, result: &RunResult) {
        (self.on_result)(result)
    }

    fn on_done(&self, error: Option<&HarnessError>) {
        (self.on_done)(error)
    }
}

/// Prints one line per result to the terminal and counts failures
///
/// An aborted run is only recorded, not printed: the caller owns the error
/// returned from [`Harness::run`](crate::Harness::run) and reports it once.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    failures: AtomicUsize,
    aborted: AtomicBool,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mismatched or errored results seen so far
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }

    /// Whether the run ended before any request was sent
    pub fn aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    /// Render a result the way it is printed
    pub fn format(result: &RunResult) -> String {
        match (&result.error, result.actual_status) {
            (Some(error), _) => format!("✖ [{}] errored: {error}", result.url),
            (None, Some(actual)) if actual == result.expected_status => {
                format!("✔ ({actual}) {}", result.url)
            }
            (None, Some(actual)) => format!(
                "✖ ({actual}) {} :: expected {}",
                result.url, result.expected_status
            ),
            (None, None) => format!("✖ [{}] errored: no response", result.url),
        }
    }
}

impl Reporter for ConsoleReporter {
    fn on_result(&self, result: &RunResult) {
        let line = Self::format(result);
        if result.passed() {
            println!("{line}");
        } else {
            self.failures.fetch_add(1, Ordering::SeqCst);
            eprintln!("{line}");
        }
    }

    fn on_done(&self, error: Option<&HarnessError>) {
        if let Some(error) = error {
            debug!(error = %error, "Run aborted");
            self.aborted.store(true, Ordering::SeqCst);
        }
    }
}
