//! Request dispatch
//!
//! Sends every [`RequestSpec`] concurrently and reports each outcome.
//!
//! Any HTTP response counts as a transport success, whatever its status, so
//! that expectations such as `404` can be checked. Only a missing response
//! (connection refused, DNS failure, timeout) is a [`TransportError`].
//!
//! Requests are driven as a stream with `buffer_unordered`, polled from the
//! calling task. Completions are therefore handled one at a time, and the
//! reporter's `on_done` fires once, after the stream is drained.

use futures::stream::{self, StreamExt};
use reqwest::Client;
use reqwest::redirect::Policy;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::report::{Outcome, Reporter, RunResult};
use crate::request::RequestSpec;

/// Failure to obtain any response for a request
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("Connection failed: {0}")]
    Connect(#[source] reqwest::Error),

    #[error("HTTP request failed: {0}")]
    Request(#[source] reqwest::Error),
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            TransportError::Timeout(error)
        } else if error.is_connect() {
            TransportError::Connect(error)
        } else {
            TransportError::Request(error)
        }
    }
}

/// Options for dispatching a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Maximum requests in flight (None = all at once)
    pub max_concurrency: Option<usize>,
    /// Follow redirects and report the final status
    pub follow_redirects: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            max_concurrency: None,
            follow_redirects: true,
        }
    }
}

impl DispatchOptions {
    /// Set maximum concurrency
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = Some(max);
        self
    }

    /// Set whether redirects are followed
    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }
}

/// Tally of a finished dispatch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub total: usize,
    pub passed: usize,
    pub mismatched: usize,
    pub errored: usize,
}

impl DispatchSummary {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Passed => self.passed += 1,
            Outcome::Mismatch => self.mismatched += 1,
            Outcome::Errored => self.errored += 1,
        }
    }

    /// Whether every request answered with its expected status
    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }
}

/// Issues GET requests and reports their outcomes
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: Client,
    opts: DispatchOptions,
}

impl Dispatcher {
    /// Create a dispatcher with its own HTTP client
    ///
    /// Redirects are followed unless `opts.follow_redirects` is off, in which
    /// case a `301` expectation is checked against the redirect itself.
    pub fn new(opts: DispatchOptions) -> Result<Self, reqwest::Error> {
        let policy = if opts.follow_redirects {
            Policy::default()
        } else {
            Policy::none()
        };
        let client = Client::builder().redirect(policy).build()?;
        Ok(Self::with_client(client, opts))
    }

    /// Create a dispatcher with a custom HTTP client
    pub fn with_client(client: Client, opts: DispatchOptions) -> Self {
        Self { client, opts }
    }

    /// Send every request and report each outcome, then signal completion
    pub async fn dispatch<R>(&self, requests: Vec<RequestSpec>, reporter: &R) -> DispatchSummary
    where
        R: Reporter + ?Sized,
    {
        let mut summary = DispatchSummary {
            total: requests.len(),
            ..Default::default()
        };

        if requests.is_empty() {
            debug!("No requests to send");
            reporter.on_done(None);
            return summary;
        }

        let limit = self.opts.max_concurrency.unwrap_or(summary.total).max(1);
        info!(
            requests = summary.total,
            concurrency = limit,
            "Sending requests"
        );

        let mut outstanding = summary.total;
        let mut results = stream::iter(requests)
            .map(|spec| self.send(spec))
            .buffer_unordered(limit);

        while let Some(result) = results.next().await {
            summary.record(result.outcome());
            reporter.on_result(&result);

            outstanding -= 1;
            trace!(outstanding, "Request finished");
        }

        info!(
            passed = summary.passed,
            mismatched = summary.mismatched,
            errored = summary.errored,
            "All requests finished"
        );
        reporter.on_done(None);
        summary
    }

    async fn send(&self, spec: RequestSpec) -> RunResult {
        let mut request = self.client.get(spec.url.clone());
        if let Some(timeout) = spec.timeout {
            request = request.timeout(timeout);
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                debug!(
                    url = %spec.url,
                    status,
                    expected = spec.expected_status,
                    "Response received"
                );
                RunResult {
                    error: None,
                    actual_status: Some(status),
                    expected_status: spec.expected_status,
                    url: spec.url,
                }
            }
            Err(e) => {
                let error = TransportError::from(e);
                warn!(url = %spec.url, error = %error, "No response");
                RunResult {
                    error: Some(error),
                    actual_status: None,
                    expected_status: spec.expected_status,
                    url: spec.url,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::HarnessError;
    use std::sync::Mutex;
    use std::time::Duration;
    use url::Url;

    #[derive(Default)]
    struct Recorder {
        results: Mutex<Vec<(bool, Option<u16>, u16)>>,
        done: Mutex<usize>,
    }

    impl Reporter for Recorder {
        fn on_result(&self, result: &RunResult) {
            assert_eq!(*self.done.lock().unwrap(), 0, "result after completion");
            self.results.lock().unwrap().push((
                result.error.is_some(),
                result.actual_status,
                result.expected_status,
            ));
        }

        fn on_done(&self, error: Option<&HarnessError>) {
            assert!(error.is_none());
            *self.done.lock().unwrap() += 1;
        }
    }

    /// A local URL nothing is listening on
    fn closed_url() -> Url {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap()
    }

    #[tokio::test]
    async fn test_no_requests_still_completes() {
        let dispatcher = Dispatcher::new(DispatchOptions::default()).unwrap();
        let recorder = Recorder::default();

        let summary = dispatcher.dispatch(Vec::new(), &recorder).await;

        assert_eq!(summary, DispatchSummary::default());
        assert!(recorder.results.lock().unwrap().is_empty());
        assert_eq!(*recorder.done.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_is_transport_error() {
        let dispatcher = Dispatcher::new(DispatchOptions::default()).unwrap();
        let recorder = Recorder::default();

        let requests = vec![RequestSpec {
            url: closed_url(),
            expected_status: 200,
            timeout: Some(Duration::from_secs(5)),
        }];
        let summary = dispatcher.dispatch(requests, &recorder).await;

        assert_eq!(summary.errored, 1);
        assert!(!summary.all_passed());
        assert_eq!(*recorder.results.lock().unwrap(), vec![(true, None, 200)]);
        assert_eq!(*recorder.done.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrency_limit_still_reports_all() {
        let dispatcher =
            Dispatcher::new(DispatchOptions::default().with_max_concurrency(1)).unwrap();
        let recorder = Recorder::default();

        let requests = (0..3)
            .map(|i| RequestSpec {
                url: closed_url(),
                expected_status: 200 + i,
                timeout: None,
            })
            .collect();
        let summary = dispatcher.dispatch(requests, &recorder).await;

        assert_eq!(summary.total, 3);
        assert_eq!(recorder.results.lock().unwrap().len(), 3);
        assert_eq!(*recorder.done.lock().unwrap(), 1);
    }

    #[test]
    fn test_redirects_followed_by_default() {
        assert!(DispatchOptions::default().follow_redirects);
        assert!(
            !DispatchOptions::default()
                .with_follow_redirects(false)
                .follow_redirects
        );
    }

    #[test]
    fn test_summary_all_passed() {
        let mut summary = DispatchSummary {
            total: 2,
            ..Default::default()
        };
        summary.record(Outcome::Passed);
        assert!(!summary.all_passed());
        summary.record(Outcome::Passed);
        assert!(summary.all_passed());
    }
}
