//! Request building
//!
//! Turns a [`StatusMapping`] into one [`RequestSpec`] per URL, applying the
//! options shared by every request of a run.

use std::time::Duration;
use url::Url;

use crate::description::StatusMapping;

/// Options applied to every request of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Per-request timeout
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A single GET to issue and the status it should answer with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub url: Url,
    pub expected_status: u16,
    pub timeout: Option<Duration>,
}

/// Build one request per mapping entry, in mapping order
pub fn build_requests(mapping: &StatusMapping, options: &RequestOptions) -> Vec<RequestSpec> {
    mapping
        .iter()
        .map(|(url, expected_status)| RequestSpec {
            url: url.clone(),
            expected_status,
            timeout: options.timeout,
        })
        .collect()
}
