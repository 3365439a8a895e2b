//! Test harness
//!
//! Owns the configuration of a run (description files, inline descriptions,
//! timeout) and drives the pipeline:
//!
//! 1. Collect documents: inline ones first, then every matching file
//! 2. Merge them into one URL -> status mapping
//! 3. Build one request per URL
//! 4. Dispatch concurrently, reporting each result and then completion
//!
//! Failures before dispatch (discovery, parsing, URL resolution) abort the
//! run: the reporter's `on_done` receives the error and no request is sent.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::description::{DescriptionDocument, DescriptionError, merge, parse_documents};
use crate::discovery::{
    DescriptionSource, DiscoveryError, GlobSource, join_globs, unique_patterns,
};
use crate::dispatch::{DispatchOptions, DispatchSummary, Dispatcher};
use crate::report::Reporter;
use crate::request::{RequestOptions, RequestSpec, build_requests};

/// Errors that abort a run before any request is sent
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Description(#[from] DescriptionError),

    #[error("Failed to create HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Options accepted by [`Harness::configure`]
///
/// Every field is optional; see `configure` for how each one combines with
/// earlier configuration.
#[derive(Debug, Clone, Default)]
pub struct HarnessOptions {
    /// One more description file or glob
    pub file: Option<String>,
    /// More description files or globs
    pub files: Vec<String>,
    /// The inline description
    pub description: Option<DescriptionDocument>,
    /// Additional inline descriptions
    pub descriptions: Vec<DescriptionDocument>,
    /// Per-request timeout
    pub timeout: Option<Duration>,
    /// Maximum requests in flight
    pub max_concurrency: Option<usize>,
    /// Follow redirects and report the final status
    pub follow_redirects: Option<bool>,
}

impl HarnessOptions {
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files.extend(files.into_iter().map(Into::into));
        self
    }

    pub fn with_description(mut self, description: DescriptionDocument) -> Self {
        self.description = Some(description);
        self
    }

    pub fn with_descriptions(mut self, descriptions: Vec<DescriptionDocument>) -> Self {
        self.descriptions.extend(descriptions);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = Some(max);
        self
    }

    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = Some(follow);
        self
    }
}

/// Checks a set of endpoints against their expected statuses
#[derive(Clone)]
pub struct Harness {
    files: Vec<String>,
    description: Option<DescriptionDocument>,
    descriptions: Vec<DescriptionDocument>,
    timeout: Option<Duration>,
    dispatch: DispatchOptions,
    source: Arc<dyn DescriptionSource>,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    /// Create an unconfigured harness reading files from the current directory
    pub fn new() -> Self {
        Self::with_source(Arc::new(GlobSource::new()))
    }

    /// Create an unconfigured harness reading files through `source`
    pub fn with_source(source: Arc<dyn DescriptionSource>) -> Self {
        debug!("Creating test harness");
        Self {
            files: Vec::new(),
            description: None,
            descriptions: Vec::new(),
            timeout: None,
            dispatch: DispatchOptions::default(),
            source,
        }
    }

    /// Create a harness and apply `options`
    pub fn from_options(options: HarnessOptions) -> Self {
        let mut harness = Self::new();
        harness.configure(options);
        harness
    }

    /// Apply configuration on top of what is already set
    ///
    /// - `file` and `files` append to the file list
    /// - `description` replaces the inline description
    /// - `descriptions` append to the additional inline descriptions
    /// - `timeout` and `max_concurrency` replace the stored value unless they
    ///   are absent or zero
    /// - `follow_redirects` replaces the stored value when present
    pub fn configure(&mut self, options: HarnessOptions) -> &mut Self {
        debug!("Configuring test harness");

        if let Some(file) = options.file {
            self.files.push(file);
        }
        self.files.extend(options.files);

        if let Some(description) = options.description {
            self.description = Some(description);
        }
        self.descriptions.extend(options.descriptions);

        if let Some(timeout) = options.timeout.filter(|t| !t.is_zero()) {
            self.timeout = Some(timeout);
        }
        if let Some(max) = options.max_concurrency.filter(|&m| m > 0) {
            self.dispatch.max_concurrency = Some(max);
        }
        if let Some(follow) = options.follow_redirects {
            self.dispatch.follow_redirects = follow;
        }

        self
    }

    /// Configured files and globs, as given
    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn description(&self) -> Option<&DescriptionDocument> {
        self.description.as_ref()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Whether redirects are followed
    pub fn follow_redirects(&self) -> bool {
        self.dispatch.follow_redirects
    }

    /// Run every configured check
    ///
    /// Reports each result through `reporter.on_result`, then calls
    /// `reporter.on_done` exactly once. The returned error, if any, is the
    /// same one passed to `on_done`.
    pub async fn run<R>(&self, reporter: &R) -> Result<DispatchSummary, HarnessError>
    where
        R: Reporter + ?Sized,
    {
        let (dispatcher, requests) = match self.prepare().await {
            Ok(prepared) => prepared,
            Err(e) => {
                debug!(error = %e, "Run aborted before dispatch");
                reporter.on_done(Some(&e));
                return Err(e);
            }
        };

        debug!("Sending off requests");
        Ok(dispatcher.dispatch(requests, reporter).await)
    }

    /// Collect, merge and build everything a run needs before sending
    async fn prepare(&self) -> Result<(Dispatcher, Vec<RequestSpec>), HarnessError> {
        let documents = self.collect().await?;

        debug!(documents = documents.len(), "Creating a single url-status mapping");
        let mapping = merge(&documents)?;

        debug!(urls = mapping.len(), timeout = ?self.timeout, "Building requests");
        let options = RequestOptions {
            timeout: self.timeout,
        };
        let requests = build_requests(&mapping, &options);

        let dispatcher = Dispatcher::new(self.dispatch)?;
        Ok((dispatcher, requests))
    }

    /// Inline descriptions followed by every description file
    async fn collect(&self) -> Result<Vec<DescriptionDocument>, HarnessError> {
        let mut documents: Vec<DescriptionDocument> = self
            .description
            .iter()
            .chain(&self.descriptions)
            .cloned()
            .collect();

        if self.files.is_empty() {
            return Ok(documents);
        }

        debug!("Obtaining unique file paths");
        let files = unique_patterns(self.files.iter().cloned());

        let pattern = join_globs(files);
        info!(pattern = %pattern, "Reading description files");
        let contents = self.source.read_all(&pattern).await?;

        debug!(files = contents.len(), "Converting file contents to descriptions");
        documents.extend(parse_documents(&contents)?);

        Ok(documents)
    }
}
