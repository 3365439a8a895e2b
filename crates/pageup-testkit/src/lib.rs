//! Pageup Test Kit
//!
//! Test infrastructure for pageup.
//!
//! This crate provides:
//! - A local HTTP server answering with fixed status codes
//! - A reporter that records everything it receives
//! - Temporary directories of description files
//!
//! # Example
//!
//! ```rust,no_run
//! use pageup::{DescriptionDocument, Harness, HarnessOptions};
//! use pageup_testkit::{RecordingReporter, StatusServer};
//!
//! # async fn example() {
//! let server = StatusServer::start().await;
//! let harness = Harness::from_options(HarnessOptions::default().with_description(
//!     DescriptionDocument::new(server.base_url()).with_endpoint("/404", 404),
//! ));
//!
//! let reporter = RecordingReporter::new();
//! harness.run(&reporter).await.unwrap();
//! assert!(reporter.completed_once());
//! # }
//! ```

pub mod fixtures;
pub mod reporter;
pub mod server;

// Re-exports for convenience
pub use fixtures::DescriptionDir;
pub use reporter::{RecordedResult, RecordingReporter};
pub use server::{SLOW_DELAY, StatusServer, unreachable_url};
