//! Pageup - HTTP status expectations, checked
//!
//! Describe which status each endpoint should answer with, and pageup sends
//! a GET to every one of them concurrently and reports what came back.
//!
//! ## Modules
//!
//! - [`description`] - Description documents and merging them into one mapping
//! - [`request`] - Building requests from a mapping
//! - [`dispatch`] - Sending requests concurrently
//! - [`discovery`] - Finding and reading description files
//! - [`harness`] - Configuration and run orchestration
//! - [`report`] - Receiving results
//! - [`config`] - YAML run configuration
//!
//! ## Example
//!
//! ```no_run
//! use pageup::{DescriptionDocument, FnReporter, Harness, HarnessOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let harness = Harness::from_options(
//!     HarnessOptions::default()
//!         .with_file("tests/*.description.json")
//!         .with_description(DescriptionDocument::new("http://localhost:3000").with_ok("/")),
//! );
//!
//! let reporter = FnReporter::new(
//!     |result| println!("{} -> {:?}", result.url, result.actual_status),
//!     |_| println!("done"),
//! );
//! let summary = harness.run(&reporter).await?;
//! assert!(summary.all_passed());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod description;
pub mod discovery;
pub mod dispatch;
pub mod harness;
pub mod report;
pub mod request;

pub use description::{DescriptionDocument, DescriptionError, StatusMapping, merge};
pub use dispatch::{DispatchOptions, DispatchSummary, Dispatcher, TransportError};
pub use harness::{Harness, HarnessError, HarnessOptions};
pub use report::{ConsoleReporter, FnReporter, Outcome, Reporter, RunResult};
pub use request::{RequestOptions, RequestSpec, build_requests};
