//! Description documents
//!
//! A description document names a base URL and the statuses its endpoints
//! are expected to answer with. Documents are read from JSON files or built
//! inline, then merged into a single [`StatusMapping`].
//!
//! ## Document Format
//!
//! ```json
//! {
//!   "baseurl": "http://localhost:3000",
//!   "endpoints": {
//!     "/404": 404,
//!     "/500": 500
//!   },
//!   "ok": ["/", "/200"]
//! }
//! ```
//!
//! `ok` is shorthand for endpoints expected to answer `200 OK`.

mod document;
mod merge;

pub use document::{DescriptionDocument, DescriptionError, parse_documents};
pub use merge::{StatusMapping, merge};
