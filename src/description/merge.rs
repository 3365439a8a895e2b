//! Description merging
//!
//! Folds an ordered sequence of documents into one absolute URL -> status
//! table. Writes are last-wins: a later document overrides an earlier one for
//! the same resolved URL, and inside one document `ok` is applied after
//! `endpoints`.

use indexmap::IndexMap;
use tracing::debug;
use url::Url;

use super::document::{DescriptionDocument, DescriptionError};

/// Status expected for `ok` entries
const OK: u16 = 200;

/// Absolute URL -> expected status
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusMapping {
    entries: IndexMap<Url, u16>,
}

impl StatusMapping {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the expected status for a URL, replacing any previous expectation
    pub fn insert(&mut self, url: Url, status: u16) -> Option<u16> {
        self.entries.insert(url, status)
    }

    /// Expected status for an absolute URL
    pub fn get(&self, url: &str) -> Option<u16> {
        let url = Url::parse(url).ok()?;
        self.entries.get(&url).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in first-insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&Url, u16)> {
        self.entries.iter().map(|(url, status)| (url, *status))
    }

    /// Apply one document on top of this mapping
    fn apply(&mut self, document: &DescriptionDocument) -> Result<(), DescriptionError> {
        if document.is_empty() {
            return Ok(());
        }
        document.validate()?;

        let base = Url::parse(&document.baseurl).map_err(|source| {
            DescriptionError::InvalidBaseUrl {
                baseurl: document.baseurl.clone(),
                source,
            }
        })?;

        let endpoints = document.endpoints.iter().flatten();
        let ok = document.ok.iter().flatten().map(|endpoint| (endpoint, &OK));

        for (endpoint, &status) in endpoints.chain(ok) {
            let url = resolve(&base, endpoint)?;
            match self.insert(url, status) {
                Some(previous) if previous != status => debug!(
                    baseurl = %document.baseurl,
                    endpoint = %endpoint,
                    previous,
                    status,
                    "Overriding earlier expectation"
                ),
                _ => {}
            }
        }

        Ok(())
    }
}

impl<'a> IntoIterator for &'a StatusMapping {
    type Item = (&'a Url, &'a u16);
    type IntoIter = indexmap::map::Iter<'a, Url, u16>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Resolve an endpoint against a base URL
///
/// Relative paths combine with the base; absolute URLs pass through.
fn resolve(base: &Url, endpoint: &str) -> Result<Url, DescriptionError> {
    base.join(endpoint)
        .map_err(|source| DescriptionError::InvalidEndpoint {
            baseurl: base.to_string(),
            endpoint: endpoint.to_string(),
            source,
        })
}

/// Merge documents, in order, into a single mapping
pub fn merge<'a, I>(documents: I) -> Result<StatusMapping, DescriptionError>
where
    I: IntoIterator<Item = &'a DescriptionDocument>,
{
    let mut mapping = StatusMapping::new();
    for document in documents {
        mapping.apply(document)?;
    }
    Ok(mapping)
}
