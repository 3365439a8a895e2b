//! Description document type and parsing

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest and highest status codes an HTTP response can carry
const STATUS_RANGE: std::ops::RangeInclusive<u16> = 100..=999;

/// Errors that can occur while reading or resolving descriptions
#[derive(Debug, Error)]
pub enum DescriptionError {
    #[error("Failed to parse description: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid base URL '{baseurl}': {source}")]
    InvalidBaseUrl {
        baseurl: String,
        source: url::ParseError,
    },

    #[error("Cannot resolve endpoint '{endpoint}' against '{baseurl}': {source}")]
    InvalidEndpoint {
        baseurl: String,
        endpoint: String,
        source: url::ParseError,
    },

    #[error("Endpoint '{endpoint}' expects status {status}, which is not an HTTP status code")]
    InvalidStatus { endpoint: String, status: u16 },
}

/// Expectations for the endpoints of one base URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionDocument {
    /// URL every endpoint is resolved against
    pub baseurl: String,

    /// Endpoint (relative or absolute) -> expected status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<IndexMap<String, u16>>,

    /// Endpoints expected to answer 200
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok: Option<Vec<String>>,
}

impl DescriptionDocument {
    /// Create a document with no expectations
    pub fn new(baseurl: impl Into<String>) -> Self {
        Self {
            baseurl: baseurl.into(),
            endpoints: None,
            ok: None,
        }
    }

    /// Expect `status` from `endpoint`
    pub fn with_endpoint(mut self, endpoint: impl Into<String>, status: u16) -> Self {
        self.endpoints
            .get_or_insert_with(IndexMap::new)
            .insert(endpoint.into(), status);
        self
    }

    /// Expect `200 OK` from `endpoint`
    pub fn with_ok(mut self, endpoint: impl Into<String>) -> Self {
        self.ok.get_or_insert_with(Vec::new).push(endpoint.into());
        self
    }

    /// Parse and validate a document from JSON text
    pub fn from_json(json: &str) -> Result<Self, DescriptionError> {
        let document: Self = serde_json::from_str(json)?;
        document.validate()?;
        Ok(document)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String, DescriptionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build a document from command-line shorthand: `[STATUS=]URL`
    ///
    /// `404=example.com/gone` expects 404 from `http://example.com/gone`:
    /// the target itself is the endpoint, so its path is kept. Without a
    /// status prefix the expectation is 200. URLs without a scheme get
    /// `http://`. Returns `None` when the URL part is empty.
    pub fn from_shorthand(arg: &str) -> Option<Self> {
        let (status, baseurl) = match arg.split_once('=') {
            Some((prefix, rest))
                if prefix.len() == 3 && prefix.bytes().all(|b| b.is_ascii_digit()) =>
            {
                (prefix.parse().ok()?, rest)
            }
            _ => (200, arg),
        };

        if baseurl.is_empty() {
            return None;
        }

        let baseurl = if baseurl.contains("://") {
            baseurl.to_string()
        } else {
            format!("http://{baseurl}")
        };

        let endpoint = baseurl.clone();
        Some(Self::new(baseurl).with_endpoint(endpoint, status))
    }

    /// Whether the document maps any endpoint at all
    pub fn is_empty(&self) -> bool {
        self.endpoints.as_ref().is_none_or(IndexMap::is_empty)
            && self.ok.as_ref().is_none_or(Vec::is_empty)
    }

    /// Reject expected statuses that are not HTTP status codes
    pub(crate) fn validate(&self) -> Result<(), DescriptionError> {
        let Some(endpoints) = &self.endpoints else {
            return Ok(());
        };

        match endpoints
            .iter()
            .find(|(_, status)| !STATUS_RANGE.contains(*status))
        {
            Some((endpoint, &status)) => Err(DescriptionError::InvalidStatus {
                endpoint: endpoint.clone(),
                status,
            }),
            None => Ok(()),
        }
    }
}

/// Parse a batch of JSON texts, stopping at the first malformed one
pub fn parse_documents<S: AsRef<str>>(
    texts: &[S],
) -> Result<Vec<DescriptionDocument>, DescriptionError> {
    texts
        .iter()
        .map(|text| DescriptionDocument::from_json(text.as_ref()))
        .collect()
}
