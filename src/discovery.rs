//! Description file discovery
//!
//! File patterns configured on a harness are deduplicated, joined into one
//! [`CompositePattern`], and handed to a [`DescriptionSource`] that returns
//! the text of every matching file.

use async_trait::async_trait;
use indexmap::IndexSet;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while finding or reading description files
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Failed to match files: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Remove duplicate patterns, keeping the first occurrence of each
pub fn unique_patterns<I, S>(patterns: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    patterns
        .into_iter()
        .map(Into::into)
        .collect::<IndexSet<String>>()
        .into_iter()
        .collect()
}

/// Combine patterns into one that matches anything any of them match
pub fn join_globs(patterns: Vec<String>) -> CompositePattern {
    CompositePattern { patterns }
}

/// A set of glob patterns matched as one
///
/// Displays in extglob form, `*(a.json|b/*.json)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositePattern {
    patterns: Vec<String>,
}

impl CompositePattern {
    /// Member patterns, in order
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl fmt::Display for CompositePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "*({})", self.patterns.join("|"))
    }
}

/// Provides the raw text of description files
#[async_trait]
pub trait DescriptionSource: Send + Sync {
    /// Read every file matching `pattern`, in a stable order
    async fn read_all(&self, pattern: &CompositePattern) -> Result<Vec<String>, DiscoveryError>;
}

/// Reads description files from the local filesystem
#[derive(Debug, Clone, Default)]
pub struct GlobSource {
    /// Directory relative patterns are matched from (None = current directory)
    root: Option<PathBuf>,
}

impl GlobSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match relative patterns from `root` instead of the current directory
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// Expand a composite pattern into a sorted, duplicate-free list of files
    pub fn expand(&self, pattern: &CompositePattern) -> Result<Vec<PathBuf>, DiscoveryError> {
        let mut paths = BTreeSet::new();

        for member in pattern.patterns() {
            let full = match &self.root {
                Some(root) if Path::new(member).is_relative() => {
                    root.join(member).to_string_lossy().into_owned()
                }
                _ => member.clone(),
            };

            let before = paths.len();
            for entry in glob::glob(&full)? {
                let path = entry?;
                if path.is_file() {
                    paths.insert(path);
                }
            }

            if paths.len() == before {
                warn!(pattern = %member, "Pattern matched no new files");
            }
        }

        Ok(paths.into_iter().collect())
    }
}

#[async_trait]
impl DescriptionSource for GlobSource {
    async fn read_all(&self, pattern: &CompositePattern) -> Result<Vec<String>, DiscoveryError> {
        let paths = self.expand(pattern)?;
        debug!(pattern = %pattern, files = paths.len(), "Reading description files");

        let mut contents = Vec::with_capacity(paths.len());
        for path in paths {
            let text = tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| DiscoveryError::Io {
                    path: path.clone(),
                    source,
                })?;
            contents.push(text);
        }

        Ok(contents)
    }
}
