//! Description file fixtures

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use pageup::DescriptionDocument;

/// Temporary directory of description files, removed on drop
pub struct DescriptionDir {
    dir: TempDir,
}

impl DescriptionDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create description dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a description as `name`
    pub fn write(&self, name: &str, document: &DescriptionDocument) -> PathBuf {
        let json = document.to_json().expect("serialize description");
        self.write_raw(name, &json)
    }

    /// Write an arbitrary JSON value as `name`
    pub fn write_value(&self, name: &str, value: &serde_json::Value) -> PathBuf {
        self.write_raw(name, &value.to_string())
    }

    /// Write `contents` verbatim as `name`, creating parent directories
    pub fn write_raw(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create fixture parent");
        }
        std::fs::write(&path, contents).expect("write fixture");
        path
    }

    /// Absolute glob for `pattern` inside this directory
    pub fn pattern(&self, pattern: &str) -> String {
        self.dir.path().join(pattern).to_string_lossy().into_owned()
    }
}

impl Default for DescriptionDir {
    fn default() -> Self {
        Self::new()
    }
}
