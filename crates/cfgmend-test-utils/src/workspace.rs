//! [`TestWorkspace`] - a temporary directory holding patch inputs.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::fixtures;

/// A temporary directory with helpers for writing patch inputs and reading
/// results back.
///
/// # Example
///
/// ```rust,no_run
/// use cfgmend_test_utils::workspace::TestWorkspace;
///
/// let ws = TestWorkspace::with_fixtures();
/// assert!(ws.path("current.toml").exists());
/// ```
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorkspace {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Create a workspace holding `template.toml`, `current.toml` and
    /// `edits.toml` from [`fixtures`].
    pub fn with_fixtures() -> Self {
        let ws = Self::new();
        ws.write("template.toml", fixtures::TEMPLATE);
        ws.write("current.toml", fixtures::CURRENT);
        ws.write("edits.toml", fixtures::EDITS);
        ws
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `name` inside the workspace.
    pub fn path(&self, name: &str) -> PathBuf {
        self.root().join(name)
    }

    /// Write `content` to `name`, returning the full path.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("Could not write {}: {e}", path.display()));
        path
    }

    /// Read `name` back as text.
    ///
    /// # Panics
    /// Panics if the file cannot be read.
    pub fn read(&self, name: &str) -> String {
        let path = self.path(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", path.display()))
    }
}
