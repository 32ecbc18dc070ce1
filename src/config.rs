//! Runtime configuration for the git-data service.
//!
//! The service never reads settings on its own; a configuration provider
//! (the CLI here, an editor host elsewhere) builds a `Config` and hands it to
//! `GitService::new` or `GitService::on_configuration_changed`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GitError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Keep per-file blame/log/diff results in memory
    pub caching_enabled: bool,
    /// Short-circuit blame/log queries for files matched by the root `.gitignore`
    pub respect_gitignore: bool,
    /// Explicit git executable; otherwise `PATH` is searched
    pub git_path: Option<PathBuf>,
    /// Page size used when a log query does not specify one (0 = unbounded)
    pub default_max_log_count: usize,
    /// Pass `-w` to blame
    pub blame_ignore_whitespace: bool,
    /// Serve revision-scoped blame/log queries from an already cached
    /// whole-file result when it contains the revision
    pub reuse_whole_file_results: bool,
    /// Force status porcelain v2 (`Some(true)`) or v1 (`Some(false)`)
    pub use_status_v2: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            caching_enabled: true,
            respect_gitignore: true,
            git_path: None,
            default_max_log_count: 200,
            blame_ignore_whitespace: false,
            reuse_whole_file_results: true,
            use_status_v2: None,
        }
    }
}

impl Config {
    /// Load a JSON config file. Missing keys fall back to defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| GitError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn max_log_count(&self, requested: Option<usize>) -> Option<usize> {
        match requested.unwrap_or(self.default_max_log_count) {
            0 => None,
            n => Some(n),
        }
    }
}
