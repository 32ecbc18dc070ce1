use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Directory,
    Symlink,
    Submodule,
}

/// One row of `git ls-tree -l`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitTreeEntry {
    pub path: String,
    pub sha: String,
    pub mode: String,
    pub entry_type: EntryType,
    /// Blob size; `None` for trees and submodules
    pub size: Option<u64>,
}

impl GitTreeEntry {
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}
