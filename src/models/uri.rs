//! Location of a file within a repository, optionally pinned to a revision.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::commit::shorten_sha;
use crate::git::paths;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GitUri {
    pub repo_path: String,
    /// Repo-relative, forward-slash separated
    pub file_name: String,
    pub sha: Option<String>,
}

impl GitUri {
    pub fn new(repo_path: &str, file_name: &str, sha: Option<&str>) -> Self {
        let repo_path = paths::normalize_path(repo_path);
        let file_name = paths::relative_to(file_name, &repo_path);
        Self {
            repo_path,
            file_name,
            sha: sha.filter(|s| !s.is_empty()).map(str::to_string),
        }
    }

    /// Absolute path on disk
    pub fn fs_path(&self) -> PathBuf {
        PathBuf::from(paths::join(&self.repo_path, &self.file_name))
    }

    /// Key of the document cache entry for this file
    pub fn cache_key(&self) -> String {
        paths::to_cache_key(&paths::join(&self.repo_path, &self.file_name))
    }

    pub fn short_sha(&self) -> Option<String> {
        self.sha.as_deref().map(shorten_sha)
    }

    pub fn with_sha(&self, sha: Option<&str>) -> Self {
        Self {
            sha: sha.map(str::to_string),
            ..self.clone()
        }
    }
}

impl fmt::Display for GitUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sha {
            Some(sha) => write!(f, "{}@{}", self.file_name, shorten_sha(sha)),
            None => write!(f, "{}", self.file_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_file_becomes_relative() {
        let uri = GitUri::new("/work/repo", "/work/repo/src/Main.rs", None);
        assert_eq!(uri.repo_path, "/work/repo");
        assert_eq!(uri.file_name, "src/Main.rs");
        assert_eq!(uri.fs_path(), PathBuf::from("/work/repo/src/Main.rs"));
    }

    #[test]
    fn cache_key_is_case_insensitive() {
        let a = GitUri::new("/work/Repo", "src/Main.rs", None);
        let b = GitUri::new("/work/repo", "SRC/main.rs", Some("abc"));
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn windows_separators_are_normalized() {
        let uri = GitUri::new("C:\\work\\repo", "C:\\work\\repo\\src\\lib.rs", None);
        assert_eq!(uri.repo_path, "C:/work/repo");
        assert_eq!(uri.file_name, "src/lib.rs");
    }

    #[test]
    fn empty_sha_means_working_file() {
        let uri = GitUri::new("/r", "a.txt", Some(""));
        assert!(uri.sha.is_none());
        assert_eq!(uri.to_string(), "a.txt");
    }
}
