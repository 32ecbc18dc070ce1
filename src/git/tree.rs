//! Versioned content and repository discovery on `GitService`.

use std::io::ErrorKind;
use std::path::Path;

use super::commands;
use super::paths;
use super::runner::decode;
use super::service::GitService;
use crate::error::{GitError, Result};
use crate::models::{GitTreeEntry, GitUri, is_staged_uncommitted, is_uncommitted};
use crate::parsers;

impl GitService {
    /// File contents at `uri.sha`. The working-tree sentinel (or no revision)
    /// reads the file from disk; the index sentinel reads the staged blob.
    /// `None` when the file does not exist at that revision.
    pub async fn get_versioned_file(&self, uri: &GitUri) -> Result<Option<Vec<u8>>> {
        let sha = match uri.sha.as_deref() {
            Some(sha) if is_staged_uncommitted(sha) || !is_uncommitted(sha) => sha,
            _ => {
                return match tokio::fs::read(uri.fs_path()).await {
                    Ok(bytes) => Ok(Some(bytes)),
                    Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                    Err(e) => Err(e.into()),
                };
            }
        };

        if paths::is_absolute(&uri.file_name) {
            return Err(GitError::InvalidPath(format!("{} is outside {}", uri.file_name, uri.repo_path)));
        }
        let args = commands::show_file(&uri.file_name, sha);
        let bytes = self.runner.run_binary(Path::new(&uri.repo_path), &args).await?;
        if bytes.is_empty() {
            tracing::debug!(file = %uri, "No content at revision");
            return Ok(None);
        }
        Ok(Some(bytes))
    }

    /// Like `get_versioned_file`, decoded with `encoding` (UTF-8 by default)
    pub async fn get_versioned_file_text(&self, uri: &GitUri, encoding: Option<&str>) -> Result<Option<String>> {
        let bytes = self.get_versioned_file(uri).await?;
        Ok(bytes.map(|b| decode(&b, encoding)))
    }

    /// Entries of the tree at `sha`, optionally limited to `path`
    pub async fn get_tree_for_revision(
        &self,
        repo_path: &str,
        sha: &str,
        path: Option<&str>,
    ) -> Result<Vec<GitTreeEntry>> {
        if sha.is_empty() || sha.starts_with('-') || sha.chars().any(char::is_whitespace) {
            return Err(GitError::InvalidRevision(sha.to_string()));
        }
        let args = commands::ls_tree(sha, path);
        let data = self.runner.run(Path::new(repo_path), &args).await?;
        Ok(parsers::tree::parse(&data))
    }

    /// Whether the index (or `uri.sha`, when set) knows the file
    pub async fn is_tracked(&self, uri: &GitUri) -> Result<bool> {
        let args = commands::ls_files(&uri.file_name, uri.sha.as_deref());
        let data = self.runner.run(Path::new(&uri.repo_path), &args).await?;
        Ok(!data.trim().is_empty())
    }

    /// Working-tree root containing `path` (a file or directory), or `None`
    /// outside any repository. Cached per directory.
    pub async fn get_repo_path(&self, path: &Path) -> Result<Option<String>> {
        let dir = if path.is_dir() {
            path
        } else {
            path.parent().unwrap_or(path)
        };
        if !dir.is_dir() {
            return Err(GitError::PathNotFound(path.display().to_string()));
        }

        let key = paths::to_cache_key(&dir.to_string_lossy());
        let caching = self.caching_enabled();
        if caching {
            if let Some(found) = self.repo_paths.lock().get(&key) {
                return Ok(found.clone());
            }
        }

        let data = self.runner.run(dir, &commands::show_toplevel()).await?;
        let found = match data.trim() {
            "" => None,
            root => Some(paths::normalize_path(root)),
        };
        tracing::debug!(dir = %dir.display(), repo = ?found, "Resolved repository root");

        if caching {
            self.repo_paths.lock().insert(key, found.clone());
        }
        Ok(found)
    }
}
