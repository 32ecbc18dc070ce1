//! Diff queries on `GitService`.
//!
//! File diffs are cached per document under `diff:<sha1>:<sha2>`, where an
//! unset side is left empty. Name-status summaries are repository-wide and
//! not cached.

use std::path::Path;
use std::sync::Arc;

use futures::FutureExt;

use super::cache::QueryResult;
use super::commands;
use super::runner::GitRunner;
use super::service::GitService;
use crate::error::{GitError, Result};
use crate::models::{DiffLinePair, FileChange, GitDiff, GitUri};
use crate::parsers;

fn diff_slot(sha1: Option<&str>, sha2: Option<&str>) -> String {
    format!("diff:{}:{}", sha1.unwrap_or_default(), sha2.unwrap_or_default())
}

async fn diff_query(runner: Arc<GitRunner>, cwd: String, args: Vec<String>) -> QueryResult<GitDiff> {
    let data = runner
        .run(Path::new(&cwd), &args)
        .await
        .map_err(GitError::into_shared)?;
    Ok(parsers::diff::parse(&data).map(Arc::new))
}

impl GitService {
    /// Unified diff of one file between two revisions. With only `sha1` the
    /// working tree is the changed side; with neither, the index is compared
    /// with the working tree.
    pub async fn get_diff_for_file(
        &self,
        repo_path: &str,
        file_name: &str,
        sha1: Option<&str>,
        sha2: Option<&str>,
    ) -> Result<Option<Arc<GitDiff>>> {
        let uri = GitUri::new(repo_path, file_name, None);
        let slot = diff_slot(sha1, sha2);
        let args = commands::diff_for_file(&uri.file_name, sha1, sha2);
        let runner = self.runner.clone();
        let cwd = uri.repo_path.clone();
        self.cached_query(&uri, &slot, move || diff_query(runner, cwd, args).boxed())
            .await
    }

    /// Original and changed content of one 0-based line, if a hunk covers it
    pub async fn get_diff_for_line(
        &self,
        uri: &GitUri,
        line: usize,
        sha1: Option<&str>,
        sha2: Option<&str>,
    ) -> Result<Option<DiffLinePair>> {
        let diff = self
            .get_diff_for_file(&uri.repo_path, &uri.file_name, sha1, sha2)
            .await?;
        Ok(diff.and_then(|diff| diff.line_pair(line)))
    }

    /// Files changed between two revisions (`--name-status`)
    pub async fn get_diff_status(
        &self,
        repo_path: &str,
        sha1: Option<&str>,
        sha2: Option<&str>,
    ) -> Result<Option<Vec<FileChange>>> {
        let args = commands::diff_status(sha1, sha2);
        let data = self.runner.run(Path::new(repo_path), &args).await?;
        Ok(parsers::diff::parse_name_status(&data))
    }
}
