//! Blame queries on `GitService`.
//!
//! The whole-file blame is cached under slot `blame`, a revision-scoped one
//! under `blame:<sha>`. Line and range views are derived from a cached blame
//! whenever one exists.

use std::path::Path;
use std::sync::Arc;

use futures::FutureExt;

use super::cache::QueryResult;
use super::commands::{self, BlameArgs};
use super::runner::GitRunner;
use super::service::GitService;
use crate::error::{GitError, Result};
use crate::models::{GitBlame, GitBlameLine, GitBlameLines, GitUri, LineRange, is_uncommitted};
use crate::parsers;

const WHOLE_FILE_SLOT: &str = "blame";

fn blame_slot(sha: Option<&str>) -> String {
    match sha {
        Some(sha) => format!("{}:{}", WHOLE_FILE_SLOT, sha),
        None => WHOLE_FILE_SLOT.to_string(),
    }
}

async fn blame_query(
    runner: Arc<GitRunner>,
    uri: GitUri,
    sha: Option<String>,
    ignore_whitespace: bool,
) -> QueryResult<GitBlame> {
    let args = commands::blame(
        &uri.file_name,
        BlameArgs {
            sha: sha.as_deref(),
            ignore_whitespace,
            range: None,
        },
    );
    let data = runner
        .run(Path::new(&uri.repo_path), &args)
        .await
        .map_err(GitError::into_shared)?;
    Ok(parsers::blame::parse(&data, &uri.repo_path, &uri.file_name).map(Arc::new))
}

impl GitService {
    /// Blame every line of `uri` at its revision (working tree when unset)
    pub async fn get_blame_for_file(&self, uri: &GitUri) -> Result<Option<Arc<GitBlame>>> {
        let sha = uri.sha.as_deref().filter(|s| !is_uncommitted(s));
        let slot = blame_slot(sha);
        let key = uri.cache_key();

        if self.caching_enabled() {
            if let Some(query) = self.cache.get::<GitBlame>(&key, &slot) {
                tracing::trace!(key = %key, slot = %slot, "Blame cache hit");
                return query.await.map_err(GitError::Shared);
            }
        }

        if self.refuse_ignored::<GitBlame>(uri, &slot) {
            return Ok(None);
        }

        let (reuse, ignore_whitespace) =
            self.with_config(|c| (c.reuse_whole_file_results, c.blame_ignore_whitespace));

        // A cached whole-file blame already attributes lines to `sha` if it contains it
        if let Some(sha) = sha.filter(|_| reuse && self.caching_enabled()) {
            if let Some(whole) = self.cache.get::<GitBlame>(&key, WHOLE_FILE_SLOT) {
                if let Ok(Some(blame)) = whole.await {
                    if blame.contains_sha(sha) {
                        tracing::debug!(key = %key, sha, "Reusing whole-file blame");
                        return Ok(Some(blame));
                    }
                }
            }
        }

        let runner = self.runner.clone();
        let owned_uri = uri.clone();
        let owned_sha = sha.map(str::to_string);
        self.cached_query(uri, &slot, move || {
            blame_query(runner, owned_uri, owned_sha, ignore_whitespace).boxed()
        })
        .await
    }

    /// Blame for one 0-based line.
    ///
    /// Served from the cached file blame when there is one, otherwise from a
    /// single-line `blame -L` that is not cached.
    pub async fn get_blame_for_line(&self, uri: &GitUri, line: usize) -> Result<Option<GitBlameLine>> {
        let sha = uri.sha.as_deref().filter(|s| !is_uncommitted(s));
        let slot = blame_slot(sha);

        if self.caching_enabled() && self.cache.get::<GitBlame>(&uri.cache_key(), &slot).is_some() {
            let blame = self.get_blame_for_file(uri).await?;
            return Ok(blame.and_then(|b| b.blame_line(line)));
        }

        if self.refuse_ignored::<GitBlame>(uri, &slot) {
            return Ok(None);
        }

        let ignore_whitespace = self.with_config(|c| c.blame_ignore_whitespace);
        let args = commands::blame(
            &uri.file_name,
            BlameArgs {
                sha,
                ignore_whitespace,
                range: Some(LineRange::single(line)),
            },
        );
        let data = self.runner.run(Path::new(&uri.repo_path), &args).await?;
        Ok(parsers::blame::parse(&data, &uri.repo_path, &uri.file_name)
            .and_then(|blame| blame.blame_line(line)))
    }

    /// Blame restricted to `range`, derived from the file blame
    pub async fn get_blame_for_range(
        &self,
        uri: &GitUri,
        range: LineRange,
    ) -> Result<Option<GitBlameLines>> {
        let blame = self.get_blame_for_file(uri).await?;
        Ok(blame.map(|b| self.get_blame_for_range_sync(&b, range)))
    }

    /// Restrict an already loaded blame to `range` without running git
    pub fn get_blame_for_range_sync(&self, blame: &GitBlame, range: LineRange) -> GitBlameLines {
        blame.for_range(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_by_revision() {
        assert_eq!(blame_slot(None), "blame");
        assert_eq!(blame_slot(Some("abc")), "blame:abc");
    }
}
