//! Log queries on `GitService`: file history (cached), repository history,
//! and continuation paging.

use std::path::Path;
use std::sync::Arc;

use futures::FutureExt;
use serde::{Deserialize, Serialize};

use super::cache::QueryResult;
use super::commands::{self, LogArgs};
use super::runner::GitRunner;
use super::service::GitService;
use crate::error::{GitError, Result};
use crate::models::{CommitKind, GitCommit, GitLog, GitUri, LogContinuation, is_sha};
use crate::parsers::{self, LogParseContext};

const WHOLE_FILE_SLOT: &str = "log";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogOptions {
    /// Revision or range to start from; HEAD when unset
    pub reference: Option<String>,
    /// Page size; the configured default applies when unset
    pub max_count: Option<usize>,
    pub reverse: bool,
}

impl LogOptions {
    fn slot(&self) -> String {
        let mut slot = WHOLE_FILE_SLOT.to_string();
        if let Some(reference) = &self.reference {
            slot.push(':');
            slot.push_str(reference);
        }
        if let Some(max) = self.max_count {
            slot.push_str(&format!(":n{}", max));
        }
        if self.reverse {
            slot.push_str(":reverse");
        }
        slot
    }
}

/// A fully resolved log invocation
#[derive(Debug, Clone)]
struct LogRequest {
    repo_path: String,
    file_name: Option<String>,
    reference: Option<String>,
    max_count: Option<usize>,
    skip: usize,
    reverse: bool,
}

impl LogRequest {
    fn args(&self) -> Vec<String> {
        let opts = LogArgs {
            reference: self.reference.as_deref(),
            max_count: self.max_count,
            skip: self.skip,
            reverse: self.reverse,
        };
        match &self.file_name {
            Some(file_name) => commands::log_for_file(file_name, opts),
            None => commands::log_for_repo(opts),
        }
    }

    async fn run(self, runner: &GitRunner) -> Result<Option<GitLog>> {
        let data = runner.run(Path::new(&self.repo_path), &self.args()).await?;
        let kind = match self.file_name {
            Some(_) => CommitKind::File,
            None => CommitKind::Log,
        };
        let Some(mut log) = parsers::log::parse(
            &data,
            LogParseContext {
                kind,
                repo_path: &self.repo_path,
                file_name: self.file_name.as_deref(),
                reference: self.reference.as_deref(),
                max_count: self.max_count,
            },
        ) else {
            return Ok(None);
        };

        if log.has_more {
            if let Some(max_count) = self.max_count {
                log.more = Some(LogContinuation {
                    repo_path: self.repo_path.clone(),
                    file_name: self.file_name.clone(),
                    reference: self.reference.clone(),
                    max_count,
                    reverse: self.reverse,
                    skip: self.skip + log.commits.len(),
                });
            }
        }
        Ok(Some(log))
    }
}

async fn log_query(runner: Arc<GitRunner>, request: LogRequest) -> QueryResult<GitLog> {
    let log = request.run(&runner).await.map_err(GitError::into_shared)?;
    Ok(log.map(Arc::new))
}

/// Slice a cached whole-file log so it reads like the scoped query would
fn reuse_whole_log(whole: &GitLog, repo_path: &str, file_name: &str, options: &LogOptions) -> Option<GitLog> {
    let start = match options.reference.as_deref() {
        Some(reference) => reference,
        None => whole.first()?.sha.as_str(),
    };
    let mut log = whole.starting_at(start, options.max_count)?;
    // A truncated whole log can only answer pages it fully covers
    if whole.has_more && options.max_count.is_none_or(|n| log.count() < n) {
        return None;
    }
    if log.has_more {
        log.more = options.max_count.map(|max_count| LogContinuation {
            repo_path: repo_path.to_string(),
            file_name: Some(file_name.to_string()),
            reference: Some(start.to_string()),
            max_count,
            reverse: false,
            skip: log.commits.len(),
        });
    }
    Some(log)
}

impl GitService {
    /// History of one file, following renames
    pub async fn get_log_for_file(
        &self,
        repo_path: &str,
        file_name: &str,
        options: &LogOptions,
    ) -> Result<Option<Arc<GitLog>>> {
        let uri = GitUri::new(repo_path, file_name, None);
        let slot = options.slot();
        let key = uri.cache_key();

        if self.caching_enabled() {
            if let Some(query) = self.cache.get::<GitLog>(&key, &slot) {
                tracing::trace!(key = %key, slot = %slot, "Log cache hit");
                return query.await.map_err(GitError::Shared);
            }
        }

        if self.refuse_ignored::<GitLog>(&uri, &slot) {
            return Ok(None);
        }

        let (reuse, max_count) =
            self.with_config(|c| (c.reuse_whole_file_results, c.max_log_count(options.max_count)));

        let scoped = options.reference.as_deref().is_some_and(is_sha) || options.max_count.is_some();
        if reuse && scoped && !options.reverse && self.caching_enabled() {
            if let Some(whole) = self.cache.get::<GitLog>(&key, WHOLE_FILE_SLOT) {
                if let Ok(Some(log)) = whole.await {
                    if let Some(log) = reuse_whole_log(&log, &uri.repo_path, &uri.file_name, options) {
                        tracing::debug!(key = %key, slot = %slot, "Reusing whole-file log");
                        return Ok(Some(Arc::new(log)));
                    }
                }
            }
        }

        let runner = self.runner.clone();
        let request = LogRequest {
            repo_path: uri.repo_path.clone(),
            file_name: Some(uri.file_name.clone()),
            reference: options.reference.clone(),
            max_count,
            skip: 0,
            reverse: options.reverse,
        };
        self.cached_query(&uri, &slot, move || log_query(runner, request).boxed())
            .await
    }

    /// History of the whole repository. Not cached.
    pub async fn get_log_for_repo(&self, repo_path: &str, options: &LogOptions) -> Result<Option<GitLog>> {
        let max_count = self.with_config(|c| c.max_log_count(options.max_count));
        LogRequest {
            repo_path: super::paths::normalize_path(repo_path),
            file_name: None,
            reference: options.reference.clone(),
            max_count,
            skip: 0,
            reverse: options.reverse,
        }
        .run(&self.runner)
        .await
    }

    /// The page following `log`, or `None` when it was the last one
    pub async fn get_next_log_page(&self, log: &GitLog) -> Result<Option<GitLog>> {
        let Some(more) = log.more.as_ref().filter(|_| log.has_more) else {
            return Ok(None);
        };
        tracing::debug!(repo = %more.repo_path, skip = more.skip, "Loading next log page");
        LogRequest {
            repo_path: more.repo_path.clone(),
            file_name: more.file_name.clone(),
            reference: more.reference.clone(),
            max_count: Some(more.max_count),
            skip: more.skip,
            reverse: more.reverse,
        }
        .run(&self.runner)
        .await
    }

    /// The commit `sha` as seen from `file_name`'s history. When `sha` did not
    /// touch the file, the closest earlier commit that did is returned.
    pub async fn get_log_commit(
        &self,
        repo_path: &str,
        file_name: &str,
        sha: Option<&str>,
    ) -> Result<Option<GitCommit>> {
        let options = LogOptions {
            reference: sha.map(str::to_string),
            max_count: Some(2),
            reverse: false,
        };
        let log = self.get_log_for_file(repo_path, file_name, &options).await?;
        Ok(log.and_then(|log| {
            sha.and_then(|sha| log.get(sha))
                .or_else(|| log.first())
                .cloned()
        }))
    }

    /// Most recent commit touching `file_name`
    pub async fn get_recent_log_commit(&self, repo_path: &str, file_name: &str) -> Result<Option<GitCommit>> {
        self.get_log_commit(repo_path, file_name, None).await
    }
}
