//! Repository-level lists on `GitService`: branches, remotes, tags, stashes
//! and the HEAD reflog.
//!
//! The first four are held by the `Repository` and dropped when the watcher
//! reports a matching change. The reflog is read on demand.

use std::path::Path;
use std::sync::Arc;

use futures::FutureExt;

use super::cache::QueryResult;
use super::commands;
use super::paths;
use super::runner::GitRunner;
use super::service::GitService;
use crate::error::{GitError, Result};
use crate::models::{GitBranch, GitReflog, GitRemote, GitStash, GitTag};
use crate::parsers;

type ListParser<T> = fn(&str, &str) -> Option<T>;

async fn list_query<T>(
    runner: Arc<GitRunner>,
    repo_path: String,
    args: Vec<String>,
    parse: ListParser<T>,
) -> QueryResult<T>
where
    T: Send + Sync + 'static,
{
    let data = runner
        .run(Path::new(&repo_path), &args)
        .await
        .map_err(GitError::into_shared)?;
    Ok(parse(&data, &repo_path).map(Arc::new))
}

fn unwrap_list<T: Clone>(list: Option<Arc<Vec<T>>>) -> Vec<T> {
    list.map(|l| l.as_ref().clone()).unwrap_or_default()
}

impl GitService {
    pub async fn get_branches(&self, repo_path: &str) -> Result<Vec<GitBranch>> {
        let repository = self.repository(repo_path);
        let runner = self.runner.clone();
        let path = repository.path.clone();
        let list = self
            .repository_query(&repository.branches, move || {
                list_query(runner, path, commands::branches(), |data, repo| {
                    Some(parsers::branch::parse(data, repo))
                })
                .boxed()
            })
            .await?;
        Ok(unwrap_list(list))
    }

    /// The checked-out branch; `None` when HEAD is detached or unborn
    pub async fn get_branch(&self, repo_path: &str) -> Result<Option<GitBranch>> {
        let branches = self.get_branches(repo_path).await?;
        Ok(branches.into_iter().find(|b| b.current))
    }

    pub async fn get_remotes(&self, repo_path: &str) -> Result<Vec<GitRemote>> {
        let repository = self.repository(repo_path);
        let runner = self.runner.clone();
        let path = repository.path.clone();
        let list = self
            .repository_query(&repository.remotes, move || {
                list_query(runner, path, commands::remotes(), |data, repo| {
                    Some(parsers::remote::parse(data, repo))
                })
                .boxed()
            })
            .await?;
        Ok(unwrap_list(list))
    }

    /// Tags, newest first
    pub async fn get_tags(&self, repo_path: &str) -> Result<Vec<GitTag>> {
        let repository = self.repository(repo_path);
        let runner = self.runner.clone();
        let path = repository.path.clone();
        let list = self
            .repository_query(&repository.tags, move || {
                list_query(runner, path, commands::tags(), |data, repo| {
                    Some(parsers::tag::parse(data, repo))
                })
                .boxed()
            })
            .await?;
        Ok(unwrap_list(list))
    }

    pub async fn get_stash_list(&self, repo_path: &str) -> Result<Option<Arc<GitStash>>> {
        let repository = self.repository(repo_path);
        let runner = self.runner.clone();
        let path = repository.path.clone();
        self.repository_query(&repository.stash, move || {
            list_query(runner, path, commands::stash_list(), parsers::stash::parse).boxed()
        })
        .await
    }

    /// HEAD reflog, newest first. `limit` bounds the records returned and
    /// `skip` pages past earlier ones.
    pub async fn get_reflog(
        &self,
        repo_path: &str,
        limit: Option<usize>,
        skip: usize,
    ) -> Result<Option<GitReflog>> {
        let repo_path = paths::normalize_path(repo_path);
        let args = commands::reflog(limit, skip);
        let data = self.runner.run(Path::new(&repo_path), &args).await?;
        Ok(parsers::reflog::parse(&data, &repo_path, limit))
    }
}
