//! Working-tree status queries on `GitService`. Never cached: status changes
//! with every edit.

use std::path::Path;

use super::commands;
use super::paths;
use super::service::GitService;
use crate::error::Result;
use crate::models::{GitStatus, GitStatusFile};
use crate::parsers::{self, PorcelainVersion};

impl GitService {
    pub async fn get_status_for_repo(&self, repo_path: &str) -> Result<Option<GitStatus>> {
        self.status(repo_path, None).await
    }

    /// Status of one file; `None` when it is clean or unknown to git
    pub async fn get_status_for_file(&self, repo_path: &str, file_name: &str) -> Result<Option<GitStatusFile>> {
        let repo_path = paths::normalize_path(repo_path);
        let file_name = paths::relative_to(file_name, &repo_path);
        let status = self.status(&repo_path, Some(&file_name)).await?;
        Ok(status.and_then(|s| s.file(&file_name).cloned()))
    }

    async fn status(&self, repo_path: &str, file_name: Option<&str>) -> Result<Option<GitStatus>> {
        let version = self.porcelain_version();
        let args = commands::status(version == PorcelainVersion::V2, file_name);
        let data = self.runner.run(Path::new(repo_path), &args).await?;
        Ok(parsers::status::parse(&data, &paths::normalize_path(repo_path), version))
    }
}
