use serde::{Deserialize, Serialize};

use super::commit::GitCommit;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitStashCommit {
    /// Reflog selector, e.g. `stash@{0}`
    pub stash_name: String,
    #[serde(flatten)]
    pub commit: GitCommit,
}

impl GitStashCommit {
    pub fn index(&self) -> Option<usize> {
        self.stash_name
            .strip_prefix("stash@{")
            .and_then(|rest| rest.strip_suffix('}'))
            .and_then(|n| n.parse().ok())
    }

    /// Branch the stash was taken on, from the default `WIP on <branch>:` summary
    pub fn on_ref(&self) -> Option<&str> {
        let summary = &self.commit.summary;
        let rest = summary
            .strip_prefix("WIP on ")
            .or_else(|| summary.strip_prefix("On "))?;
        rest.split_once(':').map(|(branch, _)| branch)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitStash {
    pub repo_path: String,
    pub commits: Vec<GitStashCommit>,
}

impl GitStash {
    pub fn get(&self, stash_name: &str) -> Option<&GitStashCommit> {
        self.commits.iter().find(|c| c.stash_name == stash_name)
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}
