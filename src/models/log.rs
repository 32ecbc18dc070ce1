use serde::{Deserialize, Serialize};

use super::commit::GitCommit;

/// Everything needed to request the page after this one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogContinuation {
    pub repo_path: String,
    /// Set for file histories
    pub file_name: Option<String>,
    pub reference: Option<String>,
    pub max_count: usize,
    pub reverse: bool,
    /// Commits already returned across all previous pages
    pub skip: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitLog {
    pub repo_path: String,
    /// Revision or range the traversal started from
    pub reference: Option<String>,
    pub max_count: Option<usize>,
    /// Newest first, as emitted by the traversal
    pub commits: Vec<GitCommit>,
    pub has_more: bool,
    pub more: Option<LogContinuation>,
}

impl GitLog {
    pub fn count(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    pub fn get(&self, sha: &str) -> Option<&GitCommit> {
        self.commits.iter().find(|c| c.sha == sha)
    }

    pub fn contains(&self, sha: &str) -> bool {
        self.get(sha).is_some()
    }

    pub fn first(&self) -> Option<&GitCommit> {
        self.commits.first()
    }

    pub fn last(&self) -> Option<&GitCommit> {
        self.commits.last()
    }

    /// Unique author names in first-seen order
    pub fn authors(&self) -> Vec<&str> {
        let mut authors: Vec<&str> = Vec::new();
        for commit in &self.commits {
            if !authors.contains(&commit.author.as_str()) {
                authors.push(commit.author.as_str());
            }
        }
        authors
    }

    /// A copy that starts at `sha` and keeps at most `max_count` commits.
    /// Returns `None` when `sha` is not part of this log.
    pub fn starting_at(&self, sha: &str, max_count: Option<usize>) -> Option<GitLog> {
        let start = self.commits.iter().position(|c| c.sha == sha)?;
        let remaining = &self.commits[start..];
        let take = max_count.map_or(remaining.len(), |n| n.min(remaining.len()));
        let has_more = take < remaining.len() || self.has_more;
        Some(GitLog {
            repo_path: self.repo_path.clone(),
            reference: Some(sha.to_string()),
            max_count,
            commits: remaining[..take].to_vec(),
            has_more,
            // The cached log was paged from its own root; a partial copy cannot resume it
            more: None,
        })
    }

    /// Append the next page, dropping any commits already present
    pub fn merge(&mut self, page: GitLog) {
        for commit in page.commits {
            if !self.contains(&commit.sha) {
                self.commits.push(commit);
            }
        }
        self.has_more = page.has_more;
        self.more = page.more;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::commit::CommitKind;

    fn log_of(shas: &[&str], has_more: bool) -> GitLog {
        GitLog {
            repo_path: "/repo".to_string(),
            reference: None,
            max_count: None,
            commits: shas
                .iter()
                .map(|sha| {
                    let mut c = GitCommit::new(CommitKind::Log, "/repo", sha);
                    c.author = format!("author-{}", &sha[..1]);
                    c
                })
                .collect(),
            has_more,
            more: None,
        }
    }

    #[test]
    fn starting_at_slices_from_sha() {
        let log = log_of(&["c3", "c2", "c1"], false);
        let sub = log.starting_at("c2", None).unwrap();
        assert_eq!(sub.commits.iter().map(|c| c.sha.as_str()).collect::<Vec<_>>(), ["c2", "c1"]);
        assert!(!sub.has_more);

        let limited = log.starting_at("c3", Some(1)).unwrap();
        assert_eq!(limited.count(), 1);
        assert!(limited.has_more);

        assert!(log.starting_at("c9", None).is_none());
    }

    #[test]
    fn merge_skips_duplicates() {
        let mut log = log_of(&["c3", "c2"], true);
        log.merge(log_of(&["c2", "c1"], false));
        assert_eq!(log.count(), 3);
        assert!(!log.has_more);
    }

    #[test]
    fn authors_are_unique() {
        let log = log_of(&["a1", "b1", "a2"], false);
        assert_eq!(log.authors(), ["author-a", "author-b"]);
    }
}
