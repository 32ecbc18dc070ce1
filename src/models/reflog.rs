use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitReflogRecord {
    pub sha: String,
    /// e.g. `HEAD@{3}`
    pub selector: String,
    /// Operation that moved the ref: `checkout`, `commit`, `rebase (finish)`, ...
    pub command: String,
    pub details: String,
    pub date: DateTime<Utc>,
}

impl GitReflogRecord {
    /// For `checkout: moving from a to b`, the `(from, to)` pair
    pub fn checkout_refs(&self) -> Option<(&str, &str)> {
        if self.command != "checkout" {
            return None;
        }
        let rest = self.details.strip_prefix("moving from ")?;
        rest.split_once(" to ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitReflog {
    pub repo_path: String,
    pub records: Vec<GitReflogRecord>,
    pub has_more: bool,
}

impl GitReflog {
    /// Branches most recently checked out, newest first, without repeats
    pub fn recent_branches(&self) -> Vec<&str> {
        let mut branches: Vec<&str> = Vec::new();
        for record in &self.records {
            if let Some((_, to)) = record.checkout_refs() {
                if !branches.contains(&to) {
                    branches.push(to);
                }
            }
        }
        branches
    }
}
