use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::{TrackingState, format_tracking_status};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitBranch {
    pub repo_path: String,
    /// Short name; remote branches keep their `remote/` prefix
    pub name: String,
    pub remote: bool,
    pub current: bool,
    pub sha: Option<String>,
    pub tracking: Option<String>,
    pub state: TrackingState,
    pub date: Option<DateTime<Utc>>,
}

impl GitBranch {
    /// Name without the remote prefix
    pub fn get_name(&self) -> &str {
        if self.remote {
            self.name.split_once('/').map_or(self.name.as_str(), |(_, rest)| rest)
        } else {
            &self.name
        }
    }

    /// Remote this branch lives on (or tracks)
    pub fn get_remote(&self) -> Option<&str> {
        if self.remote {
            return self.name.split_once('/').map(|(remote, _)| remote);
        }
        self.tracking
            .as_deref()
            .and_then(|t| t.split_once('/'))
            .map(|(remote, _)| remote)
    }

    pub fn tracking_status(&self) -> String {
        format_tracking_status(self.tracking.as_deref(), self.state)
    }

    pub fn is_detached(&self) -> bool {
        self.name.starts_with('(') && self.name.ends_with(')')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch(name: &str, remote: bool, tracking: Option<&str>) -> GitBranch {
        GitBranch {
            repo_path: "/r".to_string(),
            name: name.to_string(),
            remote,
            current: false,
            sha: None,
            tracking: tracking.map(str::to_string),
            state: TrackingState { ahead: 1, behind: 0 },
            date: None,
        }
    }

    #[test]
    fn remote_branch_splits_prefix() {
        let b = branch("origin/feature/x", true, None);
        assert_eq!(b.get_name(), "feature/x");
        assert_eq!(b.get_remote(), Some("origin"));
    }

    #[test]
    fn local_branch_reports_tracking_remote() {
        let b = branch("feature/x", false, Some("upstream/feature/x"));
        assert_eq!(b.get_name(), "feature/x");
        assert_eq!(b.get_remote(), Some("upstream"));
        assert_eq!(b.tracking_status(), "\u{2191}1");
    }
}
