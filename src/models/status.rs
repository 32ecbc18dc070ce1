use serde::{Deserialize, Serialize};

use super::commit::FileStatus;

/// Ahead/behind counts relative to the upstream branch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingState {
    pub ahead: u32,
    pub behind: u32,
}

impl TrackingState {
    pub fn is_empty(&self) -> bool {
        self.ahead == 0 && self.behind == 0
    }
}

/// `↑ahead ↓behind`, with zero sides left out
pub fn format_tracking_status(upstream: Option<&str>, state: TrackingState) -> String {
    if upstream.is_none() || state.is_empty() {
        return String::new();
    }
    let mut parts = Vec::new();
    if state.ahead > 0 {
        parts.push(format!("\u{2191}{}", state.ahead));
    }
    if state.behind > 0 {
        parts.push(format!("\u{2193}{}", state.behind));
    }
    parts.join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitStatusFile {
    pub repo_path: String,
    pub file_name: String,
    pub original_file_name: Option<String>,
    /// `X` column of porcelain status, `None` for `.`/space
    pub index_status: Option<char>,
    /// `Y` column of porcelain status
    pub working_tree_status: Option<char>,
}

impl GitStatusFile {
    /// Working-tree state wins over the index when both are set
    pub fn status(&self) -> FileStatus {
        let code = self
            .working_tree_status
            .or(self.index_status)
            .unwrap_or(' ');
        FileStatus::from_code(code)
    }

    pub fn is_staged(&self) -> bool {
        matches!(self.index_status, Some(c) if c != '?' && c != '!')
    }

    pub fn is_untracked(&self) -> bool {
        self.index_status == Some('?') || self.working_tree_status == Some('?')
    }

    pub fn is_conflicted(&self) -> bool {
        matches!(
            (self.index_status, self.working_tree_status),
            (Some('U'), _) | (_, Some('U')) | (Some('A'), Some('A')) | (Some('D'), Some('D'))
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitStatus {
    pub repo_path: String,
    /// `None` when HEAD is detached
    pub branch: Option<String>,
    pub sha: Option<String>,
    pub upstream: Option<String>,
    pub state: TrackingState,
    pub files: Vec<GitStatusFile>,
}

impl GitStatus {
    pub fn tracking_status(&self) -> String {
        format_tracking_status(self.upstream.as_deref(), self.state)
    }

    pub fn file(&self, file_name: &str) -> Option<&GitStatusFile> {
        self.files
            .iter()
            .find(|f| f.file_name == file_name || f.original_file_name.as_deref() == Some(file_name))
    }

    pub fn has_changes(&self) -> bool {
        !self.files.is_empty()
    }

    pub fn staged(&self) -> impl Iterator<Item = &GitStatusFile> {
        self.files.iter().filter(|f| f.is_staged())
    }
}
