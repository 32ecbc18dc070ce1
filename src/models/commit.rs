use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::uri::GitUri;

/// Pseudo-revision for changes in the working tree
pub const UNCOMMITTED_SHA: &str = "0000000000000000000000000000000000000000";
/// Pseudo-revision for changes staged in the index
pub const STAGED_UNCOMMITTED_SHA: &str = "0000000000000000000000000000000000000000:";

static SHA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{40}(\^[0-9]*)?$").expect("valid sha regex"));
static UNCOMMITTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0{40}(\^[0-9]*)?:?$").expect("valid uncommitted regex"));
static STAGED_UNCOMMITTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0{40}(\^?[0-9]*)?:$").expect("valid staged regex"));

/// True for a real 40-hex revision (optionally with a `^n` parent suffix).
/// The all-zero sentinels are not commits and return false.
pub fn is_sha(reference: &str) -> bool {
    SHA_RE.is_match(reference) && !is_uncommitted(reference)
}

/// True for either the working-tree or the index sentinel
pub fn is_uncommitted(reference: &str) -> bool {
    UNCOMMITTED_RE.is_match(reference)
}

pub fn is_staged_uncommitted(reference: &str) -> bool {
    STAGED_UNCOMMITTED_RE.is_match(reference)
}

pub fn shorten_sha(sha: &str) -> String {
    if is_staged_uncommitted(sha) {
        return "Index".to_string();
    }
    if is_uncommitted(sha) {
        return "Working Tree".to_string();
    }
    match sha.find('^') {
        Some(idx) if idx > 8 => format!("{}{}", &sha[..8], &sha[idx..]),
        _ => sha.chars().take(8).collect(),
    }
}

pub fn format_relative_time(timestamp: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let diff = now - timestamp;

    if diff < 60 {
        "just now".to_string()
    } else if diff < 3600 {
        let mins = diff / 60;
        format!("{} minute{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if diff < 86400 {
        let hours = diff / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if diff < 2592000 {
        let days = diff / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else if diff < 31536000 {
        let months = diff / 2592000;
        format!("{} month{} ago", months, if months == 1 { "" } else { "s" })
    } else {
        let years = diff / 31536000;
        format!("{} year{} ago", years, if years == 1 { "" } else { "s" })
    }
}

pub fn timestamp_to_date(timestamp: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp, 0).unwrap_or_default()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CommitKind {
    Blame,
    Log,
    File,
    Stash,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Copied,
    Deleted,
    Modified,
    Renamed,
    TypeChanged,
    Unmerged,
    Untracked,
    Ignored,
    Unknown,
}

impl FileStatus {
    pub fn from_code(code: char) -> Self {
        match code {
            'A' => FileStatus::Added,
            'C' => FileStatus::Copied,
            'D' => FileStatus::Deleted,
            'M' => FileStatus::Modified,
            'R' => FileStatus::Renamed,
            'T' => FileStatus::TypeChanged,
            'U' => FileStatus::Unmerged,
            '?' => FileStatus::Untracked,
            '!' => FileStatus::Ignored,
            _ => FileStatus::Unknown,
        }
    }

    pub fn code(self) -> char {
        match self {
            FileStatus::Added => 'A',
            FileStatus::Copied => 'C',
            FileStatus::Deleted => 'D',
            FileStatus::Modified => 'M',
            FileStatus::Renamed => 'R',
            FileStatus::TypeChanged => 'T',
            FileStatus::Unmerged => 'U',
            FileStatus::Untracked => '?',
            FileStatus::Ignored => '!',
            FileStatus::Unknown => 'X',
        }
    }
}

/// One file touched by a commit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileChange {
    pub file_name: String,
    pub original_file_name: Option<String>,
    pub status: FileStatus,
    /// Line counts are only known when the log was produced with `--numstat`
    pub additions: Option<u32>,
    pub deletions: Option<u32>,
}

/// A line attributed to a commit by blame. Line numbers are 0-based.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitLine {
    pub sha: String,
    pub previous_sha: Option<String>,
    pub line: usize,
    pub original_line: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitCommit {
    pub kind: CommitKind,
    pub repo_path: String,
    pub sha: String,
    /// File the query was about; empty for repository-wide logs
    pub file_name: String,
    pub original_file_name: Option<String>,
    pub author: String,
    pub email: Option<String>,
    pub date: DateTime<Utc>,
    /// First line of the message
    pub summary: String,
    /// Remainder of the message after the summary, trimmed
    pub body: String,
    pub parents: Vec<String>,
    pub previous_sha: Option<String>,
    pub previous_file_name: Option<String>,
    pub files: Vec<FileChange>,
    pub lines: Vec<CommitLine>,
}

impl GitCommit {
    pub fn new(kind: CommitKind, repo_path: &str, sha: &str) -> Self {
        Self {
            kind,
            repo_path: repo_path.to_string(),
            sha: sha.to_string(),
            file_name: String::new(),
            original_file_name: None,
            author: String::new(),
            email: None,
            date: DateTime::default(),
            summary: String::new(),
            body: String::new(),
            parents: Vec::new(),
            previous_sha: None,
            previous_file_name: None,
            files: Vec::new(),
            lines: Vec::new(),
        }
    }

    pub fn short_sha(&self) -> String {
        shorten_sha(&self.sha)
    }

    pub fn is_uncommitted(&self) -> bool {
        is_uncommitted(&self.sha)
    }

    pub fn is_staged_uncommitted(&self) -> bool {
        is_staged_uncommitted(&self.sha)
    }

    pub fn message(&self) -> String {
        if self.body.is_empty() {
            self.summary.clone()
        } else {
            format!("{}\n\n{}", self.summary, self.body)
        }
    }

    /// Revision to diff against: blame's `previous`, else the first parent
    pub fn previous_sha(&self) -> Option<&str> {
        self.previous_sha
            .as_deref()
            .or_else(|| self.parents.first().map(String::as_str))
    }

    pub fn previous_short_sha(&self) -> Option<String> {
        self.previous_sha().map(shorten_sha)
    }

    pub fn previous_file_name(&self) -> &str {
        self.previous_file_name
            .as_deref()
            .or(self.original_file_name.as_deref())
            .unwrap_or(&self.file_name)
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    pub fn timestamp(&self) -> i64 {
        self.date.timestamp()
    }

    /// Format with a chrono `strftime` pattern
    pub fn format_date(&self, format: &str) -> String {
        self.date.format(format).to_string()
    }

    pub fn from_now(&self) -> String {
        format_relative_time(self.date.timestamp())
    }

    pub fn uri(&self) -> GitUri {
        GitUri::new(&self.repo_path, &self.file_name, Some(&self.sha))
    }

    pub fn previous_uri(&self) -> Option<GitUri> {
        self.previous_sha()
            .map(|sha| GitUri::new(&self.repo_path, self.previous_file_name(), Some(sha)))
    }

    /// Change record for the commit's own file, when it has one
    pub fn file_change(&self) -> Option<&FileChange> {
        if self.file_name.is_empty() {
            return None;
        }
        self.files.iter().find(|f| {
            f.file_name == self.file_name
                || f.original_file_name.as_deref() == Some(self.file_name.as_str())
        })
    }

    /// Copy of this commit carrying only the given blame lines
    pub fn with_lines(&self, lines: Vec<CommitLine>) -> Self {
        Self {
            lines,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHA: &str = "0123456789abcdef0123456789abcdef01234567";

    #[test]
    fn real_shas_are_valid() {
        assert!(is_sha(SHA));
        assert!(is_sha(&format!("{}^", SHA)));
        assert!(is_sha("ffffffffffffffffffffffffffffffffffffffff"));
        assert!(!is_sha("0123456"));
        assert!(!is_sha("HEAD"));
        assert!(!is_sha("0123456789ABCDEF0123456789ABCDEF01234567"));
    }

    #[test]
    fn sentinels_are_not_commits() {
        assert!(!is_sha(UNCOMMITTED_SHA));
        assert!(!is_sha(STAGED_UNCOMMITTED_SHA));
        assert!(is_uncommitted(UNCOMMITTED_SHA));
        assert!(!is_staged_uncommitted(UNCOMMITTED_SHA));
        assert!(is_staged_uncommitted(STAGED_UNCOMMITTED_SHA));
        assert!(is_uncommitted(STAGED_UNCOMMITTED_SHA));
        assert!(!is_uncommitted(SHA));
    }

    #[test]
    fn shorten_sha_handles_sentinels_and_suffixes() {
        assert_eq!(shorten_sha(SHA), "01234567");
        assert_eq!(shorten_sha(&format!("{}^2", SHA)), "01234567^2");
        assert_eq!(shorten_sha(UNCOMMITTED_SHA), "Working Tree");
        assert_eq!(shorten_sha(STAGED_UNCOMMITTED_SHA), "Index");
    }

    #[test]
    fn previous_sha_prefers_blame_previous() {
        let mut commit = GitCommit::new(CommitKind::Log, "/repo", SHA);
        commit.parents = vec!["p1".to_string(), "p2".to_string()];
        assert_eq!(commit.previous_sha(), Some("p1"));
        assert!(commit.is_merge());
        commit.previous_sha = Some("prev".to_string());
        assert_eq!(commit.previous_sha(), Some("prev"));
    }

    #[test]
    fn message_joins_summary_and_body() {
        let mut commit = GitCommit::new(CommitKind::Log, "/repo", SHA);
        commit.summary = "Fix it".to_string();
        assert_eq!(commit.message(), "Fix it");
        commit.body = "Details".to_string();
        assert_eq!(commit.message(), "Fix it\n\nDetails");
    }

    #[test]
    fn format_date_uses_strftime() {
        let mut commit = GitCommit::new(CommitKind::Log, "/repo", SHA);
        commit.date = timestamp_to_date(1_700_000_000);
        assert_eq!(commit.format_date("%Y-%m-%d"), "2023-11-14");
    }

    #[test]
    fn file_status_codes_round_trip() {
        for code in ['A', 'C', 'D', 'M', 'R', 'T', 'U', '?', '!'] {
            assert_eq!(FileStatus::from_code(code).code(), code);
        }
        assert_eq!(FileStatus::from_code('Z'), FileStatus::Unknown);
    }
}
