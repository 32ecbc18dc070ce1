//! Parser for `git status --porcelain --branch`, both format versions.
//!
//! v1 (any git):
//! ```text
//! ## main...origin/main [ahead 1, behind 2]
//!  M src/a.rs
//! R  old.rs -> new.rs
//! ?? scratch.txt
//! ```
//!
//! v2 (git 2.11+):
//! ```text
//! # branch.oid <sha>
//! # branch.head main
//! # branch.upstream origin/main
//! # branch.ab +1 -2
//! 1 .M N... 100644 100644 100644 <sha> <sha> src/a.rs
//! 2 R. N... 100644 100644 100644 <sha> <sha> R100 new.rs<TAB>old.rs
//! ? scratch.txt
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{GitStatus, GitStatusFile, TrackingState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PorcelainVersion {
    V1,
    V2,
}

static AHEAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ahead (\d+)").expect("valid ahead regex"));
static BEHIND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"behind (\d+)").expect("valid behind regex"));

fn status_code(c: char) -> Option<char> {
    match c {
        ' ' | '.' => None,
        other => Some(other),
    }
}

fn new_status(repo_path: &str) -> GitStatus {
    GitStatus {
        repo_path: repo_path.to_string(),
        branch: None,
        sha: None,
        upstream: None,
        state: TrackingState::default(),
        files: Vec::new(),
    }
}

pub fn parse(data: &str, repo_path: &str, version: PorcelainVersion) -> Option<GitStatus> {
    if data.trim().is_empty() {
        return None;
    }
    let status = match version {
        PorcelainVersion::V1 => parse_v1(data, repo_path),
        PorcelainVersion::V2 => parse_v2(data, repo_path),
    };
    Some(status)
}

fn parse_v1(data: &str, repo_path: &str) -> GitStatus {
    let mut status = new_status(repo_path);

    for line in data.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(branch_line) = line.strip_prefix("## ") {
            parse_v1_branch(branch_line, &mut status);
            continue;
        }
        if line.len() < 4 {
            continue;
        }
        let mut chars = line.chars();
        let (Some(x), Some(y)) = (chars.next(), chars.next()) else {
            continue;
        };
        let path = &line[3..];
        let (file_name, original_file_name) = match path.split_once(" -> ") {
            Some((original, renamed)) => (renamed.to_string(), Some(original.to_string())),
            None => (path.to_string(), None),
        };
        status.files.push(GitStatusFile {
            repo_path: repo_path.to_string(),
            file_name,
            original_file_name,
            index_status: status_code(x),
            working_tree_status: status_code(y),
        });
    }
    status
}

fn parse_v1_branch(line: &str, status: &mut GitStatus) {
    let (refs, tracking) = match line.split_once(" [") {
        Some((refs, rest)) => (refs, Some(rest.trim_end_matches(']'))),
        None => (line, None),
    };

    if let Some(initial) = refs
        .strip_prefix("No commits yet on ")
        .or_else(|| refs.strip_prefix("Initial commit on "))
    {
        status.branch = Some(initial.to_string());
        return;
    }
    if refs.starts_with("HEAD (no branch)") {
        return;
    }

    match refs.split_once("...") {
        Some((branch, upstream)) => {
            status.branch = Some(branch.to_string());
            status.upstream = Some(upstream.to_string());
        }
        None => status.branch = Some(refs.to_string()),
    }

    if let Some(tracking) = tracking {
        status.state = parse_ahead_behind(tracking);
    }
}

fn parse_ahead_behind(text: &str) -> TrackingState {
    let count = |re: &Regex| {
        re.captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    TrackingState {
        ahead: count(&AHEAD_RE),
        behind: count(&BEHIND_RE),
    }
}

fn parse_v2(data: &str, repo_path: &str) -> GitStatus {
    let mut status = new_status(repo_path);

    for line in data.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(header) = line.strip_prefix("# ") {
            let (key, value) = header.split_once(' ').unwrap_or((header, ""));
            match key {
                "branch.oid" if value != "(initial)" => status.sha = Some(value.to_string()),
                "branch.head" if value != "(detached)" => status.branch = Some(value.to_string()),
                "branch.upstream" => status.upstream = Some(value.to_string()),
                "branch.ab" => {
                    for part in value.split_whitespace() {
                        if let Some(n) = part.strip_prefix('+') {
                            status.state.ahead = n.parse().unwrap_or(0);
                        } else if let Some(n) = part.strip_prefix('-') {
                            status.state.behind = n.parse().unwrap_or(0);
                        }
                    }
                }
                _ => {}
            }
            continue;
        }

        let entry = match line.chars().next() {
            Some('1') => v2_entry(line, 9, repo_path, false),
            Some('2') => v2_entry(line, 10, repo_path, true),
            Some('u') => v2_entry(line, 11, repo_path, false),
            Some(c @ ('?' | '!')) => line.get(2..).map(|path| GitStatusFile {
                repo_path: repo_path.to_string(),
                file_name: path.to_string(),
                original_file_name: None,
                index_status: Some(c),
                working_tree_status: Some(c),
            }),
            _ => None,
        };
        if let Some(entry) = entry {
            status.files.push(entry);
        }
    }
    status
}

/// Ordinary (`1`), rename/copy (`2`) and unmerged (`u`) entries: `fields`
/// space-separated columns, the last of which is the path.
fn v2_entry(line: &str, fields: usize, repo_path: &str, renamed: bool) -> Option<GitStatusFile> {
    let parts: Vec<&str> = line.splitn(fields, ' ').collect();
    if parts.len() < fields {
        return None;
    }
    let mut xy = parts[1].chars();
    let x = xy.next()?;
    let y = xy.next()?;
    let path = parts[fields - 1];
    let (file_name, original_file_name) = if renamed {
        match path.split_once('\t') {
            Some((new, old)) => (new.to_string(), Some(old.to_string())),
            None => (path.to_string(), None),
        }
    } else {
        (path.to_string(), None)
    };
    Some(GitStatusFile {
        repo_path: repo_path.to_string(),
        file_name,
        original_file_name,
        index_status: status_code(x),
        working_tree_status: status_code(y),
    })
}
