//! Parser for `git log` output produced with [`LOG_FORMAT`].
//!
//! Each commit is framed by line-start markers:
//!
//! ```text
//! <r> <sha>
//! <a> <author>
//! <e> <email>
//! <d> <unix time>
//! <p> <parent> <parent>
//! <s>
//! <message, any number of lines>
//! </s>
//! <f>
//!
//! <name-status or numstat lines>
//! ```
//!
//! The scanner tracks which section it is in, so a message line that happens
//! to look like a marker is kept as message text.

use crate::models::{CommitKind, FileChange, FileStatus, GitCommit, GitLog, timestamp_to_date};

pub const LOG_FORMAT: &str = "--format=<r> %H%n<a> %aN%n<e> %aE%n<d> %at%n<p> %P%n<s>%n%B%n</s>%n<f>";

/// Same framing plus the reflog selector, for `git stash list`
pub const STASH_FORMAT: &str = "--format=<r> %H%n<d> %at%n<l> %gd%n<s>%n%B%n</s>%n<f>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    /// Before the first `<r>` line
    Start,
    Header,
    Message,
    Files,
}

/// Fields of one commit as they appear in the output
#[derive(Debug, Default)]
pub(crate) struct RawLogEntry {
    pub sha: String,
    pub author: String,
    pub email: Option<String>,
    pub timestamp: i64,
    pub parents: Vec<String>,
    pub selector: Option<String>,
    pub message: Vec<String>,
    pub files: Vec<FileChange>,
}

impl RawLogEntry {
    fn summary_and_body(&self) -> (String, String) {
        let message = self.message.join("\n");
        let message = message.trim();
        match message.split_once('\n') {
            Some((summary, body)) => (summary.trim_end().to_string(), body.trim().to_string()),
            None => (message.to_string(), String::new()),
        }
    }

    pub fn into_commit(self, kind: CommitKind, repo_path: &str, file_name: Option<&str>) -> GitCommit {
        let (summary, body) = self.summary_and_body();
        let mut commit = GitCommit::new(kind, repo_path, &self.sha);
        commit.author = self.author;
        commit.email = self.email.filter(|e| !e.is_empty());
        commit.date = timestamp_to_date(self.timestamp);
        commit.summary = summary;
        commit.body = body;
        commit.parents = self.parents;

        if let Some(file_name) = file_name {
            // With --follow the file may have had another name in this commit
            let change = self
                .files
                .iter()
                .find(|f| f.file_name == file_name)
                .or_else(|| self.files.first());
            match change {
                Some(change) => {
                    commit.file_name = change.file_name.clone();
                    commit.original_file_name = change.original_file_name.clone();
                }
                None => commit.file_name = file_name.to_string(),
            }
        }
        commit.files = self.files;
        commit
    }
}

/// Scan the raw output into per-commit records
pub(crate) fn scan(data: &str) -> Vec<RawLogEntry> {
    let mut entries = Vec::new();
    let mut current: Option<RawLogEntry> = None;
    let mut section = Section::Start;

    for line in data.lines() {
        if section == Section::Message {
            if line == "</s>" {
                section = Section::Header;
            } else if let Some(entry) = current.as_mut() {
                entry.message.push(line.to_string());
            }
            continue;
        }

        if let Some(sha) = line.strip_prefix("<r> ") {
            if let Some(done) = current.take() {
                entries.push(done);
            }
            current = Some(RawLogEntry {
                sha: sha.trim().to_string(),
                ..Default::default()
            });
            section = Section::Header;
            continue;
        }

        let Some(entry) = current.as_mut() else {
            continue;
        };

        match section {
            Section::Header => {
                if let Some(author) = line.strip_prefix("<a> ") {
                    entry.author = author.to_string();
                } else if let Some(email) = line.strip_prefix("<e> ") {
                    entry.email = Some(email.to_string());
                } else if let Some(date) = line.strip_prefix("<d> ") {
                    entry.timestamp = date.trim().parse().unwrap_or(0);
                } else if let Some(parents) = line.strip_prefix("<p>") {
                    entry.parents = parents.split_whitespace().map(str::to_string).collect();
                } else if let Some(selector) = line.strip_prefix("<l> ") {
                    entry.selector = Some(selector.trim().to_string());
                } else if line == "<s>" {
                    section = Section::Message;
                } else if line == "<f>" {
                    section = Section::Files;
                }
            }
            Section::Files => {
                if let Some(change) = parse_file_line(line) {
                    merge_file_change(&mut entry.files, change);
                }
            }
            Section::Start | Section::Message => {}
        }
    }

    if let Some(done) = current.take() {
        entries.push(done);
    }
    entries
}

fn merge_file_change(files: &mut Vec<FileChange>, change: FileChange) {
    match files.iter_mut().find(|f| f.file_name == change.file_name) {
        Some(existing) => {
            if change.additions.is_some() {
                existing.additions = change.additions;
                existing.deletions = change.deletions;
            }
            if existing.original_file_name.is_none() {
                existing.original_file_name = change.original_file_name;
            }
            if change.status != FileStatus::Modified {
                existing.status = change.status;
            }
        }
        None => files.push(change),
    }
}

/// One `--name-status` or `--numstat` line
pub(crate) fn parse_file_line(line: &str) -> Option<FileChange> {
    let line = line.trim_end_matches('\r');
    if line.trim().is_empty() {
        return None;
    }
    let parts: Vec<&str> = line.split('\t').collect();
    if parts.len() < 2 {
        return None;
    }

    let is_count = |s: &str| s == "-" || (!s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()));
    if parts.len() >= 3 && is_count(parts[0]) && is_count(parts[1]) {
        let additions = parts[0].parse().ok();
        let deletions = parts[1].parse().ok();
        let path = parts[2..].join("\t");
        let (original, file_name) = expand_rename(&path);
        let status = if original.is_some() {
            FileStatus::Renamed
        } else {
            FileStatus::Modified
        };
        return Some(FileChange {
            file_name,
            original_file_name: original,
            status,
            additions: Some(additions.unwrap_or(0)),
            deletions: Some(deletions.unwrap_or(0)),
        });
    }

    let code = parts[0].chars().next()?;
    if !code.is_ascii_uppercase() {
        return None;
    }
    let status = FileStatus::from_code(code);
    let (file_name, original_file_name) = match (status, parts.len()) {
        (FileStatus::Renamed | FileStatus::Copied, 3..) => {
            (parts[2].to_string(), Some(parts[1].to_string()))
        }
        _ => (parts[1].to_string(), None),
    };
    Some(FileChange {
        file_name,
        original_file_name,
        status,
        additions: None,
        deletions: None,
    })
}

/// Expand numstat rename notation: `old => new` or `dir/{old => new}/file`.
/// Returns `(original, new)`; `original` is `None` for plain paths.
fn expand_rename(path: &str) -> (Option<String>, String) {
    let Some(arrow) = path.find(" => ") else {
        return (None, path.to_string());
    };

    if let (Some(open), Some(close)) = (path.find('{'), path.rfind('}')) {
        if open < arrow && close > arrow {
            let prefix = &path[..open];
            let suffix = &path[close + 1..];
            let old = &path[open + 1..arrow];
            let new = &path[arrow + 4..close];
            let join = |middle: &str| {
                let joined = format!("{}{}{}", prefix, middle, suffix);
                joined.replace("//", "/")
            };
            return (Some(join(old)), join(new));
        }
    }

    (
        Some(path[..arrow].to_string()),
        path[arrow + 4..].to_string(),
    )
}

/// Inputs the log parser needs besides the raw text
#[derive(Debug, Clone, Copy)]
pub struct LogParseContext<'a> {
    pub kind: CommitKind,
    pub repo_path: &'a str,
    /// Set for file histories
    pub file_name: Option<&'a str>,
    pub reference: Option<&'a str>,
    /// Page size; the command is expected to have asked for one extra commit
    pub max_count: Option<usize>,
}

/// Parse log output. Returns `None` for empty output.
///
/// When more than `max_count` commits are present the extra ones are dropped
/// and `has_more` is set.
pub fn parse(data: &str, ctx: LogParseContext<'_>) -> Option<GitLog> {
    if data.trim().is_empty() {
        return None;
    }

    let mut entries = scan(data);
    if entries.is_empty() {
        return None;
    }

    let has_more = match ctx.max_count {
        Some(max) if entries.len() > max => {
            entries.truncate(max);
            true
        }
        _ => false,
    };

    let commits = entries
        .into_iter()
        .map(|entry| entry.into_commit(ctx.kind, ctx.repo_path, ctx.file_name))
        .collect();

    Some(GitLog {
        repo_path: ctx.repo_path.to_string(),
        reference: ctx.reference.map(str::to_string),
        max_count: ctx.max_count,
        commits,
        has_more,
        more: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const C3: &str = "cccccccccccccccccccccccccccccccccccccccc";
    const C2: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
    const C1: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

    fn entry(sha: &str, parent: &str, message: &str, files: &str) -> String {
        format!(
            "<r> {sha}\n<a> Alice Doe\n<e> alice@example.com\n<d> 1700000000\n<p> {parent}\n<s>\n{message}\n</s>\n<f>\n\n{files}"
        )
    }

    fn ctx(max_count: Option<usize>) -> LogParseContext<'static> {
        LogParseContext {
            kind: CommitKind::Log,
            repo_path: "/repo",
            file_name: None,
            reference: None,
            max_count,
        }
    }

    #[test]
    fn parses_commits_in_order() {
        let data = [
            entry(C3, C2, "Third", "M\tsrc/lib.rs\n"),
            entry(C2, C1, "Second", "A\tsrc/new.rs\n"),
            entry(C1, "", "First", "A\tREADME.md\n"),
        ]
        .concat();

        let log = parse(&data, ctx(None)).unwrap();
        let shas: Vec<&str> = log.commits.iter().map(|c| c.sha.as_str()).collect();
        assert_eq!(shas, [C3, C2, C1]);
        assert!(!log.has_more);

        let root = &log.commits[2];
        assert!(root.parents.is_empty());
        assert_eq!(log.commits[0].parents, vec![C2.to_string()]);
        assert_eq!(log.commits[0].author, "Alice Doe");
        assert_eq!(log.commits[0].email.as_deref(), Some("alice@example.com"));
        assert_eq!(log.commits[0].timestamp(), 1_700_000_000);
        assert_eq!(log.commits[1].files[0].status, FileStatus::Added);
    }

    #[test]
    fn page_size_sets_has_more() {
        let data = [
            entry(C3, C2, "Third", ""),
            entry(C2, C1, "Second", ""),
            entry(C1, "", "First", ""),
        ]
        .concat();

        let log = parse(&data, ctx(Some(2))).unwrap();
        assert_eq!(log.count(), 2);
        assert!(log.has_more);
        assert_eq!(log.last().unwrap().sha, C2);

        let exact = parse(&data, ctx(Some(3))).unwrap();
        assert_eq!(exact.count(), 3);
        assert!(!exact.has_more);
    }

    #[test]
    fn message_lines_that_look_like_markers_stay_in_body() {
        let message = "Summary line\n\n<r> not a commit\n<f>\n<a> still body";
        let data = entry(C1, "", message, "M\ta.txt\n");
        let log = parse(&data, ctx(None)).unwrap();
        assert_eq!(log.count(), 1);
        let commit = &log.commits[0];
        assert_eq!(commit.summary, "Summary line");
        assert_eq!(commit.body, "<r> not a commit\n<f>\n<a> still body");
        assert_eq!(commit.author, "Alice Doe");
        assert_eq!(commit.files.len(), 1);
    }

    #[test]
    fn truncated_output_keeps_complete_commits() {
        let mut data = entry(C2, C1, "Second", "M\ta.txt\n");
        data.push_str(&format!("<r> {C1}\n<a> Bob\n<s>\nHalf a mess"));
        let log = parse(&data, ctx(None)).unwrap();
        assert_eq!(log.count(), 2);
        assert_eq!(log.commits[1].author, "Bob");
        assert_eq!(log.commits[1].summary, "Half a mess");
    }

    #[test]
    fn empty_output_is_none() {
        assert!(parse("", ctx(None)).is_none());
        assert!(parse("\n\n", ctx(None)).is_none());
        assert!(parse("garbage without markers\n", ctx(None)).is_none());
    }

    #[test]
    fn file_history_uses_renamed_name() {
        let data = entry(C1, "", "Move", "R087\tsrc/old.rs\tsrc/new.rs\n");
        let log = parse(
            &data,
            LogParseContext {
                kind: CommitKind::File,
                file_name: Some("src/new.rs"),
                ..ctx(None)
            },
        )
        .unwrap();
        let commit = &log.commits[0];
        assert_eq!(commit.file_name, "src/new.rs");
        assert_eq!(commit.original_file_name.as_deref(), Some("src/old.rs"));
        assert_eq!(commit.previous_file_name(), "src/old.rs");
    }

    #[test]
    fn numstat_lines_carry_counts() {
        let change = parse_file_line("12\t3\tsrc/main.rs").unwrap();
        assert_eq!(change.additions, Some(12));
        assert_eq!(change.deletions, Some(3));
        assert_eq!(change.status, FileStatus::Modified);

        let binary = parse_file_line("-\t-\tlogo.png").unwrap();
        assert_eq!(binary.additions, Some(0));
    }

    #[test]
    fn numstat_renames_expand() {
        let braces = parse_file_line("1\t1\tsrc/{old => new}/mod.rs").unwrap();
        assert_eq!(braces.file_name, "src/new/mod.rs");
        assert_eq!(braces.original_file_name.as_deref(), Some("src/old/mod.rs"));
        assert_eq!(braces.status, FileStatus::Renamed);

        let empty_side = parse_file_line("0\t0\tsrc/{ => nested}/mod.rs").unwrap();
        assert_eq!(empty_side.file_name, "src/nested/mod.rs");
        assert_eq!(empty_side.original_file_name.as_deref(), Some("src/mod.rs"));

        let plain = parse_file_line("0\t0\ta.txt => b.txt").unwrap();
        assert_eq!(plain.file_name, "b.txt");
        assert_eq!(plain.original_file_name.as_deref(), Some("a.txt"));
    }

    #[test]
    fn name_status_copy_and_delete() {
        let copy = parse_file_line("C100\ta.rs\tb.rs").unwrap();
        assert_eq!(copy.status, FileStatus::Copied);
        assert_eq!(copy.original_file_name.as_deref(), Some("a.rs"));
        let deleted = parse_file_line("D\tgone.rs").unwrap();
        assert_eq!(deleted.status, FileStatus::Deleted);
        assert!(parse_file_line("not a file line").is_none());
    }
}
