//! Parser for `git log --walk-reflogs` output produced with [`REFLOG_FORMAT`].
//!
//! One record per line, fields separated by `\x1f`:
//! `<sha> <selector> <subject> <unix time>`, where the subject reads
//! `command: details`.

use crate::models::{GitReflog, GitReflogRecord, timestamp_to_date};

pub const REFLOG_FORMAT: &str = "--format=%H%x1f%gd%x1f%gs%x1f%at";

const SEPARATOR: char = '\x1f';

fn parse_record(line: &str) -> Option<GitReflogRecord> {
    let mut fields = line.split(SEPARATOR);
    let sha = fields.next()?.trim();
    let selector = fields.next()?;
    let subject = fields.next()?;
    let timestamp: i64 = fields.next()?.trim().parse().ok()?;
    if sha.is_empty() {
        return None;
    }

    let (command, details) = match subject.split_once(": ") {
        Some((command, details)) => (command.to_string(), details.to_string()),
        None => (subject.to_string(), String::new()),
    };

    Some(GitReflogRecord {
        sha: sha.to_string(),
        selector: selector.to_string(),
        command,
        details,
        date: timestamp_to_date(timestamp),
    })
}

/// Parse reflog output. The command asks for `limit + 1` records so that
/// `has_more` can be reported.
pub fn parse(data: &str, repo_path: &str, limit: Option<usize>) -> Option<GitReflog> {
    if data.trim().is_empty() {
        return None;
    }

    let mut records: Vec<GitReflogRecord> = data.lines().filter_map(parse_record).collect();
    let has_more = match limit {
        Some(limit) if records.len() > limit => {
            records.truncate(limit);
            true
        }
        _ => false,
    };

    Some(GitReflog {
        repo_path: repo_path.to_string(),
        records,
        has_more,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sha: &str, n: usize, subject: &str) -> String {
        format!("{sha}\x1fHEAD@{{{n}}}\x1f{subject}\x1f1700000000\n")
    }

    #[test]
    fn splits_command_and_details() {
        let data = [
            record("aaaa", 0, "checkout: moving from main to feature"),
            record("bbbb", 1, "commit: Add parser"),
            record("cccc", 2, "checkout: moving from feature to main"),
            record("dddd", 3, "checkout: moving from main to feature"),
        ]
        .concat();

        let reflog = parse(&data, "/repo", None).unwrap();
        assert_eq!(reflog.records.len(), 4);
        assert_eq!(reflog.records[0].selector, "HEAD@{0}");
        assert_eq!(reflog.records[1].command, "commit");
        assert_eq!(reflog.records[1].details, "Add parser");
        assert_eq!(reflog.recent_branches(), vec!["feature", "main"]);
        assert!(!reflog.has_more);
    }

    #[test]
    fn limit_sets_has_more() {
        let data = [record("aaaa", 0, "commit: a"), record("bbbb", 1, "commit: b")].concat();
        let reflog = parse(&data, "/repo", Some(1)).unwrap();
        assert_eq!(reflog.records.len(), 1);
        assert!(reflog.has_more);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let reflog = parse("garbage\n", "/repo", None).unwrap();
        assert!(reflog.records.is_empty());
    }
}
