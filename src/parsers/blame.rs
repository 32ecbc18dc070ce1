//! Parser for `git blame --incremental` output.
//!
//! ```text
//! <sha> <orig_line> <final_line> <num_lines>
//! author <name>
//! author-mail <<email>>
//! author-time <unix time>
//! author-tz <tz>
//! committer ...
//! summary <subject>
//! [previous <sha> <file>]
//! [boundary]
//! filename <file>
//! ```
//!
//! Metadata lines only follow the first group of a revision; later groups for
//! the same revision carry just `previous`/`filename`. Every group covers
//! `num_lines` consecutive final lines.

use std::collections::{BTreeMap, HashMap};

use crate::models::{
    CommitKind, CommitLine, GitBlame, GitCommit, aggregate_authors, timestamp_to_date,
};

#[derive(Debug)]
struct Group {
    sha: String,
    original_line: usize,
    final_line: usize,
    count: usize,
    previous_sha: Option<String>,
    previous_file_name: Option<String>,
    file_name: Option<String>,
}

fn is_revision(token: &str) -> bool {
    token.len() == 40 && token.bytes().all(|b| b.is_ascii_hexdigit())
}

fn parse_header(line: &str) -> Option<Group> {
    let mut parts = line.split_whitespace();
    let sha = parts.next().filter(|t| is_revision(t))?;
    let original_line: usize = parts.next()?.parse().ok()?;
    let final_line: usize = parts.next()?.parse().ok()?;
    let count: usize = parts.next().and_then(|n| n.parse().ok()).unwrap_or(1);
    if original_line == 0 || final_line == 0 {
        return None;
    }
    Some(Group {
        sha: sha.to_string(),
        original_line,
        final_line,
        count,
        previous_sha: None,
        previous_file_name: None,
        file_name: None,
    })
}

/// Parse blame output for `file_name` (repo-relative). Returns `None` when
/// there is no complete group in the output.
pub fn parse(data: &str, repo_path: &str, file_name: &str) -> Option<GitBlame> {
    if data.trim().is_empty() {
        return None;
    }

    let mut commits: HashMap<String, GitCommit> = HashMap::new();
    let mut lines: BTreeMap<usize, CommitLine> = BTreeMap::new();
    let mut group: Option<Group> = None;
    // Whether the current group's revision was first seen in this group
    let mut first_sight = false;

    let mut finish = |group: Group, commits: &mut HashMap<String, GitCommit>| {
        let Some(commit) = commits.get_mut(&group.sha) else {
            return;
        };
        if let Some(name) = group.file_name.as_deref() {
            if commit.original_file_name.is_none() && name != file_name {
                commit.original_file_name = Some(name.to_string());
            }
        }
        if commit.previous_sha.is_none() {
            commit.previous_sha = group.previous_sha.clone();
            commit.previous_file_name = group.previous_file_name.clone();
        }
        for i in 0..group.count {
            let line = group.final_line - 1 + i;
            lines.entry(line).or_insert_with(|| CommitLine {
                sha: group.sha.clone(),
                previous_sha: group.previous_sha.clone(),
                line,
                original_line: group.original_line - 1 + i,
            });
        }
    };

    for raw in data.lines() {
        let raw = raw.trim_end_matches('\r');

        if let Some(header) = parse_header(raw) {
            if let Some(done) = group.take() {
                finish(done, &mut commits);
            }
            first_sight = !commits.contains_key(&header.sha);
            if first_sight {
                let mut commit = GitCommit::new(CommitKind::Blame, repo_path, &header.sha);
                commit.file_name = file_name.to_string();
                commits.insert(header.sha.clone(), commit);
            }
            group = Some(header);
            continue;
        }

        let Some(current) = group.as_mut() else {
            continue;
        };

        let (key, value) = raw.split_once(' ').unwrap_or((raw, ""));
        match key {
            "previous" => {
                if let Some((sha, file)) = value.split_once(' ') {
                    current.previous_sha = Some(sha.to_string());
                    current.previous_file_name = Some(file.to_string());
                }
            }
            "filename" => {
                current.file_name = Some(value.to_string());
                if let Some(done) = group.take() {
                    finish(done, &mut commits);
                }
            }
            _ if first_sight => {
                let Some(commit) = commits.get_mut(&current.sha) else {
                    continue;
                };
                match key {
                    "author" => commit.author = value.to_string(),
                    "author-mail" => {
                        let email = value.trim_start_matches('<').trim_end_matches('>');
                        commit.email = (!email.is_empty()).then(|| email.to_string());
                    }
                    "author-time" => {
                        commit.date = timestamp_to_date(value.trim().parse().unwrap_or(0));
                    }
                    "summary" => commit.summary = value.to_string(),
                    _ => {}
                }
            }
            _ => {}
        }
    }

    // Interrupted output: keep the last group if its header made it through
    if let Some(done) = group.take() {
        finish(done, &mut commits);
    }

    if lines.is_empty() {
        return None;
    }

    for commit in commits.values_mut() {
        commit.lines.clear();
    }
    for line in lines.values() {
        if let Some(commit) = commits.get_mut(&line.sha) {
            commit.lines.push(line.clone());
        }
    }
    commits.retain(|_, commit| !commit.lines.is_empty());

    let authors = aggregate_authors(commits.values());

    Some(GitBlame {
        repo_path: repo_path.to_string(),
        authors,
        commits,
        lines: lines.into_values().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UNCOMMITTED_SHA;

    const A: &str = "1111111111111111111111111111111111111111";
    const B: &str = "2222222222222222222222222222222222222222";

    fn first_group(sha: &str, orig: usize, fin: usize, count: usize, author: &str, extra: &str) -> String {
        format!(
            "{sha} {orig} {fin} {count}\nauthor {author}\nauthor-mail <{email}>\nauthor-time 1700000000\nauthor-tz +0100\ncommitter {author}\ncommitter-mail <{email}>\ncommitter-time 1700000000\ncommitter-tz +0100\nsummary Change by {author}\n{extra}filename src/lib.rs\n",
            email = format!("{}@example.com", author.to_lowercase()),
        )
    }

    fn repeat_group(sha: &str, orig: usize, fin: usize, count: usize) -> String {
        format!("{sha} {orig} {fin} {count}\nfilename src/lib.rs\n")
    }

    #[test]
    fn repeat_count_expands_to_one_line_each() {
        let data = [
            first_group(A, 1, 1, 3, "Alice", ""),
            first_group(B, 4, 4, 2, "Bob", &format!("previous {A} src/lib.rs\n")),
            repeat_group(A, 6, 6, 1),
        ]
        .concat();

        let blame = parse(&data, "/repo", "src/lib.rs").unwrap();
        assert_eq!(blame.lines.len(), 6);
        let owners: Vec<&str> = blame.lines.iter().map(|l| l.sha.as_str()).collect();
        assert_eq!(owners, [A, A, A, B, B, A]);
        assert_eq!(blame.lines[0].line, 0);
        assert_eq!(blame.lines[5].line, 5);

        assert_eq!(blame.commits.len(), 2);
        assert_eq!(blame.commits[A].lines.len(), 4);
        assert_eq!(blame.commits[B].lines.len(), 2);
        assert_eq!(blame.commits[B].previous_sha.as_deref(), Some(A));
        assert_eq!(blame.commits[A].author, "Alice");
        assert_eq!(blame.commits[A].email.as_deref(), Some("alice@example.com"));
        assert_eq!(blame.commits[B].summary, "Change by Bob");

        assert_eq!(blame.authors[0].name, "Alice");
        assert_eq!(blame.authors[0].line_count, 4);
        assert_eq!(blame.authors[1].line_count, 2);
    }

    #[test]
    fn repeat_group_does_not_reset_metadata() {
        let data = [first_group(A, 1, 1, 1, "Alice", ""), repeat_group(A, 2, 2, 1)].concat();
        let blame = parse(&data, "/repo", "src/lib.rs").unwrap();
        assert_eq!(blame.commits.len(), 1);
        assert_eq!(blame.commits[A].author, "Alice");
        assert_eq!(blame.commits[A].summary, "Change by Alice");
    }

    #[test]
    fn every_referenced_revision_has_a_commit() {
        let data = [
            first_group(UNCOMMITTED_SHA, 3, 3, 1, "Not Committed Yet", ""),
            first_group(A, 1, 1, 2, "Alice", ""),
        ]
        .concat();
        let blame = parse(&data, "/repo", "src/lib.rs").unwrap();
        for line in &blame.lines {
            assert!(blame.commits.contains_key(&line.sha));
        }
        assert!(blame.commits[UNCOMMITTED_SHA].is_uncommitted());
    }

    #[test]
    fn renamed_file_records_original_name() {
        let data = format!(
            "{A} 1 1 1\nauthor Alice\nauthor-time 1\nsummary init\nfilename src/old.rs\n"
        );
        let blame = parse(&data, "/repo", "src/lib.rs").unwrap();
        assert_eq!(blame.commits[A].original_file_name.as_deref(), Some("src/old.rs"));
        assert_eq!(blame.commits[A].file_name, "src/lib.rs");
    }

    #[test]
    fn interrupted_output_keeps_finished_groups() {
        let data = format!("{}{B} 2 2 1\nauthor Bo", first_group(A, 1, 1, 1, "Alice", ""));
        let blame = parse(&data, "/repo", "src/lib.rs").unwrap();
        assert_eq!(blame.lines.len(), 2);
        assert_eq!(blame.commits[B].author, "Bo");
    }

    #[test]
    fn empty_or_junk_is_none() {
        assert!(parse("", "/repo", "a").is_none());
        assert!(parse("fatal: no such path\n", "/repo", "a").is_none());
    }
}
