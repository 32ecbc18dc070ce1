//! Blame records.
//!
//! A `GitBlame` is produced in one piece by the blame parser and never mutated.
//! Narrower views (one line, a selection) are derived from it in memory.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::commit::{CommitLine, GitCommit};

/// Inclusive range of 0-based line numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end: start }
        }
    }

    pub fn single(line: usize) -> Self {
        Self { start: line, end: line }
    }

    pub fn contains(&self, line: usize) -> bool {
        line >= self.start && line <= self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitAuthor {
    pub name: String,
    pub line_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitBlame {
    pub repo_path: String,
    /// Sorted by line count, most lines first
    pub authors: Vec<GitAuthor>,
    pub commits: HashMap<String, GitCommit>,
    /// One record per line, ordered by line number
    pub lines: Vec<CommitLine>,
}

/// Blame for a single line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitBlameLine {
    pub author: GitAuthor,
    pub commit: GitCommit,
    pub line: CommitLine,
}

/// Blame restricted to a range, keeping the full line list for context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitBlameLines {
    #[serde(flatten)]
    pub blame: GitBlame,
    pub all_lines: Vec<CommitLine>,
}

/// Aggregate line counts per author name, most lines first
pub fn aggregate_authors<'a, I>(commits: I) -> Vec<GitAuthor>
where
    I: IntoIterator<Item = &'a GitCommit>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for commit in commits {
        *counts.entry(commit.author.as_str()).or_default() += commit.lines.len();
    }
    let mut authors: Vec<GitAuthor> = counts
        .into_iter()
        .map(|(name, line_count)| GitAuthor {
            name: name.to_string(),
            line_count,
        })
        .collect();
    authors.sort_by(|a, b| b.line_count.cmp(&a.line_count).then_with(|| a.name.cmp(&b.name)));
    authors
}

impl GitBlame {
    pub fn line(&self, line: usize) -> Option<&CommitLine> {
        // Lines are dense and ordered in the common case
        match self.lines.get(line) {
            Some(l) if l.line == line => Some(l),
            _ => self.lines.iter().find(|l| l.line == line),
        }
    }

    pub fn commit_for_line(&self, line: usize) -> Option<&GitCommit> {
        self.line(line).and_then(|l| self.commits.get(&l.sha))
    }

    pub fn contains_sha(&self, sha: &str) -> bool {
        self.commits.contains_key(sha)
    }

    pub fn author(&self, name: &str) -> Option<&GitAuthor> {
        self.authors.iter().find(|a| a.name == name)
    }

    pub fn blame_line(&self, line: usize) -> Option<GitBlameLine> {
        let commit_line = self.line(line)?;
        let commit = self.commits.get(&commit_line.sha)?;
        let author = self.author(&commit.author).cloned().unwrap_or(GitAuthor {
            name: commit.author.clone(),
            line_count: commit.lines.len(),
        });
        Some(GitBlameLine {
            author,
            commit: commit.clone(),
            line: commit_line.clone(),
        })
    }

    /// Restrict to the lines in `range` without touching the repository.
    ///
    /// Each commit touched by the range is copied with only its in-range lines,
    /// and the author totals are rebuilt from those copies.
    pub fn for_range(&self, range: LineRange) -> GitBlameLines {
        let lines: Vec<CommitLine> = self
            .lines
            .iter()
            .filter(|l| range.contains(l.line))
            .cloned()
            .collect();

        let mut per_sha: HashMap<&str, Vec<CommitLine>> = HashMap::new();
        for line in &lines {
            per_sha.entry(line.sha.as_str()).or_default().push(line.clone());
        }

        let commits: HashMap<String, GitCommit> = per_sha
            .into_iter()
            .filter_map(|(sha, commit_lines)| {
                self.commits
                    .get(sha)
                    .map(|commit| (sha.to_string(), commit.with_lines(commit_lines)))
            })
            .collect();

        let authors = aggregate_authors(commits.values());

        GitBlameLines {
            blame: GitBlame {
                repo_path: self.repo_path.clone(),
                authors,
                commits,
                lines,
            },
            all_lines: self.lines.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::commit::CommitKind;

    fn commit(sha: &str, author: &str, lines: &[usize]) -> GitCommit {
        let mut c = GitCommit::new(CommitKind::Blame, "/repo", sha);
        c.author = author.to_string();
        c.lines = lines
            .iter()
            .map(|&line| CommitLine {
                sha: sha.to_string(),
                previous_sha: None,
                line,
                original_line: line,
            })
            .collect();
        c
    }

    fn two_author_blame() -> GitBlame {
        let a = commit(&"a".repeat(40), "Alice", &(0..50).collect::<Vec<_>>());
        let b = commit(&"b".repeat(40), "Bob", &(50..100).collect::<Vec<_>>());
        let mut lines: Vec<CommitLine> = a.lines.iter().chain(b.lines.iter()).cloned().collect();
        lines.sort_by_key(|l| l.line);
        let commits: HashMap<String, GitCommit> =
            [(a.sha.clone(), a), (b.sha.clone(), b)].into_iter().collect();
        GitBlame {
            repo_path: "/repo".to_string(),
            authors: aggregate_authors(commits.values()),
            commits,
            lines,
        }
    }

    #[test]
    fn range_splits_line_counts_per_commit() {
        let blame = two_author_blame();
        let view = blame.for_range(LineRange::new(10, 60));

        assert_eq!(view.blame.commits.len(), 2);
        assert_eq!(view.blame.commits[&"a".repeat(40)].lines.len(), 40);
        assert_eq!(view.blame.commits[&"b".repeat(40)].lines.len(), 11);
        assert_eq!(view.blame.lines.len(), 51);
        assert_eq!(view.all_lines.len(), 100);
        assert_eq!(
            view.blame.authors,
            vec![
                GitAuthor { name: "Alice".to_string(), line_count: 40 },
                GitAuthor { name: "Bob".to_string(), line_count: 11 },
            ]
        );
    }

    #[test]
    fn range_inside_one_commit_drops_the_other() {
        let blame = two_author_blame();
        let view = blame.for_range(LineRange::new(70, 60));
        assert_eq!(view.blame.commits.len(), 1);
        assert_eq!(view.blame.authors[0].name, "Bob");
        assert_eq!(view.blame.authors[0].line_count, 11);
    }

    #[test]
    fn blame_line_resolves_commit_and_author() {
        let blame = two_author_blame();
        let line = blame.blame_line(75).unwrap();
        assert_eq!(line.commit.author, "Bob");
        assert_eq!(line.author.line_count, 50);
        assert_eq!(line.line.line, 75);
        assert!(blame.blame_line(100).is_none());
    }

    #[test]
    fn whole_file_authors_sorted_by_lines() {
        let a = commit(&"a".repeat(40), "Alice", &[0]);
        let b = commit(&"b".repeat(40), "Bob", &[1, 2, 3]);
        let authors = aggregate_authors([&a, &b]);
        assert_eq!(authors[0].name, "Bob");
        assert_eq!(authors[1].line_count, 1);
    }
}
