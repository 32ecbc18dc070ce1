//! Parsers for `git diff` output: unified hunks and `--name-status` summaries.

use std::sync::LazyLock;

use regex::Regex;

use super::log::parse_file_line;
use crate::models::{DiffHunk, DiffLine, FileChange, GitDiff, LineType};

static HUNK_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@(.*)$").expect("valid hunk regex")
});

struct HunkBuilder {
    hunk: DiffHunk,
    text: Vec<String>,
    /// Deletions since the last context line, waiting to be paired with additions
    removed_run: Vec<usize>,
    paired_in_run: usize,
    next_original: usize,
    next_changed: usize,
}

impl HunkBuilder {
    fn start(header: &str) -> Option<Self> {
        let caps = HUNK_HEADER_RE.captures(header)?;
        let num = |i: usize, default: usize| {
            caps.get(i)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(default)
        };
        let original_start = num(1, 0);
        let changed_start = num(3, 0);
        Some(Self {
            hunk: DiffHunk {
                header: header.to_string(),
                original_start,
                original_count: num(2, 1),
                changed_start,
                changed_count: num(4, 1),
                text: String::new(),
                lines: Vec::new(),
                original_index: Vec::new(),
                changed_index: Vec::new(),
            },
            text: vec![header.to_string()],
            removed_run: Vec::new(),
            paired_in_run: 0,
            next_original: original_start,
            next_changed: changed_start,
        })
    }

    fn push(&mut self, raw: &str) {
        let (line_type, content) = match raw.chars().next() {
            Some('+') => (LineType::Addition, &raw[1..]),
            Some('-') => (LineType::Deletion, &raw[1..]),
            Some(' ') => (LineType::Context, &raw[1..]),
            // "\ No newline at end of file"
            Some('\\') => {
                self.text.push(raw.to_string());
                return;
            }
            None => (LineType::Context, ""),
            Some(_) => return,
        };
        self.text.push(raw.to_string());

        let idx = self.hunk.lines.len();
        let mut line = DiffLine {
            line_type: line_type.clone(),
            original_line: None,
            changed_line: None,
            content: content.to_string(),
            paired: None,
        };

        match line_type {
            LineType::Context => {
                line.original_line = Some(self.next_original);
                line.changed_line = Some(self.next_changed);
                self.next_original += 1;
                self.next_changed += 1;
                self.hunk.original_index.push(idx);
                self.hunk.changed_index.push(idx);
                self.removed_run.clear();
                self.paired_in_run = 0;
            }
            LineType::Deletion => {
                if self.paired_in_run > 0 {
                    // A new removal block after additions
                    self.removed_run.clear();
                    self.paired_in_run = 0;
                }
                line.original_line = Some(self.next_original);
                self.next_original += 1;
                self.hunk.original_index.push(idx);
                self.removed_run.push(idx);
            }
            LineType::Addition => {
                line.changed_line = Some(self.next_changed);
                self.next_changed += 1;
                self.hunk.changed_index.push(idx);
                line.paired = self.removed_run.get(self.paired_in_run).copied();
                self.paired_in_run += 1;
            }
        }
        self.hunk.lines.push(line);
    }

    fn finish(mut self) -> DiffHunk {
        self.hunk.text = self.text.join("\n");
        self.hunk
    }
}

/// Parse unified diff text. Returns `None` when it contains no hunks.
pub fn parse(data: &str) -> Option<GitDiff> {
    if data.trim().is_empty() {
        return None;
    }

    let mut hunks = Vec::new();
    let mut current: Option<HunkBuilder> = None;

    for raw in data.lines() {
        let raw = raw.trim_end_matches('\r');
        if raw.starts_with("@@ ") {
            if let Some(done) = current.take() {
                hunks.push(done.finish());
            }
            current = HunkBuilder::start(raw);
            continue;
        }
        if raw.starts_with("diff --git ") {
            // Next file: the previous hunk is over
            if let Some(done) = current.take() {
                hunks.push(done.finish());
            }
            continue;
        }
        if let Some(builder) = current.as_mut() {
            builder.push(raw);
        }
    }
    if let Some(done) = current.take() {
        hunks.push(done.finish());
    }

    if hunks.is_empty() {
        return None;
    }
    Some(GitDiff {
        diff: data.to_string(),
        hunks,
    })
}

/// Parse `git diff --name-status` output
pub fn parse_name_status(data: &str) -> Option<Vec<FileChange>> {
    let changes: Vec<FileChange> = data.lines().filter_map(parse_file_line).collect();
    (!changes.is_empty()).then_some(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileStatus;

    const SAMPLE: &str = "diff --git a/src/lib.rs b/src/lib.rs
index 83db48f..bf269f4 100644
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -1,4 +1,5 @@ mod header
 use std::fmt;
-fn old() {}
+fn new() {}
+fn extra() {}

 fn keep() {}
@@ -10,2 +11,2 @@
-let a = 1;
+let a = 2;
 let b = 3;
";

    #[test]
    fn splits_hunks_on_headers() {
        let diff = parse(SAMPLE).unwrap();
        assert_eq!(diff.hunks.len(), 2);

        let first = &diff.hunks[0];
        assert_eq!((first.original_start, first.original_count), (1, 4));
        assert_eq!((first.changed_start, first.changed_count), (1, 5));
        assert_eq!(first.lines.len(), 6);
        assert_eq!(first.original_index.len(), 4);
        assert_eq!(first.changed_index.len(), 5);
        assert!(first.text.starts_with("@@ -1,4 +1,5 @@ mod header"));
        assert!(first.text.contains("+fn extra() {}"));
        assert!(!first.text.contains("let a"));
    }

    #[test]
    fn changed_line_lookup_pairs_replacements() {
        let diff = parse(SAMPLE).unwrap();

        // Editor line 1 is "fn new() {}", which replaced "fn old() {}"
        let pair = diff.line_pair(1).unwrap();
        assert_eq!(pair.changed.as_deref(), Some("fn new() {}"));
        assert_eq!(pair.original.as_deref(), Some("fn old() {}"));
        assert_eq!(pair.line_type, Some(LineType::Addition));

        // Pure addition has no original counterpart
        let pair = diff.line_pair(2).unwrap();
        assert_eq!(pair.changed.as_deref(), Some("fn extra() {}"));
        assert_eq!(pair.original, None);

        // Context line pairs with itself
        let pair = diff.line_pair(0).unwrap();
        assert_eq!(pair.original.as_deref(), Some("use std::fmt;"));

        // Second hunk starts at changed line 11
        let pair = diff.line_pair(10).unwrap();
        assert_eq!(pair.original.as_deref(), Some("let a = 1;"));
        assert_eq!(pair.changed.as_deref(), Some("let a = 2;"));

        assert!(diff.line_pair(7).is_none());
    }

    #[test]
    fn original_side_lookup() {
        let diff = parse(SAMPLE).unwrap();
        let hunk = &diff.hunks[0];
        assert_eq!(hunk.original(1).unwrap().content, "fn old() {}");
        assert_eq!(hunk.original(1).unwrap().line_type, LineType::Deletion);
        assert_eq!(hunk.changed(4).unwrap().content, "fn keep() {}");
    }

    #[test]
    fn zero_context_headers_default_counts() {
        let data = "@@ -5 +5,2 @@\n-old\n+new\n+more\n@@ -20,3 +21,0 @@\n-a\n-b\n-c\n";
        let diff = parse(data).unwrap();
        assert_eq!(diff.hunks[0].original_count, 1);
        assert_eq!(diff.hunks[0].changed_count, 2);

        let deletion = &diff.hunks[1];
        assert_eq!(deletion.changed_count, 0);
        let pair = diff.line_pair(20).unwrap();
        assert_eq!(pair.changed, None);
        assert_eq!(pair.original.as_deref(), Some("a\nb\nc"));
        assert_eq!(diff.stats().insertions, 2);
        assert_eq!(diff.stats().deletions, 4);
    }

    #[test]
    fn no_newline_marker_is_ignored() {
        let data = "@@ -1 +1 @@\n-a\n\\ No newline at end of file\n+b\n\\ No newline at end of file\n";
        let diff = parse(data).unwrap();
        assert_eq!(diff.hunks[0].lines.len(), 2);
        assert_eq!(diff.line_pair(0).unwrap().original.as_deref(), Some("a"));
    }

    #[test]
    fn empty_diff_is_none() {
        assert!(parse("").is_none());
        assert!(parse("diff --git a/x b/x\nindex 1..2\n").is_none());
    }

    #[test]
    fn name_status_summary() {
        let changes = parse_name_status("M\tsrc/a.rs\nR100\told.rs\tnew.rs\n").unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[1].status, FileStatus::Renamed);
        assert!(parse_name_status("").is_none());
    }
}
