//! Unified diff records.
//!
//! - `GitDiff`: raw diff text plus its parsed hunks
//! - `DiffHunk`: one `@@` block with per-side line indexes
//! - `DiffLine`: a single line (addition, deletion, or context)
//! - `DiffLinePair`: original/changed content for one editor line
//!
//! Hunk headers carry 1-based line numbers; every lookup method here takes the
//! editor's 0-based line and converts.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LineType {
    Context,
    Addition,
    Deletion,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiffLine {
    pub line_type: LineType,
    /// 1-based line on the original side (context and deletions)
    pub original_line: Option<usize>,
    /// 1-based line on the changed side (context and additions)
    pub changed_line: Option<usize>,
    pub content: String,
    /// Deletion this addition replaced, as an index into `DiffHunk::lines`
    pub paired: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffHunk {
    pub header: String,
    pub original_start: usize,
    pub original_count: usize,
    pub changed_start: usize,
    pub changed_count: usize,
    /// The hunk as unified-diff text, header included (used for hovers)
    pub text: String,
    pub lines: Vec<DiffLine>,
    /// `original_index[n]` is the index in `lines` of original line `original_start + n`
    pub original_index: Vec<usize>,
    /// `changed_index[n]` is the index in `lines` of changed line `changed_start + n`
    pub changed_index: Vec<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiffLinePair {
    pub original: Option<String>,
    pub changed: Option<String>,
    pub line_type: Option<LineType>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub insertions: usize,
    pub deletions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitDiff {
    pub diff: String,
    pub hunks: Vec<DiffHunk>,
}

impl DiffHunk {
    /// Changed-side span as 0-based editor lines. Pure deletions span the line
    /// they were removed before.
    pub fn covers_changed(&self, line: usize) -> bool {
        let one_based = line + 1;
        if self.changed_count == 0 {
            return one_based == self.changed_start || one_based == self.changed_start + 1;
        }
        one_based >= self.changed_start && one_based < self.changed_start + self.changed_count
    }

    pub fn changed(&self, line: usize) -> Option<&DiffLine> {
        let offset = (line + 1).checked_sub(self.changed_start)?;
        self.changed_index.get(offset).map(|&idx| &self.lines[idx])
    }

    pub fn original(&self, line: usize) -> Option<&DiffLine> {
        let offset = (line + 1).checked_sub(self.original_start)?;
        self.original_index.get(offset).map(|&idx| &self.lines[idx])
    }

    /// Original and changed content for a changed-side editor line
    pub fn line_pair(&self, line: usize) -> DiffLinePair {
        let Some(changed) = self.changed(line) else {
            // Deletion-only hunk: show what was removed here
            let removed: Vec<&str> = self
                .lines
                .iter()
                .filter(|l| l.line_type == LineType::Deletion)
                .map(|l| l.content.as_str())
                .collect();
            return DiffLinePair {
                original: (!removed.is_empty()).then(|| removed.join("\n")),
                changed: None,
                line_type: (!removed.is_empty()).then_some(LineType::Deletion),
            };
        };
        let original = match changed.line_type {
            LineType::Context => Some(changed.content.clone()),
            _ => changed.paired.map(|idx| self.lines[idx].content.clone()),
        };
        DiffLinePair {
            original,
            changed: Some(changed.content.clone()),
            line_type: Some(changed.line_type.clone()),
        }
    }

    pub fn stats(&self) -> DiffStats {
        let mut stats = DiffStats::default();
        for line in &self.lines {
            match line.line_type {
                LineType::Addition => stats.insertions += 1,
                LineType::Deletion => stats.deletions += 1,
                LineType::Context => {}
            }
        }
        stats
    }
}

impl GitDiff {
    pub fn hunk_for_line(&self, line: usize) -> Option<&DiffHunk> {
        self.hunks.iter().find(|h| h.covers_changed(line))
    }

    pub fn line_pair(&self, line: usize) -> Option<DiffLinePair> {
        self.hunk_for_line(line).map(|h| h.line_pair(line))
    }

    pub fn stats(&self) -> DiffStats {
        self.hunks.iter().fold(DiffStats::default(), |mut acc, h| {
            let s = h.stats();
            acc.insertions += s.insertions;
            acc.deletions += s.deletions;
            acc
        })
    }
}
