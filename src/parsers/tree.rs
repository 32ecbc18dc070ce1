//! Parser for `git ls-tree -l`.
//!
//! ```text
//! 100644 blob 83baae61804e65cc73a7201a7252750c76066a30      12	README.md
//! 040000 tree 1f7a7a472abf3dd9643fd615f6da379c4acb3e3a       -	src
//! ```

use crate::models::{EntryType, GitTreeEntry};

fn parse_entry(line: &str) -> Option<GitTreeEntry> {
    let (meta, path) = line.split_once('\t')?;
    let mut parts = meta.split_whitespace();
    let mode = parts.next()?;
    let object_type = parts.next()?;
    let sha = parts.next()?;
    let size = parts.next().and_then(|s| s.parse().ok());

    let entry_type = match (object_type, mode) {
        ("tree", _) => EntryType::Directory,
        ("commit", _) => EntryType::Submodule,
        ("blob", "120000") => EntryType::Symlink,
        ("blob", _) => EntryType::File,
        _ => return None,
    };

    Some(GitTreeEntry {
        path: path.to_string(),
        sha: sha.to_string(),
        mode: mode.to_string(),
        entry_type,
        size,
    })
}

pub fn parse(data: &str) -> Vec<GitTreeEntry> {
    data.lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter_map(parse_entry)
        .collect()
}
