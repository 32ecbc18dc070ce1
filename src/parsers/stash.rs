//! Parser for `git stash list` output produced with [`STASH_FORMAT`](super::log::STASH_FORMAT).

use super::log::scan;
use crate::models::{CommitKind, GitStash, GitStashCommit};

pub fn parse(data: &str, repo_path: &str) -> Option<GitStash> {
    if data.trim().is_empty() {
        return None;
    }

    let commits: Vec<GitStashCommit> = scan(data)
        .into_iter()
        .filter_map(|mut entry| {
            let stash_name = entry.selector.take()?;
            Some(GitStashCommit {
                stash_name,
                commit: entry.into_commit(CommitKind::Stash, repo_path, None),
            })
        })
        .collect();

    Some(GitStash {
        repo_path: repo_path.to_string(),
        commits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(sha: &str, selector: &str, message: &str) -> String {
        format!("<r> {sha}\n<d> 1700000000\n<l> {selector}\n<s>\n{message}\n</s>\n<f>\n\nM\tsrc/lib.rs\n")
    }

    #[test]
    fn stashes_keep_selector_and_files() {
        let data = [
            entry("1111111111111111111111111111111111111111", "stash@{0}", "WIP on main: 1234567 msg"),
            entry("2222222222222222222222222222222222222222", "stash@{1}", "On feature: experiment"),
        ]
        .concat();

        let stash = parse(&data, "/repo").unwrap();
        assert_eq!(stash.commits.len(), 2);

        let first = stash.get("stash@{0}").unwrap();
        assert_eq!(first.index(), Some(0));
        assert_eq!(first.on_ref(), Some("main"));
        assert_eq!(first.commit.kind, CommitKind::Stash);
        assert_eq!(first.commit.files.len(), 1);

        assert_eq!(stash.commits[1].on_ref(), Some("feature"));
    }

    #[test]
    fn no_stashes() {
        assert!(parse("", "/repo").is_none());
    }
}
