//! Argument builders for every git invocation the service makes.
//!
//! Kept apart from the query code so the exact command lines can be unit
//! tested and matched by scripted executors.

use crate::models::{LineRange, is_staged_uncommitted, is_uncommitted};
use crate::parsers::{BRANCH_FORMAT, LOG_FORMAT, REFLOG_FORMAT, STASH_FORMAT, TAG_FORMAT};

fn owned(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| a.to_string()).collect()
}

/// A revision worth passing on the command line: the working-tree and index
/// sentinels are expressed by leaving the revision out
fn committed(sha: Option<&str>) -> Option<&str> {
    sha.filter(|s| !s.is_empty() && !is_uncommitted(s))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BlameArgs<'a> {
    pub sha: Option<&'a str>,
    pub ignore_whitespace: bool,
    /// 0-based inclusive range, passed as `-L start,end`
    pub range: Option<LineRange>,
}

pub fn blame(file_name: &str, opts: BlameArgs<'_>) -> Vec<String> {
    let mut args = owned(&["blame", "--root", "--incremental"]);
    if opts.ignore_whitespace {
        args.push("-w".to_string());
    }
    if let Some(range) = opts.range {
        args.push(format!("-L{},{}", range.start + 1, range.end + 1));
    }
    if let Some(sha) = committed(opts.sha) {
        args.push(sha.to_string());
    }
    args.push("--".to_string());
    args.push(file_name.to_string());
    args
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogArgs<'a> {
    /// Revision or range to start from
    pub reference: Option<&'a str>,
    /// Page size; one extra commit is requested to detect another page
    pub max_count: Option<usize>,
    pub skip: usize,
    pub reverse: bool,
}

fn log_paging(args: &mut Vec<String>, opts: &LogArgs<'_>) {
    if let Some(max) = opts.max_count {
        args.push(format!("-n{}", max + 1));
    }
    if opts.skip > 0 {
        args.push(format!("--skip={}", opts.skip));
    }
    if opts.reverse {
        args.push("--reverse".to_string());
    }
    if let Some(reference) = committed(opts.reference) {
        args.push(reference.to_string());
    }
}

pub fn log_for_repo(opts: LogArgs<'_>) -> Vec<String> {
    let mut args = owned(&["log", LOG_FORMAT, "--name-status", "--full-history", "-M"]);
    log_paging(&mut args, &opts);
    args.push("--".to_string());
    args
}

pub fn log_for_file(file_name: &str, opts: LogArgs<'_>) -> Vec<String> {
    let mut args = owned(&["log", LOG_FORMAT, "--name-status", "--full-history", "-M"]);
    // --follow only works without --reverse and without a range
    let is_range = opts.reference.is_some_and(|r| r.contains(".."));
    if !opts.reverse && !is_range {
        args.push("--follow".to_string());
    }
    log_paging(&mut args, &opts);
    args.push("--".to_string());
    args.push(file_name.to_string());
    args
}

fn diff_revisions(args: &mut Vec<String>, sha1: Option<&str>, sha2: Option<&str>) {
    if sha1.is_some_and(is_staged_uncommitted) {
        args.push("--cached".to_string());
    } else if let Some(sha1) = committed(sha1) {
        args.push(sha1.to_string());
    }
    if let Some(sha2) = committed(sha2) {
        args.push(sha2.to_string());
    }
}

pub fn diff_for_file(file_name: &str, sha1: Option<&str>, sha2: Option<&str>) -> Vec<String> {
    let mut args = owned(&["diff", "--no-ext-diff", "--minimal", "-M", "-U0"]);
    diff_revisions(&mut args, sha1, sha2);
    args.push("--".to_string());
    args.push(file_name.to_string());
    args
}

pub fn diff_status(sha1: Option<&str>, sha2: Option<&str>) -> Vec<String> {
    let mut args = owned(&["diff", "--no-ext-diff", "--name-status", "-M"]);
    diff_revisions(&mut args, sha1, sha2);
    args.push("--".to_string());
    args
}

pub fn status(porcelain_v2: bool, file_name: Option<&str>) -> Vec<String> {
    let porcelain = if porcelain_v2 { "--porcelain=v2" } else { "--porcelain" };
    let mut args = owned(&["status", porcelain, "--branch", "-u"]);
    if let Some(file_name) = file_name {
        args.push("--".to_string());
        args.push(file_name.to_string());
    }
    args
}

pub fn stash_list() -> Vec<String> {
    owned(&["stash", "list", STASH_FORMAT, "--name-status"])
}

pub fn branches() -> Vec<String> {
    owned(&["for-each-ref", BRANCH_FORMAT, "refs/heads", "refs/remotes"])
}

pub fn remotes() -> Vec<String> {
    owned(&["remote", "-v"])
}

pub fn tags() -> Vec<String> {
    owned(&["for-each-ref", TAG_FORMAT, "--sort=-creatordate", "refs/tags"])
}

pub fn reflog(limit: Option<usize>, skip: usize) -> Vec<String> {
    let mut args = owned(&["log", "--walk-reflogs", REFLOG_FORMAT]);
    if let Some(limit) = limit {
        args.push(format!("-n{}", limit + 1));
    }
    if skip > 0 {
        args.push(format!("--skip={}", skip));
    }
    args.push("HEAD".to_string());
    args.push("--".to_string());
    args
}

/// `git show <sha>:<file>`; the index sentinel reads the staged blob
pub fn show_file(file_name: &str, sha: &str) -> Vec<String> {
    let object = if is_staged_uncommitted(sha) {
        format!(":{}", file_name)
    } else {
        format!("{}:{}", sha, file_name)
    };
    vec!["show".to_string(), object]
}

pub fn ls_tree(sha: &str, path: Option<&str>) -> Vec<String> {
    let mut args = owned(&["ls-tree", "-l", sha]);
    if let Some(path) = path {
        args.push("--".to_string());
        args.push(path.to_string());
    }
    args
}

/// Lists the file if the index knows it, or if `sha` contains it
pub fn ls_files(file_name: &str, sha: Option<&str>) -> Vec<String> {
    match committed(sha) {
        Some(sha) => owned(&["ls-tree", "--name-only", sha, "--", file_name]),
        None => owned(&["ls-files", "--", file_name]),
    }
}

pub fn show_toplevel() -> Vec<String> {
    owned(&["rev-parse", "--show-toplevel"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{STAGED_UNCOMMITTED_SHA, UNCOMMITTED_SHA};

    const SHA: &str = "1234567890abcdef1234567890abcdef12345678";

    #[test]
    fn blame_leaves_out_uncommitted_revisions() {
        let args = blame("src/a.rs", BlameArgs { sha: Some(UNCOMMITTED_SHA), ..Default::default() });
        assert_eq!(args, ["blame", "--root", "--incremental", "--", "src/a.rs"]);

        let args = blame(
            "src/a.rs",
            BlameArgs {
                sha: Some(SHA),
                ignore_whitespace: true,
                range: Some(LineRange::single(9)),
            },
        );
        assert_eq!(args, ["blame", "--root", "--incremental", "-w", "-L10,10", SHA, "--", "src/a.rs"]);
    }

    #[test]
    fn log_pages_ask_for_one_extra() {
        let args = log_for_file("a.rs", LogArgs { max_count: Some(2), skip: 2, ..Default::default() });
        assert!(args.contains(&"--follow".to_string()));
        assert!(args.contains(&"-n3".to_string()));
        assert!(args.contains(&"--skip=2".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("a.rs"));

        let ranged = log_for_file("a.rs", LogArgs { reference: Some("main..dev"), ..Default::default() });
        assert!(!ranged.contains(&"--follow".to_string()));
        assert!(ranged.contains(&"main..dev".to_string()));
    }

    #[test]
    fn diff_maps_index_sentinel_to_cached() {
        let args = diff_for_file("a.rs", Some(STAGED_UNCOMMITTED_SHA), None);
        assert!(args.contains(&"--cached".to_string()));

        let args = diff_for_file("a.rs", Some(SHA), Some(UNCOMMITTED_SHA));
        assert_eq!(&args[5..], [SHA, "--", "a.rs"]);
    }

    #[test]
    fn show_file_reads_index_for_staged_sentinel() {
        assert_eq!(show_file("a.rs", STAGED_UNCOMMITTED_SHA), ["show", ":a.rs"]);
        assert_eq!(show_file("a.rs", SHA), ["show".to_string(), format!("{SHA}:a.rs")]);
    }

    #[test]
    fn status_versions() {
        assert_eq!(status(true, None)[1], "--porcelain=v2");
        assert_eq!(status(false, Some("a.rs")), ["status", "--porcelain", "--branch", "-u", "--", "a.rs"]);
    }
}
