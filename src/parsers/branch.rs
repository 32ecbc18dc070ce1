//! Parser for `git for-each-ref` output produced with [`BRANCH_FORMAT`].

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{GitBranch, TrackingState, timestamp_to_date};

pub const BRANCH_FORMAT: &str = "--format=%(HEAD)%1f%(refname)%1f%(upstream:short)%1f%(upstream:track)%1f%(objectname)%1f%(committerdate:raw)";

const SEPARATOR: char = '\x1f';

static TRACK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(?:ahead (\d+))?(?:, )?(?:behind (\d+))?\]").expect("valid track regex")
});

pub(crate) fn parse_track(track: &str) -> TrackingState {
    let Some(caps) = TRACK_RE.captures(track) else {
        return TrackingState::default();
    };
    let count = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    TrackingState {
        ahead: count(1),
        behind: count(2),
    }
}

fn parse_branch(line: &str, repo_path: &str) -> Option<GitBranch> {
    let fields: Vec<&str> = line.split(SEPARATOR).collect();
    if fields.len() < 6 {
        return None;
    }
    let refname = fields[1];
    let (name, remote) = if let Some(local) = refname.strip_prefix("refs/heads/") {
        (local, false)
    } else if let Some(remote) = refname.strip_prefix("refs/remotes/") {
        // The symbolic `origin/HEAD` is not a branch
        if remote.ends_with("/HEAD") {
            return None;
        }
        (remote, true)
    } else {
        return None;
    };

    let tracking = (!fields[2].is_empty()).then(|| fields[2].to_string());
    let date = fields[5]
        .split_whitespace()
        .next()
        .and_then(|t| t.parse::<i64>().ok())
        .map(timestamp_to_date);

    Some(GitBranch {
        repo_path: repo_path.to_string(),
        name: name.to_string(),
        remote,
        current: fields[0] == "*",
        sha: (!fields[4].is_empty()).then(|| fields[4].to_string()),
        tracking,
        state: parse_track(fields[3]),
        date,
    })
}

pub fn parse(data: &str, repo_path: &str) -> Vec<GitBranch> {
    data.lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter_map(|line| parse_branch(line, repo_path))
        .collect()
}
