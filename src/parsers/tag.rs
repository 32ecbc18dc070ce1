//! Parser for `git for-each-ref refs/tags` output produced with [`TAG_FORMAT`].

use crate::models::{GitTag, timestamp_to_date};

pub const TAG_FORMAT: &str = "--format=%(refname:short)%1f%(objecttype)%1f%(objectname)%1f%(*objectname)%1f%(contents:subject)%1f%(creatordate:raw)";

const SEPARATOR: char = '\x1f';

fn parse_tag(line: &str, repo_path: &str) -> Option<GitTag> {
    let fields: Vec<&str> = line.split(SEPARATOR).collect();
    if fields.len() < 6 || fields[0].is_empty() {
        return None;
    }
    let annotated = fields[1] == "tag";
    // Annotated tags point at a tag object; report the commit behind it
    let sha = if annotated && !fields[3].is_empty() {
        fields[3]
    } else {
        fields[2]
    };
    let date = fields[5]
        .split_whitespace()
        .next()
        .and_then(|t| t.parse::<i64>().ok())
        .map(timestamp_to_date);

    Some(GitTag {
        repo_path: repo_path.to_string(),
        name: fields[0].to_string(),
        sha: sha.to_string(),
        annotation: annotated.then(|| fields[4].to_string()),
        date,
    })
}

pub fn parse(data: &str, repo_path: &str) -> Vec<GitTag> {
    data.lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter_map(|line| parse_tag(line, repo_path))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotated_and_lightweight() {
        let data = "v1.0\x1ftag\x1ftagobj\x1fcommit1\x1fRelease 1.0\x1f1700000000 +0000\nv0.9\x1fcommit\x1fcommit0\x1f\x1fSome commit\x1f1600000000 +0000\n";
        let tags = parse(data, "/repo");
        assert_eq!(tags.len(), 2);

        assert!(tags[0].is_annotated());
        assert_eq!(tags[0].sha, "commit1");
        assert_eq!(tags[0].annotation.as_deref(), Some("Release 1.0"));

        assert!(!tags[1].is_annotated());
        assert_eq!(tags[1].sha, "commit0");
        assert_eq!(tags[1].date.unwrap().timestamp(), 1_600_000_000);
    }
}
