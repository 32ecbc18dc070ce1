//! Parser for `git remote -v`.
//!
//! ```text
//! origin  https://github.com/owner/project.git (fetch)
//! origin  git@github.com:owner/project.git (push)
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{GitRemote, RemoteUrl, RemoteUrlKind};

/// `scheme://[user@]host[:port]/path`
static SCHEME_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://(?:[^@/]*@)?([^/:]+)(?::\d*)?/?(.*)$")
        .expect("valid url regex")
});
/// scp-like `[user@]host:path`
static SCP_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[^@/]*@)?([^/:]+):(.*)$").expect("valid scp regex"));

/// Split a remote url into `(domain, path)`. Local paths have no domain.
pub fn parse_remote_url(url: &str) -> (String, String) {
    let caps = SCHEME_URL_RE
        .captures(url)
        .filter(|_| !url.starts_with("file://"))
        .or_else(|| SCP_URL_RE.captures(url).filter(|_| !url.contains("://")));

    match caps {
        Some(caps) => {
            let domain = caps.get(1).map_or("", |m| m.as_str()).to_string();
            let path = caps.get(2).map_or("", |m| m.as_str());
            (domain, clean_path(path))
        }
        None => (String::new(), clean_path(url.trim_start_matches("file://"))),
    }
}

fn clean_path(path: &str) -> String {
    path.trim_start_matches('/')
        .trim_end_matches('/')
        .trim_end_matches(".git")
        .to_string()
}

pub fn parse(data: &str, repo_path: &str) -> Vec<GitRemote> {
    let mut remotes: Vec<GitRemote> = Vec::new();

    for line in data.lines() {
        let line = line.trim_end_matches('\r');
        let Some((name, rest)) = line.split_once(char::is_whitespace) else {
            continue;
        };
        let rest = rest.trim();
        let (url, kind) = match rest.rsplit_once(' ') {
            Some((url, "(fetch)")) => (url.trim(), RemoteUrlKind::Fetch),
            Some((url, "(push)")) => (url.trim(), RemoteUrlKind::Push),
            _ => (rest, RemoteUrlKind::Fetch),
        };

        let remote = match remotes.iter_mut().position(|r| r.name == name) {
            Some(idx) => &mut remotes[idx],
            None => {
                let (domain, path) = parse_remote_url(url);
                remotes.push(GitRemote {
                    repo_path: repo_path.to_string(),
                    name: name.to_string(),
                    domain,
                    path,
                    urls: Vec::new(),
                });
                let last = remotes.len() - 1;
                &mut remotes[last]
            }
        };
        if kind == RemoteUrlKind::Fetch {
            let (domain, path) = parse_remote_url(url);
            remote.domain = domain;
            remote.path = path;
        }
        remote.urls.push(RemoteUrl {
            kind,
            url: url.to_string(),
        });
    }
    remotes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_forms() {
        assert_eq!(
            parse_remote_url("https://github.com/owner/project.git"),
            ("github.com".to_string(), "owner/project".to_string())
        );
        assert_eq!(
            parse_remote_url("git@github.com:owner/project.git"),
            ("github.com".to_string(), "owner/project".to_string())
        );
        assert_eq!(
            parse_remote_url("ssh://git@host.example:2222/team/repo"),
            ("host.example".to_string(), "team/repo".to_string())
        );
        assert_eq!(
            parse_remote_url("https://user@dev.azure.com/org/project/_git/repo"),
            ("dev.azure.com".to_string(), "org/project/_git/repo".to_string())
        );
        assert_eq!(parse_remote_url("/srv/git/repo.git").0, "");
    }

    #[test]
    fn groups_fetch_and_push_urls() {
        let data = "origin\thttps://github.com/owner/project.git (fetch)\norigin\tgit@github.com:owner/project.git (push)\nupstream\thttps://gitlab.com/team/project (fetch)\n";
        let remotes = parse(data, "/repo");
        assert_eq!(remotes.len(), 2);

        let origin = &remotes[0];
        assert_eq!(origin.domain, "github.com");
        assert_eq!(origin.path, "owner/project");
        assert_eq!(origin.urls.len(), 2);
        assert_eq!(origin.fetch_url(), Some("https://github.com/owner/project.git"));
        assert_eq!(origin.url(RemoteUrlKind::Push), Some("git@github.com:owner/project.git"));

        assert_eq!(remotes[1].domain, "gitlab.com");
    }
}
