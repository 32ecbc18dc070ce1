//! Discovery of the git executable and its version.
//!
//! A configured path is trusted as long as it exists; otherwise every `PATH`
//! entry is searched. The version decides which status porcelain is used.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use super::runner::tokio_command;
use crate::error::{GitError, Result};

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").expect("valid version regex"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct GitVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl GitVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// Parse `git --version` output, e.g. `git version 2.43.0.windows.1`
    pub fn parse(text: &str) -> Option<Self> {
        let caps = VERSION_RE.captures(text)?;
        let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse().ok());
        Some(Self {
            major: num(1)?,
            minor: num(2)?,
            patch: num(3).unwrap_or(0),
        })
    }

    pub fn at_least(&self, major: u32, minor: u32) -> bool {
        *self >= Self::new(major, minor, 0)
    }

    /// `git status --porcelain=v2` arrived in 2.11
    pub fn supports_status_v2(&self) -> bool {
        self.at_least(2, 11)
    }
}

impl fmt::Display for GitVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitLocation {
    pub path: PathBuf,
    pub version: GitVersion,
}

fn executable_names() -> &'static [&'static str] {
    if cfg!(windows) {
        &["git.exe", "git.cmd", "git"]
    } else {
        &["git"]
    }
}

/// Search `PATH` for a git executable
pub fn search_path() -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths).find_map(|dir| {
        executable_names()
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    })
}

/// Locate git, preferring `configured`, and read its version.
pub async fn find_git(configured: Option<&Path>) -> Result<GitLocation> {
    let path = match configured {
        Some(path) if path.is_file() => path.to_path_buf(),
        Some(path) => {
            tracing::warn!(path = %path.display(), "Configured git path not found, searching PATH");
            search_path().ok_or_else(|| GitError::GitNotFound(path.display().to_string()))?
        }
        None => search_path().ok_or_else(|| GitError::GitNotFound("not on PATH".to_string()))?,
    };

    let output = tokio_command(&path).arg("--version").output().await?;
    let text = String::from_utf8_lossy(&output.stdout);
    let version = GitVersion::parse(&text).ok_or_else(|| {
        GitError::GitNotFound(format!("{} did not report a version", path.display()))
    })?;

    tracing::info!(path = %path.display(), %version, "Found git");
    Ok(GitLocation { path, version })
}
