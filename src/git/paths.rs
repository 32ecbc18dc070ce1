//! Path normalization shared by every cache key.
//!
//! Paths are kept as forward-slash strings. Cache keys are additionally
//! lowercased so that `Src/Main.rs` and `src/main.rs` land in the same entry
//! on case-insensitive filesystems.

pub fn normalize_path(path: &str) -> String {
    let replaced = path.replace('\\', "/");
    let mut normalized = String::with_capacity(replaced.len());
    let mut prev_slash = false;
    for (idx, ch) in replaced.chars().enumerate() {
        if ch == '/' {
            // Keep a leading `//` for UNC shares
            if prev_slash && idx > 1 {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        normalized.push(ch);
    }

    let mut normalized = normalized.as_str();
    while let Some(rest) = normalized.strip_prefix("./") {
        normalized = rest;
    }
    if normalized.len() > 1 && normalized.ends_with('/') && !is_drive_root(normalized) {
        normalized = &normalized[..normalized.len() - 1];
    }
    normalized.to_string()
}

pub fn to_cache_key(path: &str) -> String {
    normalize_path(path).to_lowercase()
}

pub fn is_absolute(path: &str) -> bool {
    let path = path.replace('\\', "/");
    if path.starts_with('/') {
        return true;
    }
    let bytes = path.as_bytes();
    bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'/'
}

fn is_drive_root(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() == 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'/'
}

/// Make `file` relative to `repo_path` when it lies inside it. Paths outside
/// the repository come back normalized but otherwise untouched.
pub fn relative_to(file: &str, repo_path: &str) -> String {
    let file = normalize_path(file);
    if !is_absolute(&file) {
        return file;
    }
    let repo = normalize_path(repo_path);
    if repo.is_empty() {
        return file;
    }
    if file.len() > repo.len()
        && file.as_bytes()[repo.len()] == b'/'
        && file[..repo.len()].eq_ignore_ascii_case(&repo)
    {
        return file[repo.len() + 1..].to_string();
    }
    if file.eq_ignore_ascii_case(&repo) {
        return String::new();
    }
    file
}

pub fn join(repo_path: &str, file: &str) -> String {
    let repo = normalize_path(repo_path);
    let file = normalize_path(file);
    if file.is_empty() {
        return repo;
    }
    if repo.is_empty() || is_absolute(&file) {
        return file;
    }
    if repo.ends_with('/') {
        format!("{}{}", repo, file)
    } else {
        format!("{}/{}", repo, file)
    }
}

/// Split a path into `(file_name, repo_path)`. With a known repository the
/// file becomes repo-relative; without one it splits into basename/dirname.
pub fn split_path(file: &str, repo_path: Option<&str>) -> (String, String) {
    match repo_path {
        Some(repo) if !repo.is_empty() => (relative_to(file, repo), normalize_path(repo)),
        _ => {
            let normalized = normalize_path(file);
            match normalized.rfind('/') {
                Some(0) => (normalized[1..].to_string(), "/".to_string()),
                Some(idx) => (
                    normalized[idx + 1..].to_string(),
                    normalized[..idx].to_string(),
                ),
                None => (normalized, String::new()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_separators() {
        assert_eq!(normalize_path("src\\git\\\\runner.rs"), "src/git/runner.rs");
        assert_eq!(normalize_path("./src/lib.rs"), "src/lib.rs");
        assert_eq!(normalize_path("/repo/"), "/repo");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("C:/"), "C:/");
        assert_eq!(normalize_path("\\\\server\\share"), "//server/share");
    }

    #[test]
    fn cache_key_lowercases() {
        assert_eq!(to_cache_key("C:\\Repo\\Src\\Main.RS"), "c:/repo/src/main.rs");
    }

    #[test]
    fn absolute_detection() {
        assert!(is_absolute("/usr/bin"));
        assert!(is_absolute("D:\\code"));
        assert!(!is_absolute("src/main.rs"));
        assert!(!is_absolute("D:"));
    }

    #[test]
    fn relative_to_strips_repo_prefix() {
        assert_eq!(relative_to("/repo/src/a.rs", "/repo"), "src/a.rs");
        assert_eq!(relative_to("/REPO/src/a.rs", "/repo/"), "src/a.rs");
        assert_eq!(relative_to("/repository/a.rs", "/repo"), "/repository/a.rs");
        assert_eq!(relative_to("src/a.rs", "/repo"), "src/a.rs");
        assert_eq!(relative_to("/repo", "/repo"), "");
    }

    #[test]
    fn join_respects_absolute_files() {
        assert_eq!(join("/repo", "src/a.rs"), "/repo/src/a.rs");
        assert_eq!(join("/repo", "/other/a.rs"), "/other/a.rs");
        assert_eq!(join("/repo", ""), "/repo");
        assert_eq!(join("/", "a.rs"), "/a.rs");
    }

    #[test]
    fn split_without_repo_uses_dirname() {
        assert_eq!(
            split_path("/repo/src/a.rs", None),
            ("a.rs".to_string(), "/repo/src".to_string())
        );
        assert_eq!(
            split_path("/repo/src/a.rs", Some("/repo")),
            ("src/a.rs".to_string(), "/repo".to_string())
        );
        assert_eq!(split_path("a.rs", None), ("a.rs".to_string(), String::new()));
    }
}
