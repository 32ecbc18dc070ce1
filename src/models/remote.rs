use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteUrlKind {
    Fetch,
    Push,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteUrl {
    pub kind: RemoteUrlKind,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRemote {
    pub repo_path: String,
    pub name: String,
    /// Host part of the fetch url, e.g. `github.com`
    pub domain: String,
    /// Repository path on the host, e.g. `owner/project`
    pub path: String,
    pub urls: Vec<RemoteUrl>,
}

impl GitRemote {
    pub fn url(&self, kind: RemoteUrlKind) -> Option<&str> {
        self.urls
            .iter()
            .find(|u| u.kind == kind)
            .map(|u| u.url.as_str())
    }

    pub fn fetch_url(&self) -> Option<&str> {
        self.url(RemoteUrlKind::Fetch)
    }
}
