use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitTag {
    pub repo_path: String,
    pub name: String,
    /// Commit the tag points at (peeled for annotated tags)
    pub sha: String,
    /// First line of the annotation, `None` for lightweight tags
    pub annotation: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl GitTag {
    pub fn is_annotated(&self) -> bool {
        self.annotation.is_some()
    }
}
