//! Domain records produced by the parsers and served by `GitService`.
//!
//! - `commit`: GitCommit, FileChange, CommitLine, revision-id predicates
//! - `blame`: GitBlame, GitBlameLine, GitBlameLines, LineRange
//! - `log`: GitLog with its paging continuation
//! - `diff`: GitDiff, DiffHunk, DiffLine
//! - `status`: GitStatus, GitStatusFile, tracking counts
//! - `branch`, `remote`, `tag`, `stash`, `reflog`, `tree`: repository-level lists
//! - `uri`: GitUri, a repo-relative file optionally pinned to a revision

pub mod blame;
pub mod branch;
pub mod commit;
pub mod diff;
pub mod log;
pub mod reflog;
pub mod remote;
pub mod stash;
pub mod status;
pub mod tag;
pub mod tree;
pub mod uri;

pub use blame::*;
pub use branch::*;
pub use commit::*;
pub use diff::*;
pub use log::*;
pub use reflog::*;
pub use remote::*;
pub use stash::*;
pub use status::*;
pub use tag::*;
pub use tree::*;
pub use uri::*;
