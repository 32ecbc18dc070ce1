//! Git data layer for editor annotations: blame, history, diffs, status and
//! refs read through the `git` executable, with a per-document cache that
//! shares in-flight queries and is invalidated by index and document events.

pub mod config;
pub mod error;
pub mod events;
pub mod git;
pub mod models;
pub mod parsers;

pub use config::Config;
pub use error::{GitError, Result};
pub use events::{EventEmitter, Subscription};
pub use git::{GitService, LogOptions};
