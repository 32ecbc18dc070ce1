//! Git plumbing and the `GitService` facade.
//!
//! - `locator`, `runner`, `commands`: finding git, running it, building argv
//! - `paths`: normalization and cache keys
//! - `cache`, `ignore`, `repository`, `watcher`: cached state and invalidation
//! - `service`: the facade; its query methods are split per concern across
//!   `blame`, `history`, `diff`, `status`, `refs` and `tree`

pub mod blame;
pub mod cache;
pub mod commands;
pub mod diff;
pub mod history;
pub mod ignore;
pub mod locator;
pub mod paths;
pub mod refs;
pub mod repository;
pub mod runner;
pub mod service;
pub mod status;
pub mod tree;
pub mod watcher;

pub use history::LogOptions;
pub use locator::{GitLocation, GitVersion, find_git};
pub use repository::{Repository, RepositoryChange, SharedRepository};
pub use runner::{
    BenignReason, CommandFailure, ExecFuture, GitRunner, ProcessExecutor, ProcessOutput, TokioExecutor,
};
pub use service::{CacheKey, GitService, ServiceStats};
