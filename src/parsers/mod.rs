//! Parsers turning raw git output into the typed models.
//!
//! Every parser is a pure function of the text. Output that contains nothing
//! usable yields `None` (or an empty list), never an error.

pub mod blame;
pub mod branch;
pub mod diff;
pub mod log;
pub mod reflog;
pub mod remote;
pub mod stash;
pub mod status;
pub mod tag;
pub mod tree;

pub use branch::BRANCH_FORMAT;
pub use log::{LOG_FORMAT, LogParseContext, STASH_FORMAT};
pub use reflog::REFLOG_FORMAT;
pub use status::PorcelainVersion;
pub use tag::TAG_FORMAT;
