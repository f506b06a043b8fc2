//! reflog-persist - persistent branch reflogs for hosted git repositories
//!
//! Git keeps a branch's reflog in a plain file under `logs/` that is never
//! replicated and can be truncated or rewritten. This crate runs as a
//! ref-update hook and captures that file into the object database, under
//! `refs/reflogs/<branch>`, so the history of a branch survives.
//!
//! # Example
//!
//! ```no_run
//! use reflog_persist::config::Config;
//! use reflog_persist::hook::{self, RefUpdate};
//!
//! let config = Config::new("/srv/git/project.git");
//! let update = RefUpdate {
//!     refname: "refs/heads/main".to_string(),
//!     ..Default::default()
//! };
//! if let Some(outcome) = hook::persist(&config, &update)? {
//!     println!("{}", outcome.status_line());
//! }
//! # Ok::<(), reflog_persist::reflog::ReflogError>(())
//! ```

pub mod config;
pub mod hook;
pub mod reflog;
pub mod storage;
