//! gitshadow - edit a remote Git repository without a working copy
//!
//! This crate mirrors a remote into a throwaway bare, shallow, partial
//! clone, lets you read and write commits, trees and blobs there, and pushes
//! the result back with force-with-lease protection.
//!
//! # Example
//!
//! ```no_run
//! use gitshadow::git::Repository;
//!
//! let repo = Repository::new("https://example.com/team/repo.git").unwrap();
//! for branch in repo.list_branches().unwrap() {
//!     println!("{branch}");
//! }
//! ```

pub mod config;
pub mod git;

pub use config::RepositoryConfig;
pub use git::{GitError, GitResult, Repository};
