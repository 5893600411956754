//! git layer for gitshadow
//!
//! this module drives a transient shadow of a remote repository through the
//! `git` binary. Nothing here links against a git library; every read and
//! write is a plumbing command run inside the shadow store.
//!
//!  # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Repository                           │
//! │   (setup, branches, object access, commit-tree, push)       │
//! └─────────────────────────────────────────────────────────────┘
//!          │                    │                    │
//!          ▼                    ▼                    ▼
//!   ┌─────────────┐      ┌─────────────┐      ┌─────────────┐
//!   │    refs     │      │   object    │      │    store    │
//!   │ (branches)  │      │ (handles)   │      │ (temp dir)  │
//!   └─────────────┘      └─────────────┘      └─────────────┘
//!                               │
//!                   ┌───────────┴───────────┐
//!                   ▼                       ▼
//!            ┌─────────────┐         ┌─────────────┐
//!            │   commit    │         │    tree     │
//!            │  (parsing)  │         │ (ls/mktree) │
//!            └─────────────┘         └─────────────┘
//!                               │
//!                               ▼
//!                        ┌─────────────┐
//!                        │   command   │
//!                        │ (executor)  │
//!                        └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use gitshadow::git::{Blob, GitObject, Repository, TreeEntry};
//!
//! let repo = Repository::new("https://example.com/team/repo.git")?;
//! repo.set_author("Release Bot", "bot@example.com")?;
//!
//! let main = repo.get_branch("main")?;
//! let parent = main.commit();
//! let mut entries = main.tree()?.entries()?;
//!
//! let blob: Blob<'_> = repo.create_object(b"1.2.3\n")?;
//! entries.retain(|e| e.name != "VERSION");
//! entries.push(TreeEntry::blob("VERSION", blob.id().clone()));
//!
//! let tree = repo.write_tree(&entries)?;
//! let commit = repo.commit_tree(&tree, "Bump version", &[&parent])?;
//! repo.push_commit(&commit, "main", false)?;
//! # Ok::<(), gitshadow::git::GitError>(())
//! ```

mod command;
mod commit;
mod error;
mod object;
mod refs;
mod repository;
mod store;
mod tree;
mod types;

#[cfg(test)]
mod testutil;

// Re-export public API
pub use command::{Executor, GitExecutable, GIT_ENV_VAR};
pub use commit::CommitInfo;
pub use error::{GitError, GitResult};
pub use object::{Blob, Commit, GitObject, Tree};
pub use refs::{Branch, HEAD, REMOTE_PREFIX};
pub use repository::Repository;
pub use store::TransientStore;
pub use tree::{FileMode, TreeEntry};
pub use types::{GitSignature, ObjectId, ObjectKind};
