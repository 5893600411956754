//!  Remote-tracking branches.
//!
//!  The shadow store never has local branches. Everything we know about the
//!  remote's branches comes from `refs/remotes/origin/*`, which the shallow
//!  fetch populates. This module handles:
//! - parsing `git show-ref` output into branch records
//! - resolving the remote's default branch from `refs/remotes/origin/HEAD`
//! - the [`Branch`] handle handed out to callers

use std::collections::BTreeMap;
use std::fmt;

use crate::git::error::{GitError, GitResult};
use crate::git::object::Commit;
use crate::git::object::Tree;
use crate::git::repository::Repository;
use crate::git::types::ObjectId;

/// prefix of every ref the fetch creates
pub const REMOTE_PREFIX: &str = "refs/remotes/origin/";

/// the symbolic ref `remote set-head -a` maintains
pub const REMOTE_HEAD: &str = "refs/remotes/origin/HEAD";

/// the branch name callers use to mean "the remote's default branch"
pub const HEAD: &str = "HEAD";

/// A remote-tracking ref as recorded in the branch cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RemoteBranch {
    pub name: String,
    pub commit_id: ObjectId,
}

/// Branch cache state. Never invalidated implicitly; only
/// [`Repository::refresh`] resets it.
#[derive(Debug, Default)]
pub(crate) enum BranchCache {
    #[default]
    Unpopulated,
    Populated(BTreeMap<String, RemoteBranch>),
}

impl BranchCache {
    /// the cached map, running `discover` first if nothing is cached yet
    pub fn populate_with(
        &mut self,
        discover: impl FnOnce() -> GitResult<BTreeMap<String, RemoteBranch>>,
    ) -> GitResult<&BTreeMap<String, RemoteBranch>> {
        if let BranchCache::Unpopulated = self {
            *self = BranchCache::Populated(discover()?);
        }
        match self {
            BranchCache::Populated(branches) => Ok(branches),
            BranchCache::Unpopulated => unreachable!("branch cache populated above"),
        }
    }

    pub fn is_populated(&self) -> bool {
        matches!(self, BranchCache::Populated(_))
    }
}

/// Parse `git show-ref` output, keeping only remote-tracking branches.
///
/// Keyed by the full ref name so a ref listed twice collapses into one
/// entry. The symbolic `origin/HEAD` is not a branch and is skipped.
/// Fails with [`GitError::NoBranches`] when nothing is left.
pub(crate) fn parse_remote_branches(output: &str) -> GitResult<BTreeMap<String, RemoteBranch>> {
    let mut branches = BTreeMap::new();

    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (hash, ref_name) = line
            .split_once(' ')
            .ok_or_else(|| GitError::malformed("show-ref", format!("no ref name in {line:?}")))?;

        let Some(name) = ref_name.strip_prefix(REMOTE_PREFIX) else {
            continue;
        };
        if ref_name == REMOTE_HEAD || name.is_empty() {
            continue;
        }

        let commit_id = ObjectId::from_hex(hash)
            .map_err(|_| GitError::malformed("show-ref", format!("bad hash in {line:?}")))?;

        branches
            .entry(ref_name.to_string())
            .or_insert_with(|| RemoteBranch {
                name: name.to_string(),
                commit_id,
            });
    }

    if branches.is_empty() {
        return Err(GitError::NoBranches);
    }
    Ok(branches)
}

/// Turn the target of `refs/remotes/origin/HEAD` into a short branch name.
pub(crate) fn parse_head_target(target: &str) -> GitResult<String> {
    match target.trim().strip_prefix(REMOTE_PREFIX) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(GitError::UnresolvedHead(target.trim().to_string())),
    }
}

/// full remote-tracking ref for a short branch name
pub(crate) fn remote_ref(name: &str) -> String {
    format!("{REMOTE_PREFIX}{name}")
}

/// A branch on the remote, as of the last fetch.
///
/// Only [`Repository::list_branches`] and [`Repository::get_branch`] hand
/// these out.
#[derive(Clone)]
pub struct Branch<'repo> {
    repo: &'repo Repository,
    ref_name: String,
    name: String,
    commit_id: ObjectId,
}

impl<'repo> Branch<'repo> {
    pub(crate) fn new(repo: &'repo Repository, ref_name: &str, record: &RemoteBranch) -> Self {
        Self {
            repo,
            ref_name: ref_name.to_string(),
            name: record.name.clone(),
            commit_id: record.commit_id.clone(),
        }
    }

    /// short name, e.g. `main`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// full remote-tracking ref, e.g. `refs/remotes/origin/main`
    pub fn ref_name(&self) -> &str {
        &self.ref_name
    }

    /// the commit the branch pointed at when it was fetched
    pub fn commit_id(&self) -> &ObjectId {
        &self.commit_id
    }

    /// the tip commit
    pub fn commit(&self) -> Commit<'repo> {
        self.repo.get_commit(self.commit_id.clone())
    }

    /// the root tree of the tip commit
    pub fn tree(&self) -> GitResult<Tree<'repo>> {
        self.repo.tree_from_commit(&self.commit_id)
    }
}

impl PartialEq for Branch<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.repo, other.repo)
            && self.ref_name == other.ref_name
            && self.commit_id == other.commit_id
    }
}

impl Eq for Branch<'_> {}

impl fmt::Debug for Branch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Branch")
            .field("ref_name", &self.ref_name)
            .field("commit_id", &self.commit_id)
            .finish()
    }
}

impl fmt::Display for Branch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.commit_id.short(), self.name)
    }
}
