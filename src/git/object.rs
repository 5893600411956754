//! Handles to objects in the shadow store.
//!
//! A handle is just an [`ObjectId`] plus a borrow of the [`Repository`] that
//! owns the store. Handles never cache content: every read goes back to git,
//! which may in turn fetch the object lazily from the promisor remote.

use std::fmt;

use crate::git::commit::CommitInfo;
use crate::git::error::GitResult;
use crate::git::repository::Repository;
use crate::git::tree::TreeEntry;
use crate::git::types::{ObjectId, ObjectKind};

mod private {
    pub trait Sealed {}
}

/// Behaviour shared by [`Commit`], [`Tree`] and [`Blob`].
///
/// Sealed: the set of object kinds is closed.
pub trait GitObject<'repo>: Sized + private::Sealed {
    /// the kind every handle of this type refers to
    const KIND: ObjectKind;

    #[doc(hidden)]
    fn from_parts(repo: &'repo Repository, id: ObjectId) -> Self;

    /// the object hash
    fn id(&self) -> &ObjectId;

    /// the repository whose store holds this object
    fn repository(&self) -> &'repo Repository;

    fn kind(&self) -> ObjectKind {
        Self::KIND
    }

    /// Read the raw object content.
    fn read(&self) -> GitResult<Vec<u8>> {
        self.repository().read_object(self.id(), Self::KIND)
    }
}

macro_rules! object_handle {
    ($(#[$meta:meta])* $name:ident, $kind:expr) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name<'repo> {
            repo: &'repo Repository,
            id: ObjectId,
        }

        impl private::Sealed for $name<'_> {}

        impl<'repo> GitObject<'repo> for $name<'repo> {
            const KIND: ObjectKind = $kind;

            fn from_parts(repo: &'repo Repository, id: ObjectId) -> Self {
                Self { repo, id }
            }

            fn id(&self) -> &ObjectId {
                &self.id
            }

            fn repository(&self) -> &'repo Repository {
                self.repo
            }
        }

        impl PartialEq for $name<'_> {
            fn eq(&self, other: &Self) -> bool {
                std::ptr::eq(self.repo, other.repo) && self.id == other.id
            }
        }

        impl Eq for $name<'_> {}

        impl fmt::Debug for $name<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.id).finish()
            }
        }

        impl fmt::Display for $name<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} {}", Self::KIND, self.id)
            }
        }
    };
}

object_handle!(
    /// A commit object.
    Commit,
    ObjectKind::Commit
);

object_handle!(
    /// A tree (directory listing) object.
    Tree,
    ObjectKind::Tree
);

object_handle!(
    /// A blob (file content) object.
    Blob,
    ObjectKind::Blob
);

impl<'repo> Commit<'repo> {
    /// parse the commit's headers and message
    pub fn info(&self) -> GitResult<CommitInfo> {
        CommitInfo::parse(self.id.clone(), &self.read()?)
    }

    /// the root tree this commit records
    pub fn tree(&self) -> GitResult<Tree<'repo>> {
        self.repo.tree_from_commit(&self.id)
    }

    /// parent commits, first parent first
    ///
    /// In a shallow store the parents of the fetched tip exist only as
    /// hashes; reading them will fail until they are fetched.
    pub fn parents(&self) -> GitResult<Vec<Commit<'repo>>> {
        Ok(self
            .info()?
            .parent_ids
            .into_iter()
            .map(|id| self.repo.get_commit(id))
            .collect())
    }
}

impl<'repo> Tree<'repo> {
    /// list the entries one level deep
    pub fn entries(&self) -> GitResult<Vec<TreeEntry>> {
        self.repo.list_tree(&self.id)
    }

    /// find an entry by name
    pub fn entry(&self, name: &str) -> GitResult<Option<TreeEntry>> {
        Ok(self.entries()?.into_iter().find(|e| e.name == name))
    }
}

impl Blob<'_> {
    /// read the blob as UTF-8 text
    pub fn read_to_string(&self) -> GitResult<String> {
        Ok(String::from_utf8(self.read()?)?)
    }
}
