//!   The shadow repository.
//!
//!  This is the central component of the crate. It owns a transient bare
//!  store that mirrors one remote through a shallow, partial fetch, and
//!  issues every plumbing command against it.
//!
//! All other git modules go through this for store access.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, instrument};

use crate::config::RepositoryConfig;
use crate::git::command::{run_text, Executor};
use crate::git::error::{GitError, GitResult};
use crate::git::object::{Commit, GitObject, Tree};
use crate::git::refs::{self, Branch, BranchCache, RemoteBranch, HEAD, REMOTE_HEAD};
use crate::git::store::TransientStore;
use crate::git::tree::{self, TreeEntry};
use crate::git::types::{ObjectId, ObjectKind};

/// A bare, shallow, partial mirror of one remote.
///
/// The store directory is created by the constructor and removed when the
/// value is dropped or [`close`](Self::close)d. Object and branch handles
/// borrow the repository, so none can outlive it.
#[derive(Debug)]
pub struct Repository {
    url: String,
    executor: Arc<dyn Executor>,
    store: TransientStore,
    head_name: Mutex<Option<String>>,
    branches: RwLock<BranchCache>,
}

impl Repository {
    /// Shadow `url` using default settings.
    pub fn new(url: impl Into<String>) -> GitResult<Self> {
        Self::with_config(RepositoryConfig::new(url))
    }

    /// Shadow a remote with custom configuration.
    ///
    /// Runs the full setup sequence; any failing step aborts construction
    /// and the half-built store is removed before the error is returned.
    #[instrument(skip(config), fields(url = %config.url))]
    pub fn with_config(config: RepositoryConfig) -> GitResult<Self> {
        let executor = config.resolve_executor();
        let store = TransientStore::allocate(config.temp_dir.as_deref())
            .map_err(|e| GitError::setup("allocate store", e))?;

        let repo = Self {
            url: config.url,
            executor,
            store,
            head_name: Mutex::new(None),
            branches: RwLock::new(BranchCache::Unpopulated),
        };
        // on error `repo` is dropped here, which removes the store
        repo.initialize()?;

        info!(path = %repo.path().display(), "shadow repository ready");
        Ok(repo)
    }

    fn initialize(&self) -> GitResult<()> {
        let path = self.path().to_str().ok_or_else(|| {
            GitError::setup(
                "init",
                GitError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "store path is not valid UTF-8",
                )),
            )
        })?;

        self.setup_step("init", "init --bare", &[path])?;
        self.setup_step("remote add", "remote add origin", &[self.url.as_str()])?;
        self.setup_step("promisor", "config remote.origin.promisor true", &[])?;
        self.setup_step(
            "partial clone filter",
            "config remote.origin.partialclonefilter tree:0",
            &[],
        )?;
        self.fetch().map_err(|e| GitError::setup("fetch", e))
    }

    fn setup_step(&self, step: &'static str, command: &str, args: &[&str]) -> GitResult<()> {
        self.run(command, args)
            .map(drop)
            .map_err(|e| GitError::setup(step, e))
    }

    fn fetch(&self) -> GitResult<()> {
        self.run("fetch origin --no-tags --depth 1", &[]).map(drop)
    }

    // ==================== Plumbing ====================

    fn run(&self, command: &str, args: &[&str]) -> GitResult<Vec<u8>> {
        self.executor.run(self.path(), command, args, None)
    }

    fn run_with_input(&self, command: &str, args: &[&str], input: &[u8]) -> GitResult<Vec<u8>> {
        self.executor.run(self.path(), command, args, Some(input))
    }

    fn run_text(&self, command: &str, args: &[&str]) -> GitResult<String> {
        run_text(self.executor.as_ref(), self.path(), command, args)
    }

    fn parse_id(command: &str, output: &[u8]) -> GitResult<ObjectId> {
        let text = String::from_utf8_lossy(output);
        ObjectId::from_hex(text.trim())
            .map_err(|_| GitError::malformed(command, format!("expected an object id, got {text:?}")))
    }

    /// Get the store path.
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Get the remote URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Remove the store now, reporting any error. Dropping does the same
    /// silently.
    pub fn close(self) -> GitResult<()> {
        self.store.close()
    }

    /// Fetch again and forget the cached branch list and default branch.
    ///
    /// Nothing else ever invalidates those caches.
    pub fn refresh(&self) -> GitResult<()> {
        let mut branches = self.branches.write();
        self.fetch()?;
        debug!(was_populated = branches.is_populated(), "resetting branch cache");
        *branches = BranchCache::Unpopulated;
        *self.head_name.lock() = None;
        Ok(())
    }

    // ==================== Branch Operations ====================

    fn discover_branches(&self) -> GitResult<BTreeMap<String, RemoteBranch>> {
        let output = match self.run_text("show-ref", &[]) {
            Ok(output) => output,
            // show-ref exits 1 with no output when there are no refs at all
            Err(GitError::Command {
                status: Some(1),
                stderr,
                ..
            }) if stderr.is_empty() => String::new(),
            Err(e) => return Err(e),
        };
        let branches = refs::parse_remote_branches(&output)?;
        debug!(count = branches.len(), "discovered remote branches");
        Ok(branches)
    }

    /// List the remote's branches.
    ///
    /// The first successful call runs `show-ref`; later calls are answered
    /// from the cache. A remote without branches is an error, not an empty
    /// list.
    pub fn list_branches(&self) -> GitResult<Vec<Branch<'_>>> {
        let mut cache = self.branches.write();
        let branches = cache.populate_with(|| self.discover_branches())?;
        Ok(branches
            .iter()
            .map(|(ref_name, record)| Branch::new(self, ref_name, record))
            .collect())
    }

    /// Look up one branch by short name; `"HEAD"` means the remote's
    /// default branch.
    pub fn get_branch(&self, name: &str) -> GitResult<Branch<'_>> {
        self.branches
            .write()
            .populate_with(|| self.discover_branches())?;

        let name = if name == HEAD {
            self.head_branch_name()?
        } else {
            name.to_string()
        };

        let ref_name = refs::remote_ref(&name);
        let mut cache = self.branches.write();
        let branches = cache.populate_with(|| self.discover_branches())?;
        branches
            .get(&ref_name)
            .map(|record| Branch::new(self, &ref_name, record))
            .ok_or(GitError::BranchNotFound(name))
    }

    /// Name of the remote's default branch, asked of the remote once.
    pub fn head_branch_name(&self) -> GitResult<String> {
        let mut head = self.head_name.lock();
        if let Some(name) = head.as_ref() {
            return Ok(name.clone());
        }

        self.run("remote set-head origin -a", &[])?;
        let target = self.run_text("symbolic-ref", &[REMOTE_HEAD])?;
        let name = refs::parse_head_target(&target)?;

        debug!(%name, "resolved remote HEAD");
        *head = Some(name.clone());
        Ok(name)
    }

    // ==================== Object Access ====================

    /// Wrap a commit hash. Existence is checked only when content is read.
    pub fn get_commit(&self, id: ObjectId) -> Commit<'_> {
        Commit::from_parts(self, id)
    }

    /// The root tree of a commit.
    pub fn tree_from_commit(&self, commit: &ObjectId) -> GitResult<Tree<'_>> {
        let spec = format!("{commit}^{{tree}}");
        let output = self.run("rev-parse", &[spec.as_str()])?;
        let id = Self::parse_id("rev-parse", &output)?;
        Ok(Tree::from_parts(self, id))
    }

    /// Read the raw content of an object of the given kind.
    ///
    /// Missing objects are fetched lazily from the remote; an object that
    /// exists nowhere, or has another kind, fails with [`GitError::Command`].
    pub fn read_object(&self, id: &ObjectId, kind: ObjectKind) -> GitResult<Vec<u8>> {
        self.run("cat-file", &[kind.as_str(), id.as_str()])
    }

    /// [`read_object`](Self::read_object) with the kind given as text.
    ///
    /// An unknown tag fails with [`GitError::InvalidObjectKind`] before git is
    /// invoked.
    pub fn read_object_by_tag(&self, id: &ObjectId, tag: &str) -> GitResult<Vec<u8>> {
        let kind = tag.parse::<ObjectKind>()?;
        self.read_object(id, kind)
    }

    /// Write `content` into the store as a new object of kind `O`.
    pub fn create_object<'repo, O: GitObject<'repo>>(&'repo self, content: &[u8]) -> GitResult<O> {
        let id = self.write_object(content, O::KIND)?;
        Ok(O::from_parts(self, id))
    }

    /// [`create_object`](Self::create_object) with the kind given as text.
    pub fn create_object_by_tag(&self, content: &[u8], tag: &str) -> GitResult<ObjectId> {
        let kind = tag.parse::<ObjectKind>()?;
        self.write_object(content, kind)
    }

    fn write_object(&self, content: &[u8], kind: ObjectKind) -> GitResult<ObjectId> {
        let output = self.run_with_input("hash-object -w --stdin", &["-t", kind.as_str()], content)?;
        let id = Self::parse_id("hash-object", &output)?;
        debug!(%kind, %id, bytes = content.len(), "wrote object");
        Ok(id)
    }

    /// List a tree's entries.
    pub fn list_tree(&self, tree: &ObjectId) -> GitResult<Vec<TreeEntry>> {
        let output = self.run("ls-tree -z", &[tree.as_str()])?;
        tree::parse_ls_tree(&output)
    }

    /// Build a tree object from entries.
    ///
    /// Entries may point at objects that only exist on the remote; they are
    /// not fetched.
    pub fn write_tree(&self, entries: &[TreeEntry]) -> GitResult<Tree<'_>> {
        let input = tree::render_mktree(entries);
        let output = self.run_with_input("mktree -z --missing", &[], &input)?;
        let id = Self::parse_id("mktree", &output)?;
        Ok(Tree::from_parts(self, id))
    }

    // ==================== Commit & Push ====================

    /// Create a commit object for `tree` with the given parents, first
    /// parent first.
    ///
    /// No ref is updated; the commit only exists in the store until pushed.
    pub fn commit_tree(
        &self,
        tree: &Tree<'_>,
        message: &str,
        parents: &[&Commit<'_>],
    ) -> GitResult<Commit<'_>> {
        let mut args: Vec<&str> = Vec::with_capacity(3 + parents.len() * 2);
        args.push(tree.id().as_str());
        for parent in parents {
            args.push("-p");
            args.push(parent.id().as_str());
        }
        args.push("-m");
        args.push(message);

        let output = self.run("commit-tree", &args)?;
        let id = Self::parse_id("commit-tree", &output)?;
        debug!(%id, parents = parents.len(), "created commit");
        Ok(Commit::from_parts(self, id))
    }

    /// Push `commit` to `refs/heads/<branch>` on the remote.
    ///
    /// By default the push carries a lease: it is rejected if the remote
    /// branch no longer matches what the last fetch saw. `force` drops the
    /// lease and overwrites unconditionally. Failures are returned as-is;
    /// nothing is retried.
    #[instrument(skip(self, commit), fields(commit = %commit.id()))]
    pub fn push_commit(&self, commit: &Commit<'_>, branch: &str, force: bool) -> GitResult<()> {
        let branch = if branch == HEAD {
            self.head_branch_name()?
        } else {
            branch.to_string()
        };

        let (lease, refspec) = if force {
            ("--no-force-with-lease", format!("+{}:refs/heads/{branch}", commit.id()))
        } else {
            ("--force-with-lease", format!("{}:refs/heads/{branch}", commit.id()))
        };

        self.run("push origin", &[lease, refspec.as_str()])?;
        info!(%branch, force, "pushed commit");
        Ok(())
    }

    /// Set the author and committer identity for later commits made
    /// through this repository.
    pub fn set_author(&self, name: &str, email: &str) -> GitResult<()> {
        self.run("config user.name", &[name])?;
        self.run("config user.email", &[email])?;
        Ok(())
    }
}
