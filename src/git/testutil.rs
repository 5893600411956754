//! Shared fixtures for tests that drive a real git binary.

use std::path::Path;
use std::sync::OnceLock;

use git2::{Oid, Repository, Signature};
use parking_lot::Mutex;
use tempfile::TempDir;

use crate::git::command::{Executor, GitExecutable};
use crate::git::error::GitResult;

/// whether a usable `git` is on PATH; tests that need one return early
pub(crate) fn git_available() -> bool {
    static AVAILABLE: OnceLock<bool> = OnceLock::new();
    *AVAILABLE.get_or_init(|| {
        std::process::Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    })
}

/// Executor that records every command before delegating to git.
#[derive(Debug)]
pub(crate) struct RecordingExecutor {
    inner: GitExecutable,
    commands: Mutex<Vec<String>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self {
            inner: GitExecutable::new("git"),
            commands: Mutex::new(Vec::new()),
        }
    }

    /// every command run so far, tokens joined by spaces
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().clone()
    }

    /// how many times exactly `command` ran
    pub fn count(&self, command: &str) -> usize {
        self.commands.lock().iter().filter(|c| *c == command).count()
    }
}

impl Executor for RecordingExecutor {
    fn run(
        &self,
        cwd: &Path,
        command: &str,
        args: &[&str],
        stdin: Option<&[u8]>,
    ) -> GitResult<Vec<u8>> {
        let line = command
            .split_whitespace()
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.commands.lock().push(line);
        self.inner.run(cwd, command, args, stdin)
    }
}

/// A bare repository standing in for the remote.
///
/// `main` holds one commit adding `README.md`; `feature` is one commit
/// ahead of `main`. HEAD points at `main`.
pub(crate) struct RemoteFixture {
    dir: TempDir,
    repo: Repository,
}

impl RemoteFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init_bare(dir.path()).unwrap();
        {
            let mut config = repo.config().unwrap();
            config.set_bool("uploadpack.allowFilter", true).unwrap();
            config.set_bool("uploadpack.allowAnySHA1InWant", true).unwrap();
        }

        let fixture = Self { dir, repo };
        let main = fixture.commit(None, "Add README", "README.md", b"# fixture\n");
        fixture.repo.reference("refs/heads/main", main, true, "init main").unwrap();
        fixture.repo.set_head("refs/heads/main").unwrap();

        let feature = fixture.commit(Some(main), "Add feature", "feature.txt", b"feature\n");
        fixture
            .repo
            .reference("refs/heads/feature", feature, true, "init feature")
            .unwrap();

        fixture
    }

    /// URL for `git remote add`
    pub fn url(&self) -> String {
        format!("file://{}", self.dir.path().display())
    }

    /// current tip of a branch on the remote
    pub fn tip(&self, branch: &str) -> Oid {
        self.repo
            .refname_to_id(&format!("refs/heads/{branch}"))
            .unwrap()
    }

    /// advance `branch` by one commit adding `file`, as another writer would
    pub fn commit_on(&self, branch: &str, message: &str, file: &str, content: &[u8]) -> Oid {
        let parent = self.tip(branch);
        let oid = self.commit(Some(parent), message, file, content);
        self.repo
            .reference(&format!("refs/heads/{branch}"), oid, true, message)
            .unwrap();
        oid
    }

    fn commit(&self, parent: Option<Oid>, message: &str, file: &str, content: &[u8]) -> Oid {
        let blob = self.repo.blob(content).unwrap();

        let base = parent.map(|p| self.repo.find_commit(p).unwrap().tree().unwrap());
        let mut builder = self.repo.treebuilder(base.as_ref()).unwrap();
        builder.insert(file, blob, 0o100644).unwrap();
        let tree = self.repo.find_tree(builder.write().unwrap()).unwrap();

        let sig = Signature::now("Fixture", "fixture@example.com").unwrap();
        let parents: Vec<git2::Commit<'_>> = parent
            .map(|p| self.repo.find_commit(p).unwrap())
            .into_iter()
            .collect();
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();

        self.repo
            .commit(None, &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }
}
