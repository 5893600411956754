//!  tree listing and construction.
//!
//! trees are read with `git ls-tree -z` and written with `git mktree -z`.
//! Both speak the same line format, `<mode> SP <type> SP <hash> TAB <name>`,
//! NUL-terminated so names with newlines or quotes survive untouched.

use std::fmt;

use crate::git::error::{GitError, GitResult};
use crate::git::types::{ObjectId, ObjectKind};

/// the mode column of a tree entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileMode {
    Blob,
    Executable,
    Link,
    Tree,
    Submodule,
}

impl FileMode {
    /// the octal string git prints
    pub fn as_str(&self) -> &'static str {
        match self {
            FileMode::Blob => "100644",
            FileMode::Executable => "100755",
            FileMode::Link => "120000",
            FileMode::Tree => "040000",
            FileMode::Submodule => "160000",
        }
    }

    /// the object kind an entry of this mode points at
    pub fn kind(&self) -> ObjectKind {
        match self {
            FileMode::Tree => ObjectKind::Tree,
            FileMode::Submodule => ObjectKind::Commit,
            FileMode::Blob | FileMode::Executable | FileMode::Link => ObjectKind::Blob,
        }
    }

    fn parse(mode: &str) -> Option<Self> {
        match mode {
            "100644" => Some(FileMode::Blob),
            "100755" => Some(FileMode::Executable),
            "120000" => Some(FileMode::Link),
            "040000" | "40000" => Some(FileMode::Tree),
            "160000" => Some(FileMode::Submodule),
            _ => None,
        }
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// one entry of a tree object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: FileMode,
    pub kind: ObjectKind,
    pub id: ObjectId,
    pub name: String,
}

impl TreeEntry {
    /// a regular file entry
    pub fn blob(name: impl Into<String>, id: ObjectId) -> Self {
        Self::with_mode(FileMode::Blob, name, id)
    }

    /// a subdirectory entry
    pub fn tree(name: impl Into<String>, id: ObjectId) -> Self {
        Self::with_mode(FileMode::Tree, name, id)
    }

    /// an entry of any mode; the kind follows from the mode
    pub fn with_mode(mode: FileMode, name: impl Into<String>, id: ObjectId) -> Self {
        Self {
            mode,
            kind: mode.kind(),
            id,
            name: name.into(),
        }
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(
            format!("{} {} {}\t{}", self.mode, self.kind, self.id, self.name).as_bytes(),
        );
        out.push(0);
    }
}

/// parse the NUL-separated output of `ls-tree -z`
pub(crate) fn parse_ls_tree(output: &[u8]) -> GitResult<Vec<TreeEntry>> {
    output
        .split(|b| *b == 0)
        .filter(|record| !record.is_empty())
        .map(|record| {
            let record = String::from_utf8(record.to_vec())?;
            parse_entry(&record)
        })
        .collect()
}

fn parse_entry(record: &str) -> GitResult<TreeEntry> {
    let bad = |reason: &str| GitError::malformed("ls-tree -z", format!("{reason} in {record:?}"));

    let (meta, name) = record.split_once('\t').ok_or_else(|| bad("no tab"))?;
    let mut fields = meta.split(' ');
    let (Some(mode), Some(kind), Some(hash), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(bad("expected three fields"));
    };

    let mode = FileMode::parse(mode).ok_or_else(|| bad("unknown mode"))?;
    let kind = kind.parse::<ObjectKind>().map_err(|_| bad("unknown type"))?;
    let id = ObjectId::from_hex(hash).map_err(|_| bad("bad hash"))?;

    Ok(TreeEntry {
        mode,
        kind,
        id,
        name: name.to_string(),
    })
}

/// render entries as `mktree -z` input
pub(crate) fn render_mktree(entries: &[TreeEntry]) -> Vec<u8> {
    let mut out = Vec::new();
    for entry in entries {
        entry.write_to(&mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOB: &str = "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391";
    const TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

    fn id(hex: &str) -> ObjectId {
        ObjectId::from_hex(hex).unwrap()
    }

    #[test]
    fn test_parse_ls_tree() {
        let output = format!(
            "100644 blob {BLOB}\tREADME.md\0040000 tree {TREE}\tsrc\0100755 blob {BLOB}\trun me.sh\0"
        );

        let entries = parse_ls_tree(output.as_bytes()).unwrap();
        assert_eq!(entries.len(), 3);

        assert_eq!(entries[0], TreeEntry::blob("README.md", id(BLOB)));
        assert_eq!(entries[1], TreeEntry::tree("src", id(TREE)));
        assert_eq!(entries[2].mode, FileMode::Executable);
        assert_eq!(entries[2].name, "run me.sh");
    }

    #[test]
    fn test_parse_empty_tree() {
        assert!(parse_ls_tree(b"").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_ls_tree(b"100644 blob\0").is_err());
        let unknown = format!("100600 blob {BLOB}\tx\0");
        assert!(parse_ls_tree(unknown.as_bytes()).is_err());
    }

    #[test]
    fn test_render_mktree_matches_ls_tree_format() {
        let entries = vec![
            TreeEntry::blob("a.txt", id(BLOB)),
            TreeEntry::tree("dir", id(TREE)),
        ];
        let rendered = render_mktree(&entries);
        assert_eq!(
            rendered,
            format!("100644 blob {BLOB}\ta.txt\0040000 tree {TREE}\tdir\0").into_bytes()
        );
        assert_eq!(parse_ls_tree(&rendered).unwrap(), entries);
    }

    #[test]
    fn test_submodule_mode_points_at_commit() {
        let entry = TreeEntry::with_mode(FileMode::Submodule, "vendor/lib", id(BLOB));
        assert_eq!(entry.kind, ObjectKind::Commit);
    }
}
