//!  Commit metadata.
//!
//!  `git cat-file commit` prints a header block (`tree`, `parent`, `author`,
//!  `committer`, and optional extras like `gpgsig`), a blank line, then the
//!  message. This module parses that into [`CommitInfo`].

use chrono::{DateTime, FixedOffset};

use crate::git::error::{GitError, GitResult};
use crate::git::types::{GitSignature, ObjectId};

const COMMAND: &str = "cat-file commit";

/// information about a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub id: ObjectId,
    pub tree_id: ObjectId,
    pub parent_ids: Vec<ObjectId>,
    pub author: GitSignature,
    pub authored_at: DateTime<FixedOffset>,
    pub committer: GitSignature,
    pub committed_at: DateTime<FixedOffset>,
    pub message: String,
}

impl CommitInfo {
    /// parse the raw body of a commit object
    pub fn parse(id: ObjectId, raw: &[u8]) -> GitResult<Self> {
        let text = String::from_utf8_lossy(raw);
        let (headers, message) = match text.split_once("\n\n") {
            Some((headers, message)) => (headers, message),
            None => (text.trim_end_matches('\n'), ""),
        };

        let mut tree_id = None;
        let mut parent_ids = Vec::new();
        let mut author = None;
        let mut committer = None;

        for line in headers.lines() {
            // continuation of a multi-line header such as gpgsig
            if line.starts_with(' ') {
                continue;
            }
            let (key, value) = line.split_once(' ').unwrap_or((line, ""));
            match key {
                "tree" => tree_id = Some(parse_id(value)?),
                "parent" => parent_ids.push(parse_id(value)?),
                "author" => author = Some(parse_signature(value)?),
                "committer" => committer = Some(parse_signature(value)?),
                _ => {}
            }
        }

        let tree_id = tree_id.ok_or_else(|| GitError::malformed(COMMAND, "missing tree header"))?;
        let (author, authored_at) =
            author.ok_or_else(|| GitError::malformed(COMMAND, "missing author header"))?;
        let (committer, committed_at) =
            committer.ok_or_else(|| GitError::malformed(COMMAND, "missing committer header"))?;

        Ok(Self {
            id,
            tree_id,
            parent_ids,
            author,
            authored_at,
            committer,
            committed_at,
            message: message.to_string(),
        })
    }

    /// check if this is a merge commit (has multiple parents)
    pub fn is_merge(&self) -> bool {
        self.parent_ids.len() > 1
    }

    /// get the first (or only) parent
    pub fn first_parent(&self) -> Option<&ObjectId> {
        self.parent_ids.first()
    }

    /// get a short summary of the commit (first line of message)
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or(&self.message)
    }
}

fn parse_id(value: &str) -> GitResult<ObjectId> {
    ObjectId::from_hex(value.trim())
        .map_err(|_| GitError::malformed(COMMAND, format!("bad object id {value:?}")))
}

/// `Name <email> 1700000000 +0100`
fn parse_signature(value: &str) -> GitResult<(GitSignature, DateTime<FixedOffset>)> {
    let bad = || GitError::malformed(COMMAND, format!("bad signature {value:?}"));

    let open = value.find('<').ok_or_else(bad)?;
    let close = value.rfind('>').ok_or_else(bad)?;
    if close < open {
        return Err(bad());
    }

    let name = value[..open].trim();
    let email = &value[open + 1..close];

    let mut when = value[close + 1..].split_whitespace();
    let seconds: i64 = when.next().and_then(|s| s.parse().ok()).ok_or_else(bad)?;
    let offset = when.next().and_then(parse_offset).ok_or_else(bad)?;

    let timestamp = DateTime::from_timestamp(seconds, 0).ok_or_else(bad)?;
    Ok((GitSignature::new(name, email), timestamp.with_timezone(&offset)))
}

/// `+0530` / `-0800`
fn parse_offset(tz: &str) -> Option<FixedOffset> {
    if tz.len() != 5 || !tz[1..].bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let sign = match &tz[..1] {
        "+" => 1,
        "-" => -1,
        _ => return None,
    };
    let hours: i32 = tz[1..3].parse().ok()?;
    let minutes: i32 = tz[3..5].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const COMMIT: &str = "9fceb02d0ae598e95dc970b74767f19372d61af8";
    const TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";
    const P1: &str = "1111111111111111111111111111111111111111";
    const P2: &str = "2222222222222222222222222222222222222222";

    fn id(hex: &str) -> ObjectId {
        ObjectId::from_hex(hex).unwrap()
    }

    #[test]
    fn test_parse_merge_commit() {
        let raw = format!(
            "tree {TREE}\n\
             parent {P1}\n\
             parent {P2}\n\
             author Ada Lovelace <ada@example.com> 1700000000 +0100\n\
             committer Bot <bot@example.com> 1700000060 -0800\n\
             \n\
             Merge feature\n\
             \n\
             Details here.\n"
        );

        let info = CommitInfo::parse(id(COMMIT), raw.as_bytes()).unwrap();
        assert_eq!(info.id, id(COMMIT));
        assert_eq!(info.tree_id, id(TREE));
        assert_eq!(info.parent_ids, vec![id(P1), id(P2)]);
        assert!(info.is_merge());
        assert_eq!(info.first_parent(), Some(&id(P1)));

        assert_eq!(info.author, GitSignature::new("Ada Lovelace", "ada@example.com"));
        assert_eq!(info.committer.name, "Bot");
        assert_eq!(
            info.authored_at.with_timezone(&Utc),
            Utc.timestamp_opt(1_700_000_000, 0).unwrap()
        );
        assert_eq!(info.authored_at.offset().local_minus_utc(), 3600);
        assert_eq!(info.committed_at.offset().local_minus_utc(), -8 * 3600);

        assert_eq!(info.summary(), "Merge feature");
        assert_eq!(info.message, "Merge feature\n\nDetails here.\n");
    }

    #[test]
    fn test_parse_root_commit_with_signature() {
        let raw = format!(
            "tree {TREE}\n\
             author A <a@x> 1 +0000\n\
             committer A <a@x> 1 +0000\n\
             gpgsig -----BEGIN PGP SIGNATURE-----\n \n abcdef\n -----END PGP SIGNATURE-----\n\
             \n\
             root\n"
        );

        let info = CommitInfo::parse(id(COMMIT), raw.as_bytes()).unwrap();
        assert!(info.parent_ids.is_empty());
        assert_eq!(info.first_parent(), None);
        assert_eq!(info.summary(), "root");
    }

    #[test]
    fn test_parse_missing_tree() {
        let raw = "author A <a@x> 1 +0000\ncommitter A <a@x> 1 +0000\n\nmsg\n";
        let err = CommitInfo::parse(id(COMMIT), raw.as_bytes()).unwrap_err();
        assert!(matches!(err, GitError::MalformedOutput { .. }));
    }

    #[test]
    fn test_parse_bad_signature() {
        let raw = format!("tree {TREE}\nauthor nobody 1 +0000\ncommitter A <a@x> 1 +0000\n\nmsg\n");
        assert!(CommitInfo::parse(id(COMMIT), raw.as_bytes()).is_err());
    }

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("+0530").unwrap().local_minus_utc(), 5 * 3600 + 30 * 60);
        assert_eq!(parse_offset("-0000").unwrap().local_minus_utc(), 0);
        assert!(parse_offset("0530").is_none());
        assert!(parse_offset("+5").is_none());
    }
}
