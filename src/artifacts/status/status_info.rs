use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::DatabaseEntry;
use std::collections::{BTreeMap, BTreeSet};

pub type HeadTree = BTreeMap<String, DatabaseEntry>;

/// How a path in the index differs from HEAD's tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IndexChangeType {
    /// Staged but absent from HEAD
    Added,
    /// Staged with a different digest or mode than in HEAD
    Modified,
    /// In HEAD but no longer staged
    Deleted,
}

impl IndexChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexChangeType::Added => "new file",
            IndexChangeType::Modified => "modified",
            IndexChangeType::Deleted => "deleted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusInfo {
    /// Every staged path
    pub staged: BTreeSet<String>,
    pub current_branch: BranchName,
    /// `None` before the first commit
    pub head: Option<ObjectId>,
    /// Paths whose staged state differs from HEAD
    pub changes: BTreeMap<String, IndexChangeType>,
}

impl StatusInfo {
    /// Compare the staged entries with the files of HEAD's tree
    pub fn compare<'e>(
        current_branch: BranchName,
        head: Option<ObjectId>,
        entries: impl IntoIterator<Item = &'e IndexEntry>,
        head_tree: &HeadTree,
    ) -> Self {
        let mut staged = BTreeSet::new();
        let mut changes = BTreeMap::new();

        for entry in entries {
            staged.insert(entry.path.clone());

            match head_tree.get(&entry.path) {
                None => {
                    changes.insert(entry.path.clone(), IndexChangeType::Added);
                }
                Some(head_entry)
                    if head_entry.oid != entry.oid
                        || head_entry.mode != EntryMode::from(entry.mode) =>
                {
                    changes.insert(entry.path.clone(), IndexChangeType::Modified);
                }
                Some(_) => {}
            }
        }

        for path in head_tree.keys() {
            if !staged.contains(path) {
                changes.insert(path.clone(), IndexChangeType::Deleted);
            }
        }

        StatusInfo {
            staged,
            current_branch,
            head,
            changes,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.changes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::index::entry_mode::FileMode;
    use crate::artifacts::objects::object::encode;
    use crate::artifacts::objects::object_type::ObjectType;
    use pretty_assertions::assert_eq;

    fn oid(content: &str) -> ObjectId {
        encode(ObjectType::Blob, content.as_bytes()).0
    }

    fn head_entry(name: &str, content: &str) -> (String, DatabaseEntry) {
        (
            name.to_string(),
            DatabaseEntry::new(EntryMode::default(), name.to_string(), oid(content)),
        )
    }

    #[test]
    fn classifies_added_modified_and_deleted_paths() {
        let head_tree = HeadTree::from([
            head_entry("kept", "same"),
            head_entry("changed", "old"),
            head_entry("chmod", "script"),
            head_entry("gone", "bye"),
        ]);
        let entries = vec![
            IndexEntry::new("kept".into(), oid("same"), FileMode::Regular),
            IndexEntry::new("changed".into(), oid("new"), FileMode::Regular),
            IndexEntry::new("chmod".into(), oid("script"), FileMode::Executable),
            IndexEntry::new("fresh".into(), oid("hi"), FileMode::Regular),
        ];

        let status = StatusInfo::compare(BranchName::default(), None, &entries, &head_tree);

        assert_eq!(
            status.changes,
            BTreeMap::from([
                ("changed".to_string(), IndexChangeType::Modified),
                ("chmod".to_string(), IndexChangeType::Modified),
                ("fresh".to_string(), IndexChangeType::Added),
                ("gone".to_string(), IndexChangeType::Deleted),
            ])
        );
        assert_eq!(status.staged.len(), 4);
        assert!(!status.is_clean());
    }
}
