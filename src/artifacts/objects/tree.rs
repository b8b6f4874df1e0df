//! Tree object
//!
//! Trees represent directory snapshots. They contain entries for files (blobs)
//! and subdirectories (other trees), along with their names and modes.
//!
//! ## Format
//!
//! On disk: `tree <size>\0<entries>`
//! Each entry: `<mode> <name>\0<20-byte-sha1>`
//!
//! Entries are kept sorted by name. Directory names sort as if they ended with
//! `/`, so the same set of entries always serializes to the same bytes no
//! matter the order they were added in.

use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::{Error, Result};
use bytes::Bytes;
use derive_new::new;
use std::collections::BTreeMap;
use std::io::BufRead;

/// A single `(mode, name, oid)` record of a tree
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct DatabaseEntry {
    pub mode: EntryMode,
    pub name: String,
    pub oid: ObjectId,
}

impl DatabaseEntry {
    pub fn is_tree(&self) -> bool {
        self.mode.is_tree()
    }
}

/// Internal tree entry representation
#[derive(Debug, Clone, PartialEq, Eq)]
enum TreeEntry {
    /// Entry referencing an object already addressed by its digest
    Stored { mode: EntryMode, oid: ObjectId },
    /// Nested tree still being built
    Directory(Tree),
}

impl TreeEntry {
    fn mode(&self) -> EntryMode {
        match self {
            TreeEntry::Stored { mode, .. } => *mode,
            TreeEntry::Directory(_) => EntryMode::Directory,
        }
    }

    fn oid(&self) -> Result<ObjectId> {
        match self {
            TreeEntry::Stored { oid, .. } => Ok(oid.clone()),
            TreeEntry::Directory(tree) => tree.object_id(),
        }
    }
}

/// Tree object representing a directory snapshot
///
/// Keys are the entry names, with a trailing `/` for directories so that the
/// map order is the canonical serialization order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: BTreeMap<String, TreeEntry>,
}

impl Tree {
    /// Build a tree from staged entries
    ///
    /// Paths without `/` become direct entries of the root tree. Paths with
    /// `/` create nested subtrees for each parent directory.
    pub fn build<'e>(entries: impl IntoIterator<Item = &'e IndexEntry>) -> Result<Self> {
        let mut root = Self::default();

        for entry in entries {
            let components = entry.path.split('/').collect::<Vec<_>>();
            root.add_entry(&components, entry)?;
        }

        Ok(root)
    }

    /// Traverse the tree depth-first, children before parents
    ///
    /// Child digests must exist before a parent referencing them is stored.
    pub fn traverse<F>(&self, func: &mut F) -> Result<()>
    where
        F: FnMut(&Tree) -> Result<()>,
    {
        for entry in self.entries.values() {
            if let TreeEntry::Directory(tree) = entry {
                tree.traverse(func)?;
            }
        }

        func(self)
    }

    fn add_entry(&mut self, components: &[&str], entry: &IndexEntry) -> Result<()> {
        match components {
            [] => Err(Error::InvalidPath(entry.path.clone())),
            [name] => {
                if self.entries.contains_key(&format!("{name}/")) {
                    return Err(Error::InvalidPath(format!(
                        "{} is staged both as a file and as a directory",
                        entry.path
                    )));
                }

                self.entries.insert(
                    name.to_string(),
                    TreeEntry::Stored {
                        mode: entry.mode.into(),
                        oid: entry.oid.clone(),
                    },
                );
                Ok(())
            }
            [parent, rest @ ..] => {
                if self.entries.contains_key(*parent) {
                    return Err(Error::InvalidPath(format!(
                        "{} is staged both as a file and as a directory",
                        parent
                    )));
                }

                let subtree = self
                    .entries
                    .entry(format!("{parent}/"))
                    .or_insert_with(|| TreeEntry::Directory(Tree::default()));

                match subtree {
                    TreeEntry::Directory(tree) => tree.add_entry(rest, entry),
                    TreeEntry::Stored { .. } => Err(Error::InvalidPath(entry.path.clone())),
                }
            }
        }
    }

    /// Direct entries of this tree, in canonical order
    pub fn entries(&self) -> Result<Vec<DatabaseEntry>> {
        self.entries
            .iter()
            .map(|(name, entry)| {
                Ok(DatabaseEntry::new(
                    entry.mode(),
                    name.trim_end_matches('/').to_string(),
                    entry.oid()?,
                ))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Packable for Tree {
    fn serialize(&self) -> Result<Bytes> {
        let mut content = Vec::new();

        for entry in self.entries()? {
            content.extend_from_slice(format!("{} {}", entry.mode.as_str(), entry.name).as_bytes());
            content.push(0);
            entry.oid.write_h40_to(&mut content)?;
        }

        Ok(Bytes::from(content))
    }
}

impl Unpackable for Tree {
    fn deserialize(mut reader: impl BufRead) -> Result<Self> {
        let mut entries = BTreeMap::new();

        // Reuse scratch buffers to reduce allocs
        let mut mode_bytes = Vec::new();
        let mut name_bytes = Vec::new();

        loop {
            mode_bytes.clear();
            // Read "mode " (space-delimited)
            let n = reader.read_until(b' ', &mut mode_bytes)?;
            if n == 0 {
                break; // clean EOF: no more entries
            }
            if mode_bytes.pop() != Some(b' ') {
                return Err(Error::corrupt("truncated tree entry mode"));
            }

            let mode = std::str::from_utf8(&mode_bytes)
                .map_err(|_| Error::corrupt("tree entry mode is not valid UTF-8"))?;
            let mode = EntryMode::try_from(mode)?;

            // Read "name\0"
            name_bytes.clear();
            reader.read_until(b'\0', &mut name_bytes)?;
            if name_bytes.pop() != Some(b'\0') {
                return Err(Error::corrupt("truncated tree entry name"));
            }
            let name = String::from_utf8(name_bytes.clone())
                .map_err(|_| Error::corrupt("tree entry name is not valid UTF-8"))?;
            if name.is_empty() || name.contains('/') {
                return Err(Error::corrupt(format!("invalid tree entry name {name:?}")));
            }

            let oid = ObjectId::read_h40_from(&mut reader)
                .map_err(|_| Error::corrupt(format!("truncated object id for {name}")))?;

            if entries.contains_key(&name) || entries.contains_key(&format!("{name}/")) {
                return Err(Error::corrupt(format!("duplicate tree entry {name:?}")));
            }

            let key = if mode.is_tree() {
                format!("{name}/")
            } else {
                name
            };
            entries.insert(key, TreeEntry::Stored { mode, oid });
        }

        Ok(Tree { entries })
    }
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }

    fn display(&self) -> String {
        self.entries
            .iter()
            .filter_map(|(name, entry)| {
                let object_type = if entry.mode().is_tree() {
                    ObjectType::Tree
                } else {
                    ObjectType::Blob
                };

                entry.oid().ok().map(|oid| {
                    format!(
                        "{} {} {}\t{}",
                        entry.mode(),
                        object_type,
                        oid,
                        name.trim_end_matches('/')
                    )
                })
            })
            .collect::<Vec<String>>()
            .join("\n")
    }
}
