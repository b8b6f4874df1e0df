//! Index (staging area)
//!
//! The index tracks which blob digest each path will have in the next commit.
//! It is persisted as a single checksummed file rewritten wholesale on every
//! save: the new content goes to `index.lock` and is renamed over `index`.
//!
//! Entries never touch the object database; callers store the blob before
//! staging its digest.

use crate::artifacts::index::checksum::Checksum;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::index::index_header::IndexHeader;
use crate::artifacts::index::{HEADER_SIZE, SIGNATURE, VERSION};
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::errors::{Error, Result};
use file_guard::Lock;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Read, Write};
use std::ops::DerefMut;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Index {
    /// Path to the index file
    path: Box<Path>,
    /// Staged files mapped by path
    entries: BTreeMap<String, IndexEntry>,
    /// Directory hierarchy for efficient parent-child lookups
    children: BTreeMap<String, BTreeSet<String>>,
    /// Treat an undecodable index file as empty instead of failing
    recover_corrupt: bool,
    /// Whether the index has been modified since loading
    changed: bool,
}

impl Index {
    pub fn new(path: Box<Path>) -> Self {
        Index {
            path,
            entries: BTreeMap::new(),
            children: BTreeMap::new(),
            recover_corrupt: false,
            changed: false,
        }
    }

    pub fn with_recovery(mut self, recover_corrupt: bool) -> Self {
        self.recover_corrupt = recover_corrupt;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entry_by_path(&self, path: &str) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.children.clear();
        self.changed = false;
    }

    /// Load the index from disk, replacing the in-memory entries
    ///
    /// A missing or empty file is an empty index. Anything else that fails to
    /// decode is `IndexCorrupt`, unless recovery was enabled, in which case the
    /// index is logged and treated as empty.
    pub fn rehydrate(&mut self) -> Result<()> {
        self.clear();

        let Some(data) = self.read_locked()? else {
            return Ok(());
        };

        match self.parse(data) {
            Ok(()) => Ok(()),
            Err(Error::IndexCorrupt(reason)) if self.recover_corrupt => {
                tracing::warn!(path = %self.path.display(), %reason, "discarding unreadable index");
                self.clear();
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn read_locked(&self) -> Result<Option<Vec<u8>>> {
        let mut index_file = match std::fs::File::open(self.path()) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if index_file.metadata()?.len() == 0 {
            return Ok(None);
        }

        let mut lock = file_guard::lock(&mut index_file, Lock::Shared, 0, 1)?;
        let mut data = Vec::new();
        lock.deref_mut().read_to_end(&mut data)?;

        Ok(Some(data))
    }

    fn parse(&mut self, data: Vec<u8>) -> Result<()> {
        let mut reader = Checksum::new(Cursor::new(data));

        let header = IndexHeader::deserialize(Cursor::new(reader.read(HEADER_SIZE)?))?;
        if header.marker != SIGNATURE {
            return Err(Error::IndexCorrupt("invalid index file signature".into()));
        }
        if header.version != VERSION {
            return Err(Error::IndexCorrupt(format!(
                "unsupported index file version {}",
                header.version
            )));
        }

        for _ in 0..header.entries_count {
            // fixed-size prefix: digest, mode and path length
            let prefix = reader.read(20 + 4 + 2)?;
            let path_len = u16::from_be_bytes([prefix[24], prefix[25]]) as usize;
            let path = reader.read(path_len)?;

            let entry = IndexEntry::deserialize(Cursor::new([prefix, path].concat()))?;
            if self.entries.contains_key(&entry.path) {
                return Err(Error::IndexCorrupt(format!("duplicate entry {}", entry.path)));
            }
            self.store_entry(entry);
        }

        reader.verify()
    }

    /// Stage `entry`, replacing whatever was staged at its path
    ///
    /// Staging a file drops entries that would clash with it in a tree:
    /// files at any of its parent directories and files nested under it.
    pub fn add(&mut self, entry: IndexEntry) {
        self.discard_conflicts(&entry);
        self.store_entry(entry);
        self.changed = true;
    }

    /// Unstage a path; returns whether an entry was removed
    pub fn remove(&mut self, path: &str) -> bool {
        let removed = self.remove_entry(path);
        if removed {
            self.changed = true;
        }

        removed
    }

    fn discard_conflicts(&mut self, entry: &IndexEntry) {
        for parent in entry.parent_dirs() {
            self.remove_entry(parent);
        }

        if let Some(children) = self.children.get(&entry.path).cloned() {
            for child in children {
                self.remove_entry(&child);
            }
        }
    }

    fn store_entry(&mut self, entry: IndexEntry) {
        for parent in entry.parent_dirs() {
            self.children
                .entry(parent.to_string())
                .or_default()
                .insert(entry.path.clone());
        }

        self.entries.insert(entry.path.clone(), entry);
    }

    fn remove_entry(&mut self, path: &str) -> bool {
        match self.entries.remove(path) {
            None => false,
            Some(entry) => {
                for parent in entry.parent_dirs() {
                    if let Some(children) = self.children.get_mut(parent) {
                        children.remove(path);
                        if children.is_empty() {
                            self.children.remove(parent);
                        }
                    }
                }

                true
            }
        }
    }

    /// Persist the index, atomically replacing the previous file
    pub fn write_updates(&mut self) -> Result<()> {
        let mut writer = Checksum::new(Vec::new());

        let header = IndexHeader::with_count(self.entries.len() as u32);
        writer.write(&header.serialize()?)?;
        for entry in self.entries() {
            writer.write(&entry.serialize()?)?;
        }
        writer.write_checksum()?;

        let lock_path = self.lock_path();
        {
            let mut lock_file = std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&lock_path)?;
            let mut lock = file_guard::lock(&mut lock_file, Lock::Exclusive, 0, 1)?;
            lock.deref_mut().write_all(&writer.into_inner())?;
            lock.deref_mut().sync_all()?;
        }
        std::fs::rename(&lock_path, self.path())?;

        tracing::debug!(path = %self.path.display(), entries = self.entries.len(), "saved index");
        self.changed = false;

        Ok(())
    }

    fn lock_path(&self) -> PathBuf {
        let mut lock_path = self.path.as_os_str().to_owned();
        lock_path.push(".lock");
        PathBuf::from(lock_path)
    }

    /// Entries sorted by path
    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    pub fn paths(&self) -> BTreeSet<String> {
        self.entries.keys().cloned().collect()
    }
}
