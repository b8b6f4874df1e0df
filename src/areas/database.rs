//! Object database
//!
//! Objects are zlib-compressed canonical encodings stored under
//! `objects/<first-2-hex>/<remaining-38-hex>`. Writes go through a temporary
//! file that is renamed into place, so readers only ever observe complete
//! objects. An object that already exists is never rewritten.

use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{Object, ObjectBox, Unpackable, encode};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::{DatabaseEntry, Tree};
use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::errors::{Error, Result};
use bytes::Bytes;
use fake::rand;
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
}

impl Database {
    pub fn new(path: Box<Path>) -> Self {
        Database { path }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    /// Encode, compress and persist a payload, returning its digest
    pub fn put(&self, object_type: ObjectType, payload: &[u8]) -> Result<ObjectId> {
        let (object_id, canonical) = encode(object_type, payload);
        let object_path = self.path.join(object_id.to_path());

        // identical content is already stored under the same digest
        if object_path.exists() {
            tracing::debug!(oid = %object_id, %object_type, "object already stored");
            return Ok(object_id);
        }

        let object_dir = object_path
            .parent()
            .ok_or_else(|| Error::InvalidPath(object_path.display().to_string()))?;
        std::fs::create_dir_all(object_dir)?;

        self.write_object(&object_path, canonical)?;
        tracing::debug!(oid = %object_id, %object_type, size = payload.len(), "stored object");

        Ok(object_id)
    }

    pub fn store(&self, object: &impl Object) -> Result<ObjectId> {
        self.put(object.object_type(), &object.serialize()?)
    }

    /// Read an object back as its type tag and payload
    pub fn get(&self, object_id: &ObjectId) -> Result<(ObjectType, Bytes)> {
        let object_path = self.path.join(object_id.to_path());

        let compressed = match std::fs::read(&object_path) {
            Ok(compressed) => compressed,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ObjectNotFound(object_id.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        let canonical = Self::decompress(&compressed).map_err(|e| e.with_oid(object_id))?;
        let (object_type, payload) =
            Self::parse_canonical(canonical).map_err(|e| e.with_oid(object_id))?;
        tracing::debug!(oid = %object_id, %object_type, "loaded object");

        Ok((object_type, payload))
    }

    pub fn exists(&self, object_id: &ObjectId) -> bool {
        self.path.join(object_id.to_path()).is_file()
    }

    /// Read and decode an object into its variant
    pub fn parse_object(&self, object_id: &ObjectId) -> Result<ObjectBox> {
        let (object_type, payload) = self.get(object_id)?;
        let reader = Cursor::new(payload);

        let object = match object_type {
            ObjectType::Blob => Blob::deserialize(reader).map(|blob| ObjectBox::Blob(Box::new(blob))),
            ObjectType::Tree => Tree::deserialize(reader).map(|tree| ObjectBox::Tree(Box::new(tree))),
            ObjectType::Commit => {
                Commit::deserialize(reader).map(|commit| ObjectBox::Commit(Box::new(commit)))
            }
        };

        object.map_err(|e| e.with_oid(object_id))
    }

    pub fn parse_object_as_blob(&self, object_id: &ObjectId) -> Result<Blob> {
        self.parse_object_as(object_id, ObjectType::Blob)
    }

    pub fn parse_object_as_tree(&self, object_id: &ObjectId) -> Result<Tree> {
        self.parse_object_as(object_id, ObjectType::Tree)
    }

    pub fn parse_object_as_commit(&self, object_id: &ObjectId) -> Result<Commit> {
        self.parse_object_as(object_id, ObjectType::Commit)
    }

    fn parse_object_as<T: Unpackable>(&self, object_id: &ObjectId, expected: ObjectType) -> Result<T> {
        let (actual, payload) = self.get(object_id)?;

        if actual != expected {
            return Err(Error::TypeMismatch {
                oid: object_id.clone(),
                expected,
                actual,
            });
        }

        T::deserialize(Cursor::new(payload)).map_err(|e| e.with_oid(object_id))
    }

    /// Build the tree for a set of staged entries and store it, subtrees first
    pub fn build_tree<'e>(&self, entries: impl IntoIterator<Item = &'e IndexEntry>) -> Result<ObjectId> {
        let tree = Tree::build(entries)?;

        tree.traverse(&mut |subtree: &Tree| self.store(subtree).map(|_| ()))?;

        tree.object_id()
    }

    /// Direct entries of a stored tree, in canonical order
    pub fn read_tree(&self, tree_oid: &ObjectId) -> Result<Vec<DatabaseEntry>> {
        self.parse_object_as_tree(tree_oid)?.entries()
    }

    /// Walk a stored tree recursively into a `path -> entry` map of its files
    pub fn flatten_tree(&self, tree_oid: &ObjectId) -> Result<BTreeMap<String, DatabaseEntry>> {
        let mut files = BTreeMap::new();
        self.collect_tree_files(tree_oid, None, &mut files)?;

        Ok(files)
    }

    fn collect_tree_files(
        &self,
        tree_oid: &ObjectId,
        prefix: Option<&str>,
        files: &mut BTreeMap<String, DatabaseEntry>,
    ) -> Result<()> {
        for entry in self.read_tree(tree_oid)? {
            let path = match prefix {
                Some(prefix) => format!("{prefix}/{}", entry.name),
                None => entry.name.clone(),
            };

            if entry.is_tree() {
                self.collect_tree_files(&entry.oid, Some(&path), files)?;
            } else {
                files.insert(path, entry);
            }
        }

        Ok(())
    }

    /// Find all objects whose digest starts with the given hex prefix
    ///
    /// Prefixes of 2+ characters only scan a single fan-out directory.
    pub fn find_objects_by_prefix(&self, prefix: &str) -> Result<Vec<ObjectId>> {
        let prefix = prefix.to_ascii_lowercase();
        if prefix.len() > OBJECT_ID_LENGTH || !prefix.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidObjectId(prefix));
        }

        let dirs = if prefix.len() >= 2 {
            vec![prefix[..2].to_string()]
        } else {
            (0..=255u8).map(|i| format!("{i:02x}")).collect()
        };

        let mut matches = Vec::new();
        for dir_name in dirs {
            let dir_path = self.path.join(&dir_name);
            if !dir_path.is_dir() {
                continue;
            }

            for entry in std::fs::read_dir(&dir_path)? {
                let file_name = entry?.file_name();
                let full_oid = format!("{dir_name}{}", file_name.to_string_lossy());

                // skips temp files left by interrupted writes
                if full_oid.starts_with(&prefix)
                    && let Ok(oid) = ObjectId::try_parse(&full_oid)
                {
                    matches.push(oid);
                }
            }
        }
        matches.sort();

        Ok(matches)
    }

    /// Split `<type> <len>\0<payload>` and check the declared length
    fn parse_canonical(canonical: Vec<u8>) -> Result<(ObjectType, Bytes)> {
        let nul = canonical
            .iter()
            .position(|byte| *byte == 0)
            .ok_or_else(|| Error::corrupt("missing header terminator"))?;

        let header = std::str::from_utf8(&canonical[..nul])
            .map_err(|_| Error::corrupt("header is not valid UTF-8"))?;
        let (object_type, size) = header
            .split_once(' ')
            .ok_or_else(|| Error::corrupt(format!("malformed header {header:?}")))?;
        let object_type = ObjectType::try_from(object_type)?;
        let size = size
            .parse::<usize>()
            .map_err(|_| Error::corrupt(format!("invalid object size {size:?}")))?;

        let payload = Bytes::from(canonical).slice(nul + 1..);
        if payload.len() != size {
            return Err(Error::corrupt(format!(
                "declared size {size} but payload has {} bytes",
                payload.len()
            )));
        }

        Ok((object_type, payload))
    }

    fn write_object(&self, object_path: &Path, canonical: Bytes) -> Result<()> {
        let temp_object_path = Self::temp_path(object_path)?;
        let compressed = Self::compress(&canonical)?;

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_object_path)?;
        file.write_all(&compressed)?;
        file.sync_all()?;

        // rename the temp file to the object file to make it atomic
        std::fs::rename(&temp_object_path, object_path)?;

        Ok(())
    }

    fn temp_path(object_path: &Path) -> Result<PathBuf> {
        let object_dir = object_path
            .parent()
            .ok_or_else(|| Error::InvalidPath(object_path.display().to_string()))?;

        Ok(object_dir.join(format!("tmp-obj-{}", rand::random::<u32>())))
    }

    fn compress(data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data)?;

        Ok(encoder.finish()?)
    }

    fn decompress(data: &[u8]) -> Result<Vec<u8>> {
        let mut decoder = flate2::read::ZlibDecoder::new(data);
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .map_err(|e| Error::corrupt(format!("unable to decompress: {e}")))?;

        Ok(decompressed)
    }
}
