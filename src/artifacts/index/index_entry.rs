//! Index entry representation
//!
//! Each entry maps a repository-relative path to the digest of the blob staged
//! for it, along with the file mode recorded in the tree at commit time.

use crate::artifacts::index::entry_mode::FileMode;
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};
use byteorder::{NetworkEndian, ReadBytesExt, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use std::io::{BufRead, Read, Write};

/// Maximum path length supported in index entries
pub const MAX_PATH_SIZE: usize = 4095;

/// Index entry representing a staged file
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct IndexEntry {
    /// File path relative to repository root, `/`-separated
    pub path: String,
    /// Digest of the staged blob
    pub oid: ObjectId,
    pub mode: FileMode,
}

impl IndexEntry {
    /// Every ancestor directory of the entry, outermost first
    ///
    /// `a/b/c.txt` yields `["a", "a/b"]`.
    pub fn parent_dirs(&self) -> Vec<&str> {
        self.path
            .match_indices('/')
            .map(|(i, _)| &self.path[..i])
            .collect()
    }
}

/// Validate and normalize a repository-relative path
///
/// Accepts `/` or `\` separators and a leading `./`. Rejects absolute paths,
/// empty components and `.`/`..` components.
pub fn normalize_path(path: &str) -> Result<String> {
    let invalid = || Error::InvalidPath(path.to_string());

    if path.is_empty() || path.contains('\0') || path.starts_with('/') || path.starts_with('\\') {
        return Err(invalid());
    }

    let unified = path.replace('\\', "/");
    let trimmed = unified.strip_prefix("./").unwrap_or(&unified);

    let components = trimmed.split('/').collect::<Vec<_>>();
    if components
        .iter()
        .any(|component| component.is_empty() || *component == "." || *component == "..")
    {
        return Err(invalid());
    }

    let normalized = components.join("/");
    if normalized.len() > MAX_PATH_SIZE {
        return Err(invalid());
    }

    Ok(normalized)
}

impl Packable for IndexEntry {
    fn serialize(&self) -> Result<Bytes> {
        let path = self.path.as_bytes();
        let mut bytes = Vec::with_capacity(20 + 4 + 2 + path.len());

        self.oid.write_h40_to(&mut bytes)?;
        bytes.write_u32::<NetworkEndian>(self.mode.as_u32())?;
        bytes.write_u16::<NetworkEndian>(path.len() as u16)?;
        bytes.write_all(path)?;

        Ok(Bytes::from(bytes))
    }
}

impl Unpackable for IndexEntry {
    fn deserialize(mut reader: impl BufRead) -> Result<Self> {
        let truncated = |_| Error::IndexCorrupt("truncated index entry".into());

        let oid = ObjectId::read_h40_from(&mut reader)
            .map_err(|_| Error::IndexCorrupt("truncated index entry".into()))?;
        let mode = FileMode::try_from(reader.read_u32::<NetworkEndian>().map_err(truncated)?)?;
        let path_len = reader.read_u16::<NetworkEndian>().map_err(truncated)? as usize;

        let mut path = vec![0u8; path_len];
        reader.read_exact(&mut path).map_err(truncated)?;
        let path = String::from_utf8(path)
            .map_err(|_| Error::IndexCorrupt("index path is not valid UTF-8".into()))?;
        let path = normalize_path(&path).map_err(|_| Error::IndexCorrupt(format!("invalid path {path:?}")))?;

        Ok(IndexEntry::new(path, oid, mode))
    }
}
