use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use crate::artifacts::objects::OBJECT_ID_RAW_LENGTH;
use crate::errors::Result;
use bytes::Bytes;
use sha1::{Digest, Sha1};
use std::io::BufRead;

/// Serialize a value into its payload bytes
pub trait Packable {
    fn serialize(&self) -> Result<Bytes>;
}

/// Decode a value from its payload bytes
pub trait Unpackable {
    fn deserialize(reader: impl BufRead) -> Result<Self>
    where
        Self: Sized;
}

pub trait Object: Packable {
    fn object_type(&self) -> ObjectType;

    fn display(&self) -> String;

    /// Digest and canonical bytes of this object
    fn encode(&self) -> Result<(ObjectId, Bytes)> {
        Ok(encode(self.object_type(), &self.serialize()?))
    }

    fn object_id(&self) -> Result<ObjectId> {
        Ok(self.encode()?.0)
    }
}

/// Canonical encoding of an object: `<type> <len>\0<payload>`, plus its SHA-1 digest.
pub fn encode(object_type: ObjectType, payload: &[u8]) -> (ObjectId, Bytes) {
    let header = format!("{} {}\0", object_type.as_str(), payload.len());

    let mut canonical = Vec::with_capacity(header.len() + payload.len());
    canonical.extend_from_slice(header.as_bytes());
    canonical.extend_from_slice(payload);

    let mut hasher = Sha1::new();
    hasher.update(&canonical);
    let mut digest = [0u8; OBJECT_ID_RAW_LENGTH];
    digest.copy_from_slice(&hasher.finalize());

    (ObjectId::from_raw(&digest), Bytes::from(canonical))
}

/// A decoded object, dispatched once on its type tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectBox {
    Blob(Box<Blob>),
    Tree(Box<Tree>),
    Commit(Box<Commit>),
}

impl ObjectBox {
    pub fn object_type(&self) -> ObjectType {
        match self {
            ObjectBox::Blob(_) => ObjectType::Blob,
            ObjectBox::Tree(_) => ObjectType::Tree,
            ObjectBox::Commit(_) => ObjectType::Commit,
        }
    }

    pub fn display(&self) -> String {
        match self {
            ObjectBox::Blob(blob) => blob.display(),
            ObjectBox::Tree(tree) => tree.display(),
            ObjectBox::Commit(commit) => commit.display(),
        }
    }
}
