//! Error taxonomy of the storage engine
//!
//! Every fallible core operation returns [`Result`]. None of these errors is
//! retried internally: all operations are local and deterministic, so a
//! second attempt at a corrupt read cannot succeed.

use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The digest is absent from the object store
    #[error("object {0} not found")]
    ObjectNotFound(ObjectId),

    /// Stored bytes violate the canonical object format
    #[error("corrupt object{}: {reason}", .oid.as_ref().map(|oid| format!(" {oid}")).unwrap_or_default())]
    CorruptObject {
        oid: Option<ObjectId>,
        reason: String,
    },

    /// The object exists but holds a different variant than requested
    #[error("object {oid} is a {actual}, expected a {expected}")]
    TypeMismatch {
        oid: ObjectId,
        expected: ObjectType,
        actual: ObjectType,
    },

    /// HEAD or a branch ref is missing or malformed
    #[error("unable to resolve reference: {0}")]
    RefResolution(String),

    /// The staging file cannot be decoded
    #[error("index is corrupt: {0}")]
    IndexCorrupt(String),

    #[error("invalid object id: {0}")]
    InvalidObjectId(String),

    #[error("ambiguous object id {prefix}: {candidates} candidates")]
    AmbiguousObjectId { prefix: String, candidates: usize },

    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Corruption detected while decoding a payload whose digest is not known yet
    pub fn corrupt(reason: impl Into<String>) -> Self {
        Self::CorruptObject {
            oid: None,
            reason: reason.into(),
        }
    }

    /// Attach the digest of the object being decoded to a corruption error
    pub fn with_oid(self, object_id: &ObjectId) -> Self {
        match self {
            Self::CorruptObject { oid: None, reason } => Self::CorruptObject {
                oid: Some(object_id.clone()),
                reason,
            },
            other => other,
        }
    }
}
