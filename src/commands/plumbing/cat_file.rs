use crate::areas::repository::Repository;
use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::{Error, Result};
use bytes::Bytes;

/// Shortest abbreviated digest accepted by [`Repository::resolve_object_id`]
pub const MIN_PREFIX_LENGTH: usize = 4;

impl Repository {
    /// Type and payload of a stored object
    pub fn read_object(&self, object_id: &ObjectId) -> Result<(ObjectType, Bytes)> {
        self.database().get(object_id)
    }

    /// Expand a full or abbreviated digest into the digest of a stored object
    pub fn resolve_object_id(&self, prefix: &str) -> Result<ObjectId> {
        if prefix.len() == OBJECT_ID_LENGTH {
            return ObjectId::try_parse(prefix);
        }
        if prefix.len() < MIN_PREFIX_LENGTH {
            return Err(Error::InvalidObjectId(format!(
                "{prefix} is shorter than {MIN_PREFIX_LENGTH} characters"
            )));
        }

        let mut candidates = self.database().find_objects_by_prefix(prefix)?;
        match candidates.len() {
            0 => Err(Error::InvalidObjectId(format!("no object matches {prefix}"))),
            1 => Ok(candidates.remove(0)),
            count => Err(Error::AmbiguousObjectId {
                prefix: prefix.to_string(),
                candidates: count,
            }),
        }
    }
}
