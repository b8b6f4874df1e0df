use crate::areas::repository::Repository;
use crate::artifacts::objects::object::encode;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::Result;

impl Repository {
    /// Digest of `data` as a blob; stored only when `write` is set
    pub fn hash_object(&self, data: &[u8], write: bool) -> Result<ObjectId> {
        if !write {
            return Ok(encode(ObjectType::Blob, data).0);
        }

        self.database().put(ObjectType::Blob, data)
    }
}
