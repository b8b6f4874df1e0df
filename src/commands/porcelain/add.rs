use crate::areas::repository::Repository;
use crate::artifacts::index::entry_mode::FileMode;
use crate::artifacts::index::index_entry::{IndexEntry, normalize_path};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::Result;

impl Repository {
    /// Store `data` as a blob and stage it at `path` as a regular file
    pub async fn stage_file(&self, path: &str, data: &[u8]) -> Result<ObjectId> {
        self.stage_file_with_mode(path, data, FileMode::Regular).await
    }

    /// Store `data` as a blob and stage it at `path` with the given mode
    ///
    /// The blob is written before the index entry, so a staged digest always
    /// names a stored object. Returns the blob digest.
    pub async fn stage_file_with_mode(&self, path: &str, data: &[u8], mode: FileMode) -> Result<ObjectId> {
        let path = normalize_path(path)?;
        self.ensure_initialized()?;

        let index = self.index();
        let mut index = index.lock().await;

        // Load the index file from the disk
        index.rehydrate()?;

        let blob_oid = self.database().put(ObjectType::Blob, data)?;
        index.add(IndexEntry::new(path.clone(), blob_oid.clone(), mode));
        index.write_updates()?;

        tracing::debug!(%path, oid = %blob_oid, "staged file");
        Ok(blob_oid)
    }
}
