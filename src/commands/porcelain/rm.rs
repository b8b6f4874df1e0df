use crate::areas::repository::Repository;
use crate::artifacts::index::index_entry::normalize_path;
use crate::errors::Result;

impl Repository {
    /// Remove `path` from the index; returns whether it was staged
    ///
    /// Unstaging a path that is not staged leaves the index file untouched.
    pub async fn unstage_file(&self, path: &str) -> Result<bool> {
        let path = normalize_path(path)?;
        self.ensure_initialized()?;

        let index = self.index();
        let mut index = index.lock().await;

        index.rehydrate()?;

        if !index.remove(&path) {
            return Ok(false);
        }
        index.write_updates()?;

        tracing::debug!(%path, "unstaged file");
        Ok(true)
    }
}
