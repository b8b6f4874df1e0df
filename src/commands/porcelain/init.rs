use crate::areas::repository::Repository;
use crate::errors::Result;
use std::fs;

impl Repository {
    /// Create the store layout and point HEAD at the configured default branch
    ///
    /// Re-running `init` on an initialized repository keeps its HEAD, history
    /// and index untouched.
    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(self.database().objects_path())?;
        fs::create_dir_all(self.refs().heads_path())?;

        if self.is_initialized() {
            tracing::info!(path = %self.path().display(), "reinitialized existing repository");
            return Ok(());
        }

        self.refs().set_head(&self.config().default_branch)?;
        tracing::info!(
            path = %self.path().display(),
            branch = %self.config().default_branch,
            "initialized empty repository"
        );

        Ok(())
    }
}
