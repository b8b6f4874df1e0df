use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::{Author, Commit};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::Result;

impl Repository {
    /// Snapshot the index as a commit on top of HEAD and advance the current branch
    ///
    /// The tree and commit objects are stored before the branch ref moves, so
    /// the ref never points at a commit that is not in the store. HEAD is read
    /// while the index lock is held, so commits on a shared handle chain up.
    pub async fn create_commit(&self, message: &str, author: &Author) -> Result<ObjectId> {
        let index = self.index();
        let mut index = index.lock().await;

        let parent = self.refs().resolve_head()?;

        // Load the index file from the disk
        index.rehydrate()?;

        let tree_oid = self.database().build_tree(index.entries())?;

        let commit = Commit::new(parent, tree_oid, author.clone(), message.to_string());
        let commit_oid = self.database().store(&commit)?;
        self.refs().update_head(&commit_oid)?;

        tracing::info!(
            oid = %commit_oid,
            root = commit.parent().is_none(),
            message = %commit.short_message(),
            "created commit"
        );

        Ok(commit_oid)
    }
}
