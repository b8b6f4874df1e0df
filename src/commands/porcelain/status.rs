use crate::areas::repository::Repository;
use crate::artifacts::status::status_info::{HeadTree, StatusInfo};
use crate::errors::Result;

impl Repository {
    /// Staged paths, current branch and HEAD, plus how the index differs from HEAD
    pub async fn get_status(&self) -> Result<StatusInfo> {
        let index = self.index();
        let mut index = index.lock().await;

        index.rehydrate()?;

        let current_branch = self.refs().current_branch_name()?;
        let head = self.refs().resolve_head()?;

        let head_tree = match &head {
            Some(head) => {
                let commit = self.database().parse_object_as_commit(head)?;
                self.database().flatten_tree(commit.tree_oid())?
            }
            None => HeadTree::new(),
        };

        Ok(StatusInfo::compare(
            current_branch,
            head,
            index.entries(),
            &head_tree,
        ))
    }
}
