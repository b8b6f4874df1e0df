use crate::areas::repository::Repository;
use crate::artifacts::log::rev_list::{CommitRecord, RevList};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::Result;

impl Repository {
    /// History of HEAD, newest first
    ///
    /// Empty before the first commit. A missing link anywhere in the chain
    /// fails the whole call.
    pub async fn get_log(&self) -> Result<Vec<CommitRecord>> {
        match self.refs().resolve_head()? {
            Some(head) => self.log(head).collect(),
            None => Ok(Vec::new()),
        }
    }

    /// Lazy walk of the chain ending at `start`, newest first
    pub fn log(&self, start: ObjectId) -> RevList<'_> {
        RevList::new(self.database(), Some(start))
    }
}
