use crate::areas::database::Database;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::Result;
use derive_new::new;

/// A decoded commit together with its digest
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct CommitRecord {
    pub oid: ObjectId,
    pub commit: Commit,
}

/// Lazy walk over a commit chain, newest first
///
/// Each step loads one commit. A missing or unreadable link yields its error
/// and ends the walk, so collecting into `Result<Vec<_>>` never produces a
/// partial history.
#[derive(Debug, Clone, new)]
pub struct RevList<'r> {
    database: &'r Database,
    next_oid: Option<ObjectId>,
}

impl Iterator for RevList<'_> {
    type Item = Result<CommitRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let commit_oid = self.next_oid.take()?;

        match self.database.parse_object_as_commit(&commit_oid) {
            Ok(commit) => {
                self.next_oid = commit.parent().cloned();
                Some(Ok(CommitRecord::new(commit_oid, commit)))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

impl std::iter::FusedIterator for RevList<'_> {}
