//! References (HEAD and branches)
//!
//! References are human-readable names pointing to commits. They can be:
//! - Direct: containing a 40-character digest (`refs/heads/<branch>`)
//! - Symbolic: pointing to another reference (`HEAD` -> `ref: refs/heads/main`)
//!
//! HEAD is always symbolic. A branch ref that does not exist yet is the valid
//! state of a repository without commits, not an error.
//!
//! Every ref file is rewritten wholesale through `<ref>.lock` followed by a
//! rename, so a crash never leaves a half-written ref behind.

use crate::artifacts::branch::branch_name::{BranchName, SymRefName};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};
use derive_new::new;
use file_guard::Lock;
use std::io::Write;
use std::ops::DerefMut;
use std::path::{Path, PathBuf};

/// Name of the HEAD reference
pub const HEAD_REF_NAME: &str = "HEAD";

/// Prefix marking a symbolic ref
const SYMREF_PREFIX: &str = "ref: ";

/// Symbolic refs followed before giving up on a cycle
const MAX_SYMREF_DEPTH: usize = 8;

#[derive(Debug, new)]
pub struct Refs {
    /// Path to the store root holding HEAD and refs/
    path: Box<Path>,
}

/// Decoded content of a ref file
#[derive(Debug, Clone, PartialEq, Eq)]
enum SymRefOrOid {
    SymRef(SymRefName),
    Oid(ObjectId),
}

impl SymRefOrOid {
    fn read_symref_or_oid(path: &Path) -> Result<Option<SymRefOrOid>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let content = content.trim();

        if content.is_empty() {
            return Ok(None);
        }

        match content.strip_prefix(SYMREF_PREFIX) {
            Some(target) => Ok(Some(SymRefOrOid::SymRef(SymRefName::new(
                target.trim().to_string(),
            )))),
            None => ObjectId::try_parse(content)
                .map(|oid| Some(SymRefOrOid::Oid(oid)))
                .map_err(|_| {
                    Error::RefResolution(format!(
                        "{} holds neither a digest nor a symbolic ref",
                        path.display()
                    ))
                }),
        }
    }
}

impl Refs {
    /// Branch HEAD points at
    pub fn current_branch_name(&self) -> Result<BranchName> {
        match SymRefOrOid::read_symref_or_oid(&self.head_path())? {
            Some(SymRefOrOid::SymRef(sym_ref_name)) => BranchName::try_parse_sym_ref_name(&sym_ref_name),
            Some(SymRefOrOid::Oid(_)) => Err(Error::RefResolution(
                "HEAD is detached, which is not supported".into(),
            )),
            None => Err(Error::RefResolution("HEAD is missing".into())),
        }
    }

    /// Commit HEAD resolves to, or `None` before the first commit
    pub fn resolve_head(&self) -> Result<Option<ObjectId>> {
        let branch = self.current_branch_name()?;
        self.read_ref(&branch)
    }

    /// Commit a branch points at, or `None` if the branch has no commits yet
    pub fn read_ref(&self, branch: &BranchName) -> Result<Option<ObjectId>> {
        self.read_symref(&self.ref_path(&branch.to_sym_ref_name()), 0)
    }

    /// Follow symbolic refs until reaching a digest
    fn read_symref(&self, path: &Path, depth: usize) -> Result<Option<ObjectId>> {
        if depth > MAX_SYMREF_DEPTH {
            return Err(Error::RefResolution(format!(
                "too many levels of symbolic refs at {}",
                path.display()
            )));
        }

        match SymRefOrOid::read_symref_or_oid(path)? {
            Some(SymRefOrOid::SymRef(sym_ref_name)) => {
                self.read_symref(&self.ref_path(&sym_ref_name), depth + 1)
            }
            Some(SymRefOrOid::Oid(oid)) => Ok(Some(oid)),
            None => Ok(None),
        }
    }

    /// Point a branch at a new commit
    pub fn update_branch(&self, branch: &BranchName, oid: &ObjectId) -> Result<()> {
        let ref_path = self.ref_path(&branch.to_sym_ref_name());
        self.update_ref_file(&ref_path, oid.as_ref())?;

        tracing::debug!(%branch, %oid, "updated branch");
        Ok(())
    }

    /// Advance the branch HEAD points at
    pub fn update_head(&self, oid: &ObjectId) -> Result<()> {
        let branch = self.current_branch_name()?;
        self.update_branch(&branch, oid)
    }

    /// Make HEAD a symbolic ref to `branch`
    pub fn set_head(&self, branch: &BranchName) -> Result<()> {
        let content = format!("{SYMREF_PREFIX}{}", branch.to_sym_ref_name());
        self.update_ref_file(&self.head_path(), &content)
    }

    /// Write `raw_ref` to `path` atomically
    ///
    /// The content is written to `<path>.lock` under an exclusive lock and then
    /// renamed over `path`.
    pub fn update_ref_file(&self, path: &Path, raw_ref: &str) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::InvalidPath(path.display().to_string()))?;
        std::fs::create_dir_all(parent)?;

        let lock_path = Self::lock_path(path);
        {
            let mut lock_file = std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&lock_path)?;
            let mut lock = file_guard::lock(&mut lock_file, Lock::Exclusive, 0, 1)?;
            lock.deref_mut().write_all(raw_ref.as_bytes())?;
            lock.deref_mut().sync_all()?;
        }
        std::fs::rename(&lock_path, path)?;

        Ok(())
    }

    fn lock_path(path: &Path) -> PathBuf {
        let mut lock_path = path.as_os_str().to_owned();
        lock_path.push(".lock");
        PathBuf::from(lock_path)
    }

    fn ref_path(&self, sym_ref_name: &SymRefName) -> PathBuf {
        self.path.join(sym_ref_name.as_ref_path())
    }

    pub fn head_path(&self) -> PathBuf {
        self.path.join(HEAD_REF_NAME)
    }

    pub fn refs_path(&self) -> PathBuf {
        self.path.join("refs")
    }

    pub fn heads_path(&self) -> PathBuf {
        self.refs_path().join("heads")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    const OID: &str = "3b18e512dba79e4c8300dd08aeb37f8e728b8dad";

    #[fixture]
    fn store_dir() -> TempDir {
        TempDir::new().unwrap()
    }

    fn main_branch() -> BranchName {
        BranchName::try_parse("main").unwrap()
    }

    fn refs_with_head(dir: &TempDir) -> Refs {
        let refs = Refs::new(dir.path().to_path_buf().into_boxed_path());
        refs.set_head(&main_branch()).unwrap();
        refs
    }

    #[rstest]
    fn head_is_stored_as_symbolic_ref(store_dir: TempDir) {
        let refs = refs_with_head(&store_dir);

        assert_eq!(
            std::fs::read_to_string(refs.head_path()).unwrap(),
            "ref: refs/heads/main"
        );
        assert_eq!(refs.current_branch_name().unwrap(), main_branch());
    }

    #[rstest]
    fn unborn_branch_resolves_to_none(store_dir: TempDir) {
        let refs = refs_with_head(&store_dir);

        assert_eq!(refs.resolve_head().unwrap(), None);
    }

    #[rstest]
    fn updated_branch_is_resolved_through_head(store_dir: TempDir) {
        let refs = refs_with_head(&store_dir);
        let oid = ObjectId::try_parse(OID).unwrap();

        refs.update_head(&oid).unwrap();

        assert_eq!(refs.resolve_head().unwrap(), Some(oid));
        assert_eq!(
            std::fs::read_to_string(refs.heads_path().join("main")).unwrap(),
            OID
        );
        assert!(!refs.heads_path().join("main.lock").exists());
    }

    #[rstest]
    fn missing_head_is_a_resolution_error(store_dir: TempDir) {
        let refs = Refs::new(store_dir.path().to_path_buf().into_boxed_path());

        assert!(matches!(refs.resolve_head(), Err(Error::RefResolution(_))));
    }

    #[rstest]
    #[case::detached(OID)]
    #[case::garbage("not a ref")]
    #[case::outside_heads("ref: refs/tags/v1")]
    fn malformed_head_is_a_resolution_error(store_dir: TempDir, #[case] head: &str) {
        let refs = Refs::new(store_dir.path().to_path_buf().into_boxed_path());
        std::fs::write(refs.head_path(), head).unwrap();

        assert!(matches!(refs.resolve_head(), Err(Error::RefResolution(_))));
    }

    #[rstest]
    fn malformed_branch_ref_is_a_resolution_error(store_dir: TempDir) {
        let refs = refs_with_head(&store_dir);
        std::fs::create_dir_all(refs.heads_path()).unwrap();
        std::fs::write(refs.heads_path().join("main"), "deadbeef").unwrap();

        assert!(matches!(refs.resolve_head(), Err(Error::RefResolution(_))));
    }

    #[rstest]
    fn symbolic_cycles_are_detected(store_dir: TempDir) {
        let refs = refs_with_head(&store_dir);
        std::fs::create_dir_all(refs.heads_path()).unwrap();
        std::fs::write(refs.heads_path().join("main"), "ref: refs/heads/main").unwrap();

        assert!(matches!(refs.resolve_head(), Err(Error::RefResolution(_))));
    }
}
