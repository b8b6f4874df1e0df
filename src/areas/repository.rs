use crate::areas::config::{RepositoryConfig, STORE_DIR};
use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::refs::Refs;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Lifecycle of a repository: `init` leaves it empty, each commit advances it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryState {
    Uninitialized,
    Empty,
    HasCommits(ObjectId),
}

/// Handle bound to one repository root
///
/// Every component receives its location from here, so several repositories
/// can be open in the same process without sharing state.
pub struct Repository {
    path: Box<Path>,
    config: RepositoryConfig,
    index: Arc<Mutex<Index>>,
    database: Database,
    refs: Refs,
}

impl Repository {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(path, RepositoryConfig::default())
    }

    pub fn with_config(path: impl AsRef<Path>, config: RepositoryConfig) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            std::fs::create_dir_all(path)?;
        }
        let path = path.canonicalize()?;
        let store_path = path.join(STORE_DIR);

        let index = Index::new(store_path.join("index").into_boxed_path())
            .with_recovery(config.recover_corrupt_index);
        let database = Database::new(store_path.join("objects").into_boxed_path());
        let refs = Refs::new(store_path.into_boxed_path());

        Ok(Repository {
            path: path.into_boxed_path(),
            config,
            index: Arc::new(Mutex::new(index)),
            database,
            refs,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store_path(&self) -> Box<Path> {
        self.path.join(STORE_DIR).into_boxed_path()
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub fn index(&self) -> Arc<Mutex<Index>> {
        self.index.clone()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    pub fn is_initialized(&self) -> bool {
        self.refs.head_path().is_file()
    }

    /// Fail with `RefResolution` unless `init` has written HEAD
    pub fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            return Ok(());
        }

        Err(Error::RefResolution(format!(
            "no repository at {}",
            self.path.display()
        )))
    }

    pub fn state(&self) -> Result<RepositoryState> {
        if !self.is_initialized() {
            return Ok(RepositoryState::Uninitialized);
        }

        Ok(match self.refs.resolve_head()? {
            Some(head) => RepositoryState::HasCommits(head),
            None => RepositoryState::Empty,
        })
    }
}
