//! Repository configuration
//!
//! Layout names and behavior switches. Defaults describe the standard layout;
//! [`RepositoryConfig::from_env`] lets the command-line front end override them.

use crate::artifacts::branch::branch_name::BranchName;
use crate::errors::{Error, Result};

/// Directory holding objects, refs and the index, relative to the repository root
pub const STORE_DIR: &str = ".trove";

pub const DEFAULT_BRANCH: &str = "main";

/// Branch HEAD points at after `init`
pub const DEFAULT_BRANCH_ENV: &str = "TROVE_DEFAULT_BRANCH";

/// Treat an undecodable index as empty (logged) instead of failing
pub const INDEX_RECOVER_ENV: &str = "TROVE_INDEX_RECOVER";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    pub default_branch: BranchName,
    pub recover_corrupt_index: bool,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        RepositoryConfig {
            default_branch: BranchName::default(),
            recover_corrupt_index: false,
        }
    }
}

impl RepositoryConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(branch) = std::env::var(DEFAULT_BRANCH_ENV) {
            config.default_branch = BranchName::try_parse(branch)
                .map_err(|e| Error::Config(format!("{DEFAULT_BRANCH_ENV}: {e}")))?;
        }

        if let Ok(flag) = std::env::var(INDEX_RECOVER_ENV) {
            config.recover_corrupt_index = match flag.as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                other => {
                    return Err(Error::Config(format!(
                        "{INDEX_RECOVER_ENV} must be a boolean, got {other:?}"
                    )));
                }
            };
        }

        Ok(config)
    }
}
