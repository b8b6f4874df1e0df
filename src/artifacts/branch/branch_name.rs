use crate::areas::config::DEFAULT_BRANCH;
use crate::artifacts::branch::INVALID_BRANCH_NAME_REGEX;
use crate::errors::{Error, Result};
use derive_new::new;

/// Prefix of every branch ref
pub const REF_PREFIX: &str = "refs/heads/";

/// Full name of a ref relative to the store root, e.g. `refs/heads/main` or `HEAD`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, new)]
pub struct SymRefName(String);

impl SymRefName {
    pub fn as_ref_path(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SymRefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchName(String);

impl BranchName {
    pub fn try_parse(name: impl Into<String>) -> Result<Self> {
        let name = name.into();

        if name.is_empty() {
            return Err(Error::InvalidBranchName("branch name cannot be empty".into()));
        }

        let re = regex::Regex::new(INVALID_BRANCH_NAME_REGEX)
            .map_err(|e| Error::Config(format!("invalid branch name regex: {e}")))?;

        if re.is_match(&name) {
            Err(Error::InvalidBranchName(name))
        } else {
            Ok(Self(name))
        }
    }

    /// Extract the branch from a `refs/heads/<name>` ref
    pub fn try_parse_sym_ref_name(sym_ref_name: &SymRefName) -> Result<Self> {
        let name = sym_ref_name
            .as_ref_path()
            .strip_prefix(REF_PREFIX)
            .ok_or_else(|| {
                Error::RefResolution(format!(
                    "symbolic ref must start with '{REF_PREFIX}', got '{sym_ref_name}'"
                ))
            })?;

        Self::try_parse(name)
    }

    pub fn to_sym_ref_name(&self) -> SymRefName {
        SymRefName::new(format!("{REF_PREFIX}{}", self.0))
    }
}

impl Default for BranchName {
    fn default() -> Self {
        Self(DEFAULT_BRANCH.to_string())
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::proptest;

    proptest! {
        #[test]
        fn accepts_alphanumeric_names(branch_name in "[a-zA-Z0-9_-]+") {
            assert!(BranchName::try_parse(branch_name).is_ok());
        }

        #[test]
        fn accepts_hierarchical_names(prefix in "[a-zA-Z0-9_-]+", suffix in "[a-zA-Z0-9_-]+") {
            assert!(BranchName::try_parse(format!("{prefix}/{suffix}")).is_ok());
        }

        #[test]
        fn rejects_lock_suffix(prefix in "[a-zA-Z0-9_-]+") {
            assert!(BranchName::try_parse(format!("{prefix}.lock")).is_err());
        }

        #[test]
        fn rejects_consecutive_dots(prefix in "[a-zA-Z0-9_-]+", suffix in "[a-zA-Z0-9_-]+") {
            assert!(BranchName::try_parse(format!("{prefix}..{suffix}")).is_err());
        }

        #[test]
        fn rejects_special_characters(
            prefix in "[a-zA-Z0-9_-]+",
            suffix in "[a-zA-Z0-9_-]+",
            special_char in r"[\*:\?\[\\^~ ]"
        ) {
            assert!(BranchName::try_parse(format!("{prefix}{special_char}{suffix}")).is_err());
        }
    }

    #[test]
    fn rejects_empty_and_edge_slashes() {
        assert!(BranchName::try_parse("").is_err());
        assert!(BranchName::try_parse("/main").is_err());
        assert!(BranchName::try_parse("main/").is_err());
        assert!(BranchName::try_parse(".hidden").is_err());
    }

    #[test]
    fn converts_to_and_from_sym_ref() {
        let branch = BranchName::try_parse("feature/x").unwrap();
        let sym_ref = branch.to_sym_ref_name();

        assert_eq!(sym_ref.as_ref_path(), "refs/heads/feature/x");
        assert_eq!(BranchName::try_parse_sym_ref_name(&sym_ref).unwrap(), branch);
        assert!(BranchName::try_parse_sym_ref_name(&SymRefName::new("HEAD".into())).is_err());
    }
}
