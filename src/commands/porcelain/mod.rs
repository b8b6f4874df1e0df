//! Porcelain operations
//!
//! - `init`: create the store layout and point HEAD at the default branch
//! - `add`: stage file contents
//! - `rm`: unstage paths
//! - `commit`: snapshot the index and advance the current branch
//! - `status`: compare the index with HEAD
//! - `log`: walk the history of HEAD

pub mod add;
pub mod commit;
pub mod init;
pub mod log;
pub mod rm;
pub mod status;
