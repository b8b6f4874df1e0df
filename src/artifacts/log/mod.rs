//! Commit history traversal
//!
//! History is a single chain: every commit has at most one parent, so walking
//! the log means following parent links from a starting commit until a root
//! commit is reached.

pub mod rev_list;
