//! Data structures and algorithms of the storage engine
//!
//! - `branch`: branch names and their ref paths
//! - `index`: on-disk index format (header, entries, checksum, file modes)
//! - `log`: commit chain traversal
//! - `objects`: blob, tree and commit objects and their canonical encoding
//! - `status`: comparison of the index with HEAD

pub mod branch;
pub mod index;
pub mod log;
pub mod objects;
pub mod status;
