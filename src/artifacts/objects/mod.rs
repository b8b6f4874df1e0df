//! Object model: blobs, trees and commits
//!
//! All content is stored as objects identified by the SHA-1 of their canonical
//! encoding:
//!
//! - **Blob**: file content (raw bytes)
//! - **Tree**: directory listing (modes, names and object IDs)
//! - **Commit**: snapshot with metadata (tree, optional parent, author, message)
//!
//! The canonical encoding is `<type> <size>\0<payload>`.

pub mod blob;
pub mod commit;
pub mod object;
pub mod object_id;
pub mod object_type;
pub mod tree;

/// Length of a SHA-1 hash in hexadecimal format
pub const OBJECT_ID_LENGTH: usize = 40;

/// Length of a SHA-1 hash in raw bytes
pub const OBJECT_ID_RAW_LENGTH: usize = OBJECT_ID_LENGTH / 2;
