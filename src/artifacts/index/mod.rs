//! Index file format
//!
//! The index (also called staging area) maps repository-relative paths to the
//! blob digests that will be captured at the next commit.
//!
//! ## File Format (Version 1)
//!
//! ```text
//! Header (12 bytes):
//!   - Signature: "TIDX" (4 bytes)
//!   - Version: 1 (4 bytes)
//!   - Entry count (4 bytes)
//!
//! Entries (variable length, sorted by path):
//!   - Object ID (20 bytes)
//!   - File mode (4 bytes)
//!   - Path length (2 bytes)
//!   - Path (UTF-8)
//!
//! Checksum (20 bytes):
//!   - SHA-1 hash of all preceding bytes
//! ```
//!
//! All integers are big-endian.

pub mod checksum;
pub mod entry_mode;
pub mod index_entry;
pub mod index_header;

/// Size of SHA-1 checksum in bytes
pub const CHECKSUM_SIZE: usize = 20;

/// Size of index header in bytes
pub const HEADER_SIZE: usize = 12;

/// Magic signature identifying index files
pub const SIGNATURE: &str = "TIDX";

/// Index file format version
pub const VERSION: u32 = 1;
