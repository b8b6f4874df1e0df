//! Plumbing operations
//!
//! - `cat-file`: read an object back as its type and payload
//! - `hash-object`: compute a blob digest and optionally store it

pub mod cat_file;
pub mod hash_object;
