//! Content-addressed storage engine for a minimal version control system
//!
//! - [`areas`]: the on-disk components bound to one repository root
//! - [`artifacts`]: objects, index entries, branch names and history records
//! - [`commands`]: the operations a front end drives
//! - [`errors`]: the error taxonomy shared by all of them

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod errors;
