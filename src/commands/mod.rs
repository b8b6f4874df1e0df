//! Repository operations
//!
//! Operations are grouped the way git groups its commands:
//!
//! - `plumbing`: direct object access (read an object, hash a payload)
//! - `porcelain`: the staging and history workflow (init, stage, commit, status, log)
//!
//! Every operation is an inherent method on
//! [`Repository`](crate::areas::repository::Repository) and returns structured
//! results. Rendering them is left to the caller.

pub mod plumbing;
pub mod porcelain;
