//! Core repository components
//!
//! - `config`: Layout names and behavior switches
//! - `database`: Object database for storing blobs, trees, and commits
//! - `index`: Staging area mapping paths to blob digests
//! - `refs`: HEAD and branch references
//! - `repository`: Handle tying the components to one repository root

pub mod config;
pub mod database;
pub mod index;
pub mod refs;
pub mod repository;
