//! Staging area status relative to HEAD

pub mod status_info;
