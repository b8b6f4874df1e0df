#![allow(dead_code)]

use assert_cmd::Command;
use assert_fs::TempDir;
use chrono::DateTime;
use fake::Fake;
use fake::faker::internet::en::FreeEmail;
use fake::faker::name::en::Name;
use rstest::fixture;
use std::path::Path;
use trove::areas::repository::Repository;
use trove::artifacts::objects::commit::Author;

pub const AUTHOR_DATE: &str = "2023-01-01 12:00:00 +0000";

#[fixture]
pub fn repository_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

#[fixture]
pub fn author() -> Author {
    let timestamp = DateTime::parse_from_str(AUTHOR_DATE, "%Y-%m-%d %H:%M:%S %z")
        .expect("Failed to parse author date");

    Author::new_with_timestamp(Name().fake(), FreeEmail().fake(), timestamp)
}

/// Open a repository in `dir` and run `init` on it
pub async fn init_repository(dir: &Path) -> Repository {
    let repository = Repository::new(dir).expect("Failed to open repository");
    repository.init().await.expect("Failed to init repository");
    repository
}

pub fn run_trove_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("trove").expect("Failed to find trove binary");
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("TROVE_LOG");
    cmd.current_dir(dir);
    for arg in args {
        cmd.arg(arg);
    }
    cmd
}

pub fn trove_commit(dir: &Path, message: &str) -> Command {
    let mut cmd = run_trove_command(dir, &["commit", "-m", message]);
    cmd.envs(vec![
        ("TROVE_AUTHOR_NAME", "fake_user"),
        ("TROVE_AUTHOR_EMAIL", "fake_email@email.com"),
        ("TROVE_AUTHOR_DATE", AUTHOR_DATE),
    ]);
    cmd
}

/// Digest stored in a branch ref file
pub fn read_branch(dir: &Path, branch: &str) -> String {
    std::fs::read_to_string(dir.join(".trove").join("refs").join("heads").join(branch))
        .expect("Failed to read branch ref")
        .trim()
        .to_string()
}
