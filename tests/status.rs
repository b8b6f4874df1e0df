use assert_fs::TempDir;
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::collections::{BTreeMap, BTreeSet};
use trove::artifacts::branch::branch_name::BranchName;
use trove::artifacts::index::entry_mode::FileMode;
use trove::artifacts::objects::commit::Author;
use trove::artifacts::status::status_info::IndexChangeType;

mod common;

use common::{author, init_repository, repository_dir};

#[rstest]
#[tokio::test]
async fn status_before_first_commit_lists_everything_as_added(repository_dir: TempDir) {
    let repository = init_repository(repository_dir.path()).await;
    repository.stage_file("a.txt", b"a").await.unwrap();
    repository.stage_file("dir/b.txt", b"b").await.unwrap();

    let status = repository.get_status().await.unwrap();

    assert_eq!(status.current_branch, BranchName::try_parse("main").unwrap());
    assert_eq!(status.head, None);
    assert_eq!(
        status.staged,
        BTreeSet::from(["a.txt".to_string(), "dir/b.txt".to_string()])
    );
    assert_eq!(
        status.changes,
        BTreeMap::from([
            ("a.txt".to_string(), IndexChangeType::Added),
            ("dir/b.txt".to_string(), IndexChangeType::Added),
        ])
    );
}

#[rstest]
#[tokio::test]
async fn status_after_commit_is_clean(repository_dir: TempDir, author: Author) {
    let repository = init_repository(repository_dir.path()).await;
    repository.stage_file("a.txt", b"a").await.unwrap();
    let commit_oid = repository.create_commit("first", &author).await.unwrap();

    let status = repository.get_status().await.unwrap();

    assert_eq!(status.head, Some(commit_oid));
    assert!(status.is_clean());
    assert_eq!(status.staged.len(), 1);
}

#[rstest]
#[tokio::test]
async fn status_reports_changes_against_head(repository_dir: TempDir, author: Author) {
    let repository = init_repository(repository_dir.path()).await;
    repository.stage_file("kept.txt", b"kept").await.unwrap();
    repository.stage_file("edited.txt", b"before").await.unwrap();
    repository.stage_file("script.sh", b"echo").await.unwrap();
    repository.stage_file("removed.txt", b"bye").await.unwrap();
    repository.create_commit("first", &author).await.unwrap();

    repository.stage_file("edited.txt", b"after").await.unwrap();
    repository
        .stage_file_with_mode("script.sh", b"echo", FileMode::Executable)
        .await
        .unwrap();
    repository.unstage_file("removed.txt").await.unwrap();
    repository.stage_file("new.txt", b"new").await.unwrap();

    let status = repository.get_status().await.unwrap();

    assert_eq!(
        status.changes,
        BTreeMap::from([
            ("edited.txt".to_string(), IndexChangeType::Modified),
            ("new.txt".to_string(), IndexChangeType::Added),
            ("removed.txt".to_string(), IndexChangeType::Deleted),
            ("script.sh".to_string(), IndexChangeType::Modified),
        ])
    );
}
