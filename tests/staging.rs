use assert_fs::TempDir;
use bytes::Bytes;
use fake::Fake;
use fake::faker::lorem::en::Words;
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::collections::BTreeSet;
use trove::areas::config::RepositoryConfig;
use trove::areas::repository::Repository;
use trove::artifacts::index::entry_mode::FileMode;
use trove::artifacts::objects::object::encode;
use trove::artifacts::objects::object_type::ObjectType;
use trove::errors::Error;

mod common;

use common::{init_repository, repository_dir};

#[rstest]
#[tokio::test]
async fn staging_a_path_twice_keeps_the_latest_digest(repository_dir: TempDir) {
    let repository = init_repository(repository_dir.path()).await;

    repository.stage_file("f", b"first").await.unwrap();
    let latest = repository.stage_file("f", b"second").await.unwrap();

    let index = repository.index();
    let mut index = index.lock().await;
    index.rehydrate().unwrap();

    assert_eq!(index.len(), 1);
    assert_eq!(index.entry_by_path("f").unwrap().oid, latest);
}

#[rstest]
#[tokio::test]
async fn staged_blob_is_stored_before_the_index_entry(repository_dir: TempDir) {
    let repository = init_repository(repository_dir.path()).await;
    let content = Words(3..8).fake::<Vec<String>>().join(" ");

    let blob_oid = repository
        .stage_file("notes.txt", content.as_bytes())
        .await
        .unwrap();

    assert_eq!(
        repository.read_object(&blob_oid).unwrap(),
        (ObjectType::Blob, Bytes::from(content.into_bytes()))
    );
}

#[rstest]
#[tokio::test]
async fn index_survives_reopening_the_repository(repository_dir: TempDir) {
    let repository = init_repository(repository_dir.path()).await;
    repository.stage_file("b.txt", b"b").await.unwrap();
    repository
        .stage_file_with_mode("bin/run", b"#!/bin/sh", FileMode::Executable)
        .await
        .unwrap();
    repository.stage_file("a.txt", b"a").await.unwrap();
    drop(repository);

    let reopened = Repository::new(repository_dir.path()).unwrap();
    let index = reopened.index();
    let mut index = index.lock().await;
    index.rehydrate().unwrap();

    assert_eq!(
        index
            .entries()
            .map(|entry| (entry.path.as_str(), entry.mode))
            .collect::<Vec<_>>(),
        vec![
            ("a.txt", FileMode::Regular),
            ("b.txt", FileMode::Regular),
            ("bin/run", FileMode::Executable),
        ]
    );
    assert_eq!(
        index.entry_by_path("a.txt").unwrap().oid,
        encode(ObjectType::Blob, b"a").0
    );
}

#[rstest]
#[tokio::test]
async fn unstaging_removes_only_staged_paths(repository_dir: TempDir) {
    let repository = init_repository(repository_dir.path()).await;
    repository.stage_file("a.txt", b"a").await.unwrap();

    assert!(repository.unstage_file("a.txt").await.unwrap());
    assert!(!repository.unstage_file("a.txt").await.unwrap());
    assert!(!repository.unstage_file("missing.txt").await.unwrap());
    assert!(repository.get_status().await.unwrap().staged.is_empty());
}

#[rstest]
#[tokio::test]
async fn staging_a_file_over_a_directory_replaces_its_children(repository_dir: TempDir) {
    let repository = init_repository(repository_dir.path()).await;
    repository.stage_file("docs/a.md", b"a").await.unwrap();
    repository.stage_file("docs/b.md", b"b").await.unwrap();

    repository.stage_file("docs", b"flat").await.unwrap();

    assert_eq!(
        repository.get_status().await.unwrap().staged,
        BTreeSet::from(["docs".to_string()])
    );
}

#[rstest]
#[case("")]
#[case("/etc/passwd")]
#[case("../outside")]
#[case("a//b")]
#[tokio::test]
async fn invalid_paths_are_rejected(repository_dir: TempDir, #[case] path: &str) {
    let repository = init_repository(repository_dir.path()).await;

    assert!(matches!(
        repository.stage_file(path, b"data").await,
        Err(Error::InvalidPath(_))
    ));
}

#[rstest]
#[tokio::test]
async fn corrupt_index_is_reported(repository_dir: TempDir) {
    let repository = init_repository(repository_dir.path()).await;
    repository.stage_file("a.txt", b"a").await.unwrap();
    std::fs::write(
        repository_dir.path().join(".trove").join("index"),
        b"garbage",
    )
    .unwrap();

    assert!(matches!(
        repository.stage_file("b.txt", b"b").await,
        Err(Error::IndexCorrupt(_))
    ));
    assert!(matches!(
        repository.get_status().await,
        Err(Error::IndexCorrupt(_))
    ));
}

#[rstest]
#[tokio::test]
async fn corrupt_index_is_discarded_when_recovery_is_enabled(repository_dir: TempDir) {
    init_repository(repository_dir.path()).await;
    std::fs::write(
        repository_dir.path().join(".trove").join("index"),
        b"garbage",
    )
    .unwrap();

    let config = RepositoryConfig {
        recover_corrupt_index: true,
        ..RepositoryConfig::default()
    };
    let repository = Repository::with_config(repository_dir.path(), config).unwrap();
    repository.stage_file("b.txt", b"b").await.unwrap();

    assert_eq!(
        repository.get_status().await.unwrap().staged,
        BTreeSet::from(["b.txt".to_string()])
    );
}
