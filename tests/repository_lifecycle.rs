use assert_fs::TempDir;
use pretty_assertions::assert_eq;
use rstest::rstest;
use trove::areas::config::RepositoryConfig;
use trove::areas::repository::{Repository, RepositoryState};
use trove::artifacts::branch::branch_name::BranchName;
use trove::artifacts::objects::commit::Author;
use trove::errors::Error;

mod common;

use common::{author, init_repository, repository_dir};

#[rstest]
#[tokio::test]
async fn init_creates_an_empty_repository(repository_dir: TempDir) {
    let repository = Repository::new(repository_dir.path()).unwrap();
    assert_eq!(repository.state().unwrap(), RepositoryState::Uninitialized);

    repository.init().await.unwrap();

    let store = repository_dir.path().join(".trove");
    assert!(store.join("objects").is_dir());
    assert!(store.join("refs").join("heads").is_dir());
    assert_eq!(
        std::fs::read_to_string(store.join("HEAD")).unwrap(),
        "ref: refs/heads/main"
    );
    assert_eq!(repository.refs().resolve_head().unwrap(), None);
    assert_eq!(repository.state().unwrap(), RepositoryState::Empty);
}

#[rstest]
#[tokio::test]
async fn init_uses_the_configured_default_branch(repository_dir: TempDir) {
    let config = RepositoryConfig {
        default_branch: BranchName::try_parse("trunk").unwrap(),
        ..RepositoryConfig::default()
    };
    let repository = Repository::with_config(repository_dir.path(), config).unwrap();

    repository.init().await.unwrap();

    assert_eq!(
        repository.refs().current_branch_name().unwrap(),
        BranchName::try_parse("trunk").unwrap()
    );
}

#[rstest]
#[tokio::test]
async fn reinit_keeps_history_and_index(repository_dir: TempDir, author: Author) {
    let repository = init_repository(repository_dir.path()).await;
    repository.stage_file("a.txt", b"one").await.unwrap();
    let commit_oid = repository.create_commit("first", &author).await.unwrap();

    repository.init().await.unwrap();

    assert_eq!(
        repository.state().unwrap(),
        RepositoryState::HasCommits(commit_oid)
    );
    assert_eq!(repository.get_status().await.unwrap().staged.len(), 1);
}

#[rstest]
#[tokio::test]
async fn operations_on_uninitialized_repository_fail(repository_dir: TempDir, author: Author) {
    let repository = Repository::new(repository_dir.path()).unwrap();

    assert!(matches!(
        repository.stage_file("a.txt", b"one").await,
        Err(Error::RefResolution(_))
    ));
    assert!(matches!(
        repository.create_commit("first", &author).await,
        Err(Error::RefResolution(_))
    ));
    assert!(matches!(
        repository.get_log().await,
        Err(Error::RefResolution(_))
    ));
}

#[rstest]
#[tokio::test]
async fn repositories_in_one_process_are_independent(author: Author) {
    let first_dir = TempDir::new().unwrap();
    let second_dir = TempDir::new().unwrap();
    let first = init_repository(first_dir.path()).await;
    let second = init_repository(second_dir.path()).await;

    first.stage_file("a.txt", b"first").await.unwrap();
    first.create_commit("first", &author).await.unwrap();

    assert_eq!(first.get_log().await.unwrap().len(), 1);
    assert!(second.get_log().await.unwrap().is_empty());
    assert!(second.get_status().await.unwrap().staged.is_empty());
}
