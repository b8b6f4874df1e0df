use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use is_executable::IsExecutable;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use trove::areas::config::{RepositoryConfig, STORE_DIR};
use trove::areas::repository::Repository;
use trove::artifacts::index::entry_mode::FileMode;
use trove::artifacts::objects::commit::Author;
use trove::artifacts::objects::object::ObjectBox;
use trove::artifacts::status::status_info::StatusInfo;
use walkdir::WalkDir;

/// Environment variable holding the log filter directives
const LOG_ENV: &str = "TROVE_LOG";

#[derive(Parser)]
#[command(
    name = "trove",
    version = "0.1.0",
    about = "A minimal content-addressed version control system",
    long_about = "Stores file snapshots as content-addressed objects, stages them in an index \
    and records them as a linear chain of commits on the current branch.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
",
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "init",
        about = "Initialize a new repository",
        long_about = "This command initializes a new repository in the current directory or at the specified path."
    )]
    Init {
        #[arg(index = 1, help = "The path to the repository")]
        path: Option<PathBuf>,
    },
    #[command(
        name = "add",
        about = "Stage file contents",
        long_about = "This command stores the content of the given files as blobs and stages them. \
        Directories are staged recursively."
    )]
    Add {
        #[arg(index = 1, required = true, help = "The files or directories to stage")]
        paths: Vec<PathBuf>,
    },
    #[command(
        name = "rm",
        about = "Unstage files",
        long_about = "This command removes the given paths from the index. The working files are kept."
    )]
    Rm {
        #[arg(long, required = true, help = "Only remove the paths from the index")]
        cached: bool,
        #[arg(index = 1, required = true, help = "The paths to unstage")]
        paths: Vec<PathBuf>,
    },
    #[command(
        name = "commit",
        about = "Create a new commit with the specified message",
        long_about = "This command creates a new commit from the index with the specified commit message. \
        The author is read from TROVE_AUTHOR_NAME, TROVE_AUTHOR_EMAIL and TROVE_AUTHOR_DATE."
    )]
    Commit {
        #[arg(short, long, help = "The commit message")]
        message: String,
    },
    #[command(
        name = "status",
        about = "Show the staged changes",
        long_about = "This command shows the current branch and how the index differs from HEAD."
    )]
    Status,
    #[command(
        name = "log",
        about = "Show the commit history",
        long_about = "This command lists the commits reachable from HEAD, newest first."
    )]
    Log {
        #[arg(long, help = "Show each commit on a single line")]
        oneline: bool,
    },
    #[command(
        name = "cat-file",
        about = "Print the content of an object",
        long_about = "This command prints the content of an object in the repository. \
        It accepts a full or abbreviated object id."
    )]
    CatFile {
        #[arg(short = 'p', long, help = "The object id to print")]
        sha: String,
    },
    #[command(
        name = "hash-object",
        about = "Hash an object and optionally write it to the object database",
        long_about = "This command hashes a file as a blob and can write it to the object database. \
        It requires the path to the file to be specified."
    )]
    HashObject {
        #[arg(short, long, required = false, help = "Write the object to the object database")]
        write: bool,
        #[arg(index = 1)]
        file: PathBuf,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = RepositoryConfig::from_env()?;
    let pwd = std::env::current_dir()?;

    match cli.command {
        Commands::Init { path } => {
            let path = path.map(|path| pwd.join(path)).unwrap_or_else(|| pwd.clone());
            let repository = Repository::with_config(&path, config)?;

            repository.init().await?;
            println!(
                "Initialized empty repository in {}",
                repository.store_path().display()
            );
        }
        Commands::Add { paths } => {
            let repository = open_repository(&pwd, config)?;

            for file in expand_paths(&repository, &pwd, &paths)? {
                let data =
                    std::fs::read(&file).with_context(|| format!("failed to read {}", file.display()))?;
                let mode = if file.is_executable() {
                    FileMode::Executable
                } else {
                    FileMode::Regular
                };

                repository
                    .stage_file_with_mode(&relative_path(&repository, &file)?, &data, mode)
                    .await?;
            }
        }
        Commands::Rm { cached: _, paths } => {
            let repository = open_repository(&pwd, config)?;

            for path in paths {
                let path = relative_path(&repository, &pwd.join(path))?;
                if !repository.unstage_file(&path).await? {
                    bail!("pathspec '{path}' did not match any staged file");
                }
                println!("rm '{path}'");
            }
        }
        Commands::Commit { message } => {
            let repository = open_repository(&pwd, config)?;
            let author = Author::load_from_env()?;
            let message = message.trim().to_string();

            let branch = repository.refs().current_branch_name()?;
            let commit_oid = repository.create_commit(&message, &author).await?;
            let is_root = repository
                .database()
                .parse_object_as_commit(&commit_oid)?
                .parent()
                .is_none();

            println!(
                "[{}{}] {}",
                if is_root {
                    format!("{branch} (root-commit) ")
                } else {
                    format!("{branch} ")
                },
                commit_oid.to_short_oid(),
                message.lines().next().unwrap_or_default()
            );
        }
        Commands::Status => {
            let repository = open_repository(&pwd, config)?;
            let status = repository.get_status().await?;

            print_status(&status);
        }
        Commands::Log { oneline } => {
            let repository = open_repository(&pwd, config)?;
            let mut stdout = std::io::stdout().lock();

            for record in repository.get_log().await? {
                if oneline {
                    writeln!(
                        stdout,
                        "{} {}",
                        record.oid.to_short_oid().yellow(),
                        record.commit.short_message()
                    )?;
                    continue;
                }

                writeln!(stdout, "{}", format!("commit {}", record.oid).yellow())?;
                writeln!(stdout, "Author: {}", record.commit.author().display_name())?;
                writeln!(stdout, "Date:   {}", record.commit.author().readable_timestamp())?;
                writeln!(stdout)?;
                for line in record.commit.message().lines() {
                    writeln!(stdout, "    {line}")?;
                }
                writeln!(stdout)?;
            }
        }
        Commands::CatFile { sha } => {
            let repository = open_repository(&pwd, config)?;
            let object_id = repository.resolve_object_id(&sha)?;

            match repository.database().parse_object(&object_id)? {
                ObjectBox::Blob(blob) => std::io::stdout().write_all(blob.content())?,
                object => println!("{}", object.display()),
            }
        }
        Commands::HashObject { write, file } => {
            let data = std::fs::read(pwd.join(&file))
                .with_context(|| format!("failed to read {}", file.display()))?;

            let object_id = if write {
                open_repository(&pwd, config)?.hash_object(&data, true)?
            } else {
                Repository::with_config(&pwd, config)?.hash_object(&data, false)?
            };
            println!("{object_id}");
        }
    }

    Ok(())
}

/// Open the repository whose store is in `start` or its closest ancestor
fn open_repository(start: &Path, config: RepositoryConfig) -> Result<Repository> {
    let root = start
        .ancestors()
        .find(|dir| dir.join(STORE_DIR).is_dir())
        .with_context(|| format!("not a repository (or any parent up to /): {}", start.display()))?;

    let repository = Repository::with_config(root, config)?;
    repository.ensure_initialized()?;

    Ok(repository)
}

/// Every file under the given paths, skipping the store directory
fn expand_paths(repository: &Repository, pwd: &Path, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let store_path = repository.store_path();
    let mut files = Vec::new();

    for path in paths {
        let path = pwd
            .join(path)
            .canonicalize()
            .with_context(|| format!("pathspec '{}' did not match any files", path.display()))?;

        for entry in WalkDir::new(&path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.path() != &*store_path)
        {
            let entry = entry?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
    }

    Ok(files)
}

/// `/`-separated path of `path` relative to the repository root
fn relative_path(repository: &Repository, path: &Path) -> Result<String> {
    let absolute = match path.canonicalize() {
        Ok(absolute) => absolute,
        // a deleted file can still be unstaged
        Err(_) => path.to_path_buf(),
    };

    let relative = absolute
        .strip_prefix(repository.path())
        .with_context(|| format!("{} is outside repository", path.display()))?;

    Ok(relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}

fn print_status(status: &StatusInfo) {
    println!("On branch {}", status.current_branch);

    if status.head.is_none() {
        println!("\nNo commits yet");
    }

    if status.is_clean() {
        if status.staged.is_empty() {
            println!("\nnothing to commit");
        } else {
            println!("\nnothing to commit, index matches HEAD");
        }
        return;
    }

    println!("\nChanges to be committed:");
    for (path, change) in &status.changes {
        let label = format!("{}:", change.as_str());
        println!("\t{}", format!("{label:<12}{path}").green());
    }
}
