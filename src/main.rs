//! BeDrive command-line client
//!
//! Thin driver over the repository core: sign in, browse the folder tree,
//! upload and download files, and delete items.

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use bedrive_core::{Credentials, FileItem, Folder, HttpApiClient, Repository, DEFAULT_BASE_URL};

/// CLI command
#[derive(Debug)]
enum Command {
    /// Show the signed-in account
    Whoami,
    /// List a folder's entries
    List { path: String },
    /// Create a folder
    Mkdir { path: String },
    /// Upload a local file
    Upload { path: String, file: PathBuf },
    /// Download a file's content
    Download { path: String, dest: PathBuf },
    /// Delete an item
    Remove { path: String },
    /// Show help
    Help,
}

fn print_help() {
    eprintln!(
        r#"bedrive - BeDrive file-storage client

USAGE:
    bedrive whoami
    bedrive ls [path]
    bedrive mkdir <path>
    bedrive upload <folder-path> <local-file>
    bedrive download <path> <local-dest>
    bedrive rm <path>
    bedrive help

COMMANDS:
    whoami     Show the signed-in account and its root folder
    ls         List a folder (the root when no path is given)
    mkdir      Create a folder; the last path segment is the new name
    upload     Upload a local file into a folder
    download   Download a file's content to a local path
    rm         Delete a file or folder
    help       Show this help message

PATHS:
    Paths are slash-separated folder names starting at the root,
    e.g. "Documents/Photos". An empty path or "/" means the root.

ENVIRONMENT:
    BEDRIVE_USER       Account username (required)
    BEDRIVE_PASSWORD   Account password (required)
    BEDRIVE_URL        Server base URL (default: {DEFAULT_BASE_URL})
    RUST_LOG           Log level (trace, debug, info, warn, error)
"#
    );
}

fn parse_args() -> Result<Command> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        return Ok(Command::Help);
    }

    match args[1].as_str() {
        "whoami" => Ok(Command::Whoami),
        "ls" => Ok(Command::List {
            path: args.get(2).cloned().unwrap_or_default(),
        }),
        "mkdir" => {
            let path = args
                .get(2)
                .cloned()
                .ok_or_else(|| anyhow!("Usage: bedrive mkdir <path>"))?;
            Ok(Command::Mkdir { path })
        }
        "upload" => {
            if args.len() < 4 {
                return Err(anyhow!("Usage: bedrive upload <folder-path> <local-file>"));
            }
            Ok(Command::Upload {
                path: args[2].clone(),
                file: PathBuf::from(&args[3]),
            })
        }
        "download" => {
            if args.len() < 4 {
                return Err(anyhow!("Usage: bedrive download <path> <local-dest>"));
            }
            Ok(Command::Download {
                path: args[2].clone(),
                dest: PathBuf::from(&args[3]),
            })
        }
        "rm" => {
            let path = args
                .get(2)
                .cloned()
                .ok_or_else(|| anyhow!("Usage: bedrive rm <path>"))?;
            Ok(Command::Remove { path })
        }
        "help" | "--help" | "-h" => Ok(Command::Help),
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            Ok(Command::Help)
        }
    }
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Walk the folder tree from the root, fetching each segment's listing
async fn resolve_folder(
    repo: &Repository<HttpApiClient>,
    segments: &[&str],
) -> Result<Folder> {
    let mut current = repo.root_folder().clone();
    for segment in segments {
        let cache = repo.fetch_files(&current).await?;
        let next = cache
            .current_items()
            .iter()
            .filter_map(|item| item.as_folder().cloned())
            .find(|folder| folder.name == *segment)
            .ok_or_else(|| anyhow!("No folder named '{}' in '{}'", segment, current.name))?;
        current = next;
    }
    Ok(current)
}

/// Resolve a path to an item inside its parent folder
async fn resolve_item(repo: &Repository<HttpApiClient>, path: &str) -> Result<FileItem> {
    let segments = split_path(path);
    let (name, parents) = segments
        .split_last()
        .ok_or_else(|| anyhow!("A non-root path is required"))?;

    let parent = resolve_folder(repo, parents).await?;
    let cache = repo.fetch_files(&parent).await?;
    cache
        .current_items()
        .into_iter()
        .find(|item| item.name() == *name)
        .ok_or_else(|| anyhow!("No item named '{}' in '{}'", name, parent.name))
}

fn print_listing(items: &[FileItem]) {
    if items.is_empty() {
        println!("(empty)");
        return;
    }
    for item in items {
        let kind = match item {
            FileItem::Folder(_) => "d",
            FileItem::Image(_) => "i",
            FileItem::Text(_) => "t",
        };
        let size = item
            .size()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{kind}  {size:>10}  {}", item.name());
    }
}

async fn run(command: Command, repo: &Repository<HttpApiClient>) -> Result<()> {
    match command {
        Command::Whoami => {
            let user = repo.user();
            println!("{} {} ({})", user.first_name, user.last_name, user.credentials.username);
            println!("root folder: {} ({})", user.root_folder.name, user.root_folder.id);
        }
        Command::List { path } => {
            let folder = resolve_folder(repo, &split_path(&path)).await?;
            let cache = repo.fetch_files(&folder).await?;
            print_listing(&cache.current_items());
        }
        Command::Mkdir { path } => {
            let segments = split_path(&path);
            let (name, parents) = segments
                .split_last()
                .ok_or_else(|| anyhow!("A folder name is required"))?;
            let parent = resolve_folder(repo, parents).await?;
            let folder = repo.create_folder(name, &parent).await?;
            println!("created folder '{}' ({})", folder.name, folder.id);
        }
        Command::Upload { path, file } => {
            let parent = resolve_folder(repo, &split_path(&path)).await?;
            let name = file
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| anyhow!("Local file has no usable name"))?
                .to_string();
            let data = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let item = repo.create_data_item(&parent, &name, data).await?;
            println!("uploaded '{}' ({})", item.name(), item.id());
        }
        Command::Download { path, dest } => {
            let item = resolve_item(repo, &path).await?;
            let data = repo.download_data(&item).await?;
            std::fs::write(&dest, data.as_slice())
                .with_context(|| format!("Failed to write {}", dest.display()))?;
            println!("downloaded '{}' ({} bytes)", item.name(), data.len());
        }
        Command::Remove { path } => {
            let item = resolve_item(repo, &path).await?;
            repo.delete_item(&item).await?;
            println!("deleted '{}'", item.name());
        }
        Command::Help => print_help(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let log_level = env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(Level::WARN);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let command = match parse_args() {
        Ok(Command::Help) => {
            print_help();
            return Ok(());
        }
        Ok(cmd) => cmd,
        Err(e) => {
            eprintln!("Error: {e}");
            print_help();
            std::process::exit(1);
        }
    };

    let username = env::var("BEDRIVE_USER").context("BEDRIVE_USER is not set")?;
    let password = env::var("BEDRIVE_PASSWORD").context("BEDRIVE_PASSWORD is not set")?;
    let base_url = env::var("BEDRIVE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

    let credentials = Credentials::new(username, password);
    let api = HttpApiClient::with_base_url(&base_url, credentials.clone())?;
    let repo = Repository::sign_in(api, credentials).await?;
    info!(server = %base_url, "Session started");

    let result = run(command, &repo).await;
    repo.end_session();
    result
}
