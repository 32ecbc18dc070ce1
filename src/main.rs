//! git-annotate - blame, history and repository state as JSON
//!
//! # Usage
//! ```bash
//! git-annotate blame src/lib.rs                # Whole-file blame
//! git-annotate blame src/lib.rs -L 10,20       # Blame for lines 10-20
//! git-annotate log src/lib.rs -n 20 --pages 2  # File history, two pages
//! git-annotate diff src/lib.rs --sha1 HEAD~1   # Diff against a revision
//! git-annotate status                          # Working-tree status
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use git_annotate::models::{GitUri, LineRange};
use git_annotate::{Config, GitService, LogOptions};

/// Query git blame, history and repository state
#[derive(Parser)]
#[command(name = "git-annotate")]
#[command(about = "Blame, history and repository state as JSON", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Any path inside the repository to query
    #[arg(short = 'C', long, default_value = ".", global = true)]
    repo: PathBuf,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// git executable to use instead of searching PATH
    #[arg(long, global = true)]
    git_path: Option<PathBuf>,

    /// Ignore whitespace changes when blaming
    #[arg(short = 'w', long, global = true)]
    ignore_whitespace: bool,

    /// Blame and log files even if .gitignore matches them
    #[arg(long, global = true)]
    no_gitignore: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Blame a file, or a range of its lines
    Blame {
        file: PathBuf,
        /// Revision to blame at
        #[arg(long)]
        sha: Option<String>,
        /// 1-based inclusive line range, `start,end`
        #[arg(short = 'L', value_parser = parse_line_range)]
        lines: Option<LineRange>,
    },
    /// History of a file, or of the repository when no file is given
    Log {
        file: Option<PathBuf>,
        /// Revision or range to start from
        #[arg(long = "ref")]
        reference: Option<String>,
        /// Page size (0 for everything)
        #[arg(short = 'n', long)]
        max_count: Option<usize>,
        /// Number of pages to load
        #[arg(long, default_value = "1")]
        pages: usize,
        #[arg(long)]
        reverse: bool,
    },
    /// Diff of a file, or the changed files when no file is given
    Diff {
        file: Option<PathBuf>,
        #[arg(long)]
        sha1: Option<String>,
        #[arg(long)]
        sha2: Option<String>,
        /// Only the original/changed content of this 1-based line
        #[arg(long)]
        line: Option<usize>,
    },
    /// Working-tree status of the repository or one file
    Status { file: Option<PathBuf> },
    /// Stash entries
    Stashes,
    /// Local and remote branches
    Branches {
        /// Only the checked-out branch
        #[arg(long)]
        current: bool,
    },
    /// Remotes with their fetch/push URLs
    Remotes,
    /// Tags, newest first
    Tags,
    /// HEAD reflog
    Reflog {
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        #[arg(long, default_value = "0")]
        skip: usize,
    },
    /// Entries of a directory at a revision
    Tree {
        path: Option<String>,
        #[arg(long, default_value = "HEAD")]
        sha: String,
    },
    /// Print a file as it is at a revision
    Show {
        file: PathBuf,
        #[arg(long)]
        sha: Option<String>,
        /// Text encoding of the contents (utf-8, latin1, binary)
        #[arg(long)]
        encoding: Option<String>,
    },
}

fn parse_line_range(value: &str) -> Result<LineRange, String> {
    let parse = |n: &str| {
        n.trim()
            .parse::<usize>()
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| format!("invalid line number '{}'", n))
    };
    match value.split_once(',') {
        Some((start, end)) => Ok(LineRange::new(parse(start)? - 1, parse(end)? - 1)),
        None => Ok(LineRange::single(parse(value)? - 1)),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn absolute(path: &Path) -> anyhow::Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("invalid path {}", path.display()))
}

fn file_uri(repo_path: &str, file: &Path, sha: Option<&str>) -> anyhow::Result<GitUri> {
    let file = absolute(file)?;
    Ok(GitUri::new(repo_path, &file.to_string_lossy(), sha))
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if cli.git_path.is_some() {
        config.git_path = cli.git_path.clone();
    }
    if cli.ignore_whitespace {
        config.blame_ignore_whitespace = true;
    }
    if cli.no_gitignore {
        config.respect_gitignore = false;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(&cli)?;
    let service = GitService::discover(config).await?;

    let start = absolute(&cli.repo)?;
    let Some(repo_path) = service.get_repo_path(&start).await? else {
        eprintln!("✗ Not a git repository: {}", start.display());
        std::process::exit(1);
    };

    match cli.command {
        Commands::Blame { file, sha, lines } => {
            let uri = file_uri(&repo_path, &file, sha.as_deref())?;
            match lines {
                Some(range) => print_json(&service.get_blame_for_range(&uri, range).await?)?,
                None => print_json(&service.get_blame_for_file(&uri).await?.as_deref())?,
            }
        }
        Commands::Log {
            file,
            reference,
            max_count,
            pages,
            reverse,
        } => {
            let options = LogOptions {
                reference,
                max_count,
                reverse,
            };
            let first = match file {
                Some(file) => {
                    let uri = file_uri(&repo_path, &file, None)?;
                    service
                        .get_log_for_file(&uri.repo_path, &uri.file_name, &options)
                        .await?
                        .map(|log| log.as_ref().clone())
                }
                None => service.get_log_for_repo(&repo_path, &options).await?,
            };
            let Some(mut log) = first else {
                return print_json(&Option::<()>::None);
            };
            for _ in 1..pages {
                let Some(page) = service.get_next_log_page(&log).await? else {
                    break;
                };
                log.merge(page);
            }
            print_json(&log)?;
        }
        Commands::Diff {
            file,
            sha1,
            sha2,
            line,
        } => match file {
            Some(file) => {
                let uri = file_uri(&repo_path, &file, None)?;
                match line {
                    Some(line) => {
                        let pair = service
                            .get_diff_for_line(&uri, line.saturating_sub(1), sha1.as_deref(), sha2.as_deref())
                            .await?;
                        print_json(&pair)?;
                    }
                    None => {
                        let diff = service
                            .get_diff_for_file(&uri.repo_path, &uri.file_name, sha1.as_deref(), sha2.as_deref())
                            .await?;
                        print_json(&diff.as_deref())?;
                    }
                }
            }
            None => {
                let changes = service
                    .get_diff_status(&repo_path, sha1.as_deref(), sha2.as_deref())
                    .await?;
                print_json(&changes)?;
            }
        },
        Commands::Status { file } => match file {
            Some(file) => {
                let uri = file_uri(&repo_path, &file, None)?;
                print_json(&service.get_status_for_file(&uri.repo_path, &uri.file_name).await?)?;
            }
            None => print_json(&service.get_status_for_repo(&repo_path).await?)?,
        },
        Commands::Stashes => print_json(&service.get_stash_list(&repo_path).await?.as_deref())?,
        Commands::Branches { current } => {
            if current {
                print_json(&service.get_branch(&repo_path).await?)?;
            } else {
                print_json(&service.get_branches(&repo_path).await?)?;
            }
        }
        Commands::Remotes => print_json(&service.get_remotes(&repo_path).await?)?,
        Commands::Tags => print_json(&service.get_tags(&repo_path).await?)?,
        Commands::Reflog { limit, skip } => {
            print_json(&service.get_reflog(&repo_path, limit, skip).await?)?
        }
        Commands::Tree { path, sha } => {
            let entries = service
                .get_tree_for_revision(&repo_path, &sha, path.as_deref())
                .await?;
            print_json(&entries)?;
        }
        Commands::Show {
            file,
            sha,
            encoding,
        } => {
            let uri = file_uri(&repo_path, &file, sha.as_deref())?;
            match service.get_versioned_file_text(&uri, encoding.as_deref()).await? {
                Some(text) => print!("{}", text),
                None => {
                    eprintln!("✗ {} does not exist at that revision", uri);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
