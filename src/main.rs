use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use diffmap::config::Config;
use diffmap::diff::{self, ContentMode, DiffHunk, DiffSide};
use diffmap::github::{ChangedFile, ReviewComment};
use diffmap::source::{self, GitContentFetcher};

#[derive(Parser, Debug)]
#[command(name = "diffmap")]
#[command(about = "Parse review patches and map comment positions between diffs")]
#[command(version)]
struct Args {
    /// Config file (default: ~/.config/diffmap/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Repository used to read base file contents
    #[arg(long, global = true)]
    workdir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Input files may be given as `-` to read stdin
#[derive(Subcommand, Debug)]
enum Command {
    /// Print the parsed hunks of a patch as JSON
    Parse { patch: PathBuf },

    /// Print the head file content described by a patch
    Reconstruct {
        patch: PathBuf,

        /// Base file the patch applies to
        #[arg(long)]
        original: Option<PathBuf>,
    },

    /// Resolve review comments (JSON array) to head file lines
    MapComments {
        #[arg(long)]
        patch: PathBuf,

        #[arg(long)]
        comments: PathBuf,

        /// Diff from the pull request head to the working tree
        #[arg(long)]
        local: Option<PathBuf>,
    },

    /// Print the diff position of a file line
    Position {
        #[arg(long)]
        patch: PathBuf,

        #[arg(long)]
        line: u32,

        /// Diff from the pull request head to the working tree
        #[arg(long)]
        local: Option<PathBuf>,

        /// Look the line up in the base file instead of the head file
        #[arg(long)]
        base: bool,
    },

    /// Resolve base/head contents for changed files (JSON array)
    Contents {
        #[arg(long)]
        files: PathBuf,

        /// Base revision the patches were computed against
        #[arg(long)]
        revision: String,

        /// Use only the patch text, never read the repository
        #[arg(long)]
        fast: bool,
    },

    /// Split `git diff` output into per-file patches
    Split { diff: PathBuf },
}

#[derive(Serialize)]
struct ResolvedFile<'a> {
    filename: &'a str,
    #[serde(flatten)]
    contents: source::FileContents,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    init_tracing(&config);
    debug!(?config, "loaded config");

    match args.command {
        Command::Parse { patch } => {
            let patch = diff::Patch::parse(&read_input(&patch)?);
            print_json(&patch)
        }
        Command::Reconstruct { patch, original } => {
            let original = original.as_deref().map(read_input).transpose()?;
            let result = diff::reconstruct_content(original.as_deref(), &read_input(&patch)?);
            if result.is_partial {
                warn!("original content not given, output only covers the changed regions");
            }
            print!("{}", result.content);
            Ok(())
        }
        Command::MapComments {
            patch,
            comments,
            local,
        } => {
            let hunks = diff::parse_patch(&read_input(&patch)?);
            let local_hunks = read_local_hunks(local.as_deref())?;
            let comments: Vec<ReviewComment> = serde_json::from_str(&read_input(&comments)?)
                .context("Failed to parse review comments")?;
            print_json(&diff::map_comments_to_head(&hunks, &local_hunks, &comments))
        }
        Command::Position {
            patch,
            line,
            local,
            base,
        } => {
            let hunks = diff::parse_patch(&read_input(&patch)?);
            let local_hunks = read_local_hunks(local.as_deref())?;
            let side = if base { DiffSide::Base } else { DiffSide::Head };
            match diff::map_head_line_to_diff_hunk_position(&hunks, &local_hunks, line, side) {
                Some(position) => {
                    println!("{}", position);
                    Ok(())
                }
                None => bail!("line {} not found in patch", line),
            }
        }
        Command::Contents {
            files,
            revision,
            fast,
        } => {
            let files: Vec<ChangedFile> = serde_json::from_str(&read_input(&files)?)
                .context("Failed to parse changed files")?;
            let mode = if fast {
                ContentMode::Fast
            } else {
                config.content.mode
            };
            let fetcher = GitContentFetcher::new(args.workdir.or(config.git.working_dir));
            let contents = source::resolve_all(&fetcher, &files, &revision, mode).await;
            let resolved: Vec<ResolvedFile> = files
                .iter()
                .zip(contents)
                .map(|(file, contents)| ResolvedFile {
                    filename: &file.filename,
                    contents,
                })
                .collect();
            print_json(&resolved)
        }
        Command::Split { diff: unified } => {
            let files = diff::split_unified_diff(&read_input(&unified)?);
            print_json(&files)
        }
    }
}

fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        return io::read_to_string(io::stdin()).context("Failed to read stdin");
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn read_local_hunks(path: Option<&Path>) -> Result<Vec<DiffHunk>> {
    Ok(path
        .map(read_input)
        .transpose()?
        .map(|patch| diff::parse_patch(&patch))
        .unwrap_or_default())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
