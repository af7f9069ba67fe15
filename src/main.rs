//! docmirror - Make one document tree identical to another.
//!
//! Usage:
//!   docmirror <SOURCE> <DEST>    Mirror SOURCE onto DEST
//!   docmirror ls <LOCATOR>       List a directory
//!   docmirror stat <LOCATOR>     Show metadata of a file
//!   docmirror --help             Show help

mod settings;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail};
use tracing::Level;

use docmirror_core::{CompareMode, DocumentProvider, Entry, Locator, MirrorConfig};
use docmirror_store::{LocalProvider, TermuxSafProvider};
use docmirror_sync::Reconciler;

use crate::settings::{ProviderKind, Settings};

#[derive(Parser)]
#[command(
    name = "docmirror",
    version,
    about = "Mirror one document tree onto another",
    long_about = "docmirror makes a destination tree identical to a source tree.\n\n\
                  Entries missing from the destination are created, entries absent \
                  from the source are removed, and files are overwritten unless the \
                  compare mode says they are already current.",
    args_conflicts_with_subcommands = true,
    subcommand_negates_reqs = true
)]
struct Cli {
    /// Root of the tree to copy from
    #[arg(required = true)]
    source: Option<String>,

    /// Root of the tree to make identical to the source
    #[arg(required = true)]
    destination: Option<String>,

    /// How to compare files present on both sides
    #[arg(short, long)]
    compare: Option<CompareArg>,

    /// Store the locators refer to
    #[arg(short, long, global = true)]
    provider: Option<ProviderKind>,

    /// Directory containing the termux-saf tools (defaults to PATH lookup)
    #[arg(long, global = true)]
    termux_bin_dir: Option<PathBuf>,

    /// Settings file (defaults to <config dir>/docmirror/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log every skipped file and listing
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List the children of a directory
    Ls {
        /// Directory to list
        locator: String,

        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show length and modification time of a file
    Stat {
        /// File to inspect
        locator: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CompareArg {
    /// Skip when lengths match and the source is newer
    Heuristic,
    /// Skip when content digests match
    Checksum,
    /// Always rewrite existing files
    Always,
}

impl From<CompareArg> for CompareMode {
    fn from(arg: CompareArg) -> Self {
        match arg {
            CompareArg::Heuristic => CompareMode::Heuristic,
            CompareArg::Checksum => CompareMode::Checksum,
            CompareArg::Always => CompareMode::Always,
        }
    }
}

/// The store selected for this invocation.
enum Store {
    Termux(TermuxSafProvider),
    Local(LocalProvider),
}

impl Store {
    fn new(kind: ProviderKind, termux_bin_dir: Option<PathBuf>) -> Self {
        match kind {
            ProviderKind::Termux => {
                let provider = match termux_bin_dir {
                    Some(dir) => TermuxSafProvider::new().with_bin_dir(dir),
                    None => TermuxSafProvider::new(),
                };
                Self::Termux(provider)
            }
            ProviderKind::Local => Self::Local(LocalProvider::new()),
        }
    }

    fn provider(&self) -> &dyn DocumentProvider {
        match self {
            Self::Termux(provider) => provider,
            Self::Local(provider) => provider,
        }
    }

    /// Resolve a locator naming a directory.
    fn directory(&self, locator: &Locator, name: &str) -> Result<Entry> {
        match self {
            Self::Termux(provider) => Ok(provider.root(locator.clone(), name)),
            Self::Local(provider) => provider
                .open_root(locator.as_str())
                .wrap_err_with(|| format!("Cannot open {locator}")),
        }
    }

    /// Resolve a locator naming a file.
    fn file(&self, locator: &Locator) -> Result<Entry> {
        match self {
            Self::Termux(_) => Ok(Entry::file(locator.clone(), locator.as_str())),
            Self::Local(provider) => provider
                .open(locator.as_str())
                .wrap_err_with(|| format!("Cannot open {locator}")),
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let settings = Settings::load(cli.config.as_deref())?;
    let store = Store::new(
        settings.provider_or(cli.provider),
        settings.termux_bin_dir_or(cli.termux_bin_dir),
    );

    match cli.command {
        Some(Command::Ls { locator, json }) => {
            run_ls(&store, &Locator::new(locator), json)?;
        }
        Some(Command::Stat { locator }) => {
            run_stat(&store, &Locator::new(locator))?;
        }
        None => {
            let (Some(source), Some(destination)) = (cli.source, cli.destination) else {
                bail!("Both SOURCE and DEST are required");
            };
            let config = MirrorConfig::builder()
                .source(source)
                .destination(destination)
                .compare(settings.compare_or(cli.compare.map(CompareMode::from)))
                .build()
                .wrap_err("Invalid mirror configuration")?;
            run_mirror(&store, &config)?;
        }
    }

    Ok(())
}

/// Send log output to stderr so stdout stays clean for listings and JSON.
fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        Level::DEBUG
    } else if quiet {
        Level::WARN
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

/// Mirror the configured source onto the configured destination.
fn run_mirror(store: &Store, config: &MirrorConfig) -> Result<()> {
    let source = store.directory(&config.source, "<source_root>")?;
    let destination = store.directory(&config.destination, "<dest_root>")?;

    eprintln!(
        "Mirroring {} -> {} (compare: {})...",
        config.source, config.destination, config.compare
    );
    let started = Instant::now();

    let report = Reconciler::new(store.provider())
        .with_compare(config.compare)
        .reconcile(source, destination)
        .wrap_err("Mirror failed")?;

    println!("{}", report.summary());
    eprintln!("Finished in {:.2}s", started.elapsed().as_secs_f64());
    Ok(())
}

/// Print the children of a directory.
fn run_ls(store: &Store, locator: &Locator, json: bool) -> Result<()> {
    let dir = store.directory(locator, locator.as_str())?;
    let entries = store
        .provider()
        .list(&dir)
        .wrap_err_with(|| format!("Cannot list {locator}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for entry in &entries {
        let size = match entry.length {
            Some(length) if entry.is_file() => format_size(length),
            _ => "-".to_string(),
        };
        let modified = entry
            .modified_at()
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<4} {:>10}  {:<16}  {}",
            entry.kind.to_string(),
            size,
            modified,
            entry.name
        );
    }
    eprintln!("{} entries", entries.len());
    Ok(())
}

/// Print a file's metadata as JSON.
fn run_stat(store: &Store, locator: &Locator) -> Result<()> {
    let file = store.file(locator)?;
    let stat = store
        .provider()
        .stat(&file)
        .wrap_err_with(|| format!("Cannot stat {locator}"))?;
    println!("{}", serde_json::to_string_pretty(&stat)?);
    Ok(())
}

fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
