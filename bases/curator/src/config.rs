// bases/curator/src/config.rs
use clap::Parser;
use std::path::PathBuf;

/// Whether archiving actually moves files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Print the planned moves, touch nothing.
    DryRun,
    /// Move albums into the archive.
    Apply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text { simple: bool },
    Json,
}

/// Curator configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub library_path: PathBuf,
    pub archive_root: PathBuf,
    pub execution_mode: ExecutionMode,
    /// Archive on a background worker instead of the calling thread.
    pub threaded: bool,
    pub queue_capacity: usize,
    pub cache_file: Option<PathBuf>,
    pub releases_file: Option<PathBuf>,
    pub output: OutputFormat,
}

/// Audio archive curator - reconcile tags into albums and archive them
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the directory holding the files to catalog
    pub library_path: PathBuf,

    /// Root of the canonical archive
    #[arg(short, long)]
    pub archive_root: PathBuf,

    /// Actually move albums into the archive
    ///
    /// By default curator only prints where every file would go.
    #[arg(long)]
    pub apply: bool,

    /// Check mode (dry run), the default
    #[arg(long, conflicts_with = "apply")]
    pub check: bool,

    /// Archive on a background worker thread
    #[arg(short, long)]
    pub threaded: bool,

    /// Albums that may wait in the archive queue at once
    #[arg(long, default_value_t = 16)]
    pub queue_capacity: usize,

    /// Remember the files of archived albums here and skip directories
    /// with no changes on later runs
    #[arg(long)]
    pub cache_file: Option<PathBuf>,

    /// JSON file of known releases to match albums against
    #[arg(long)]
    pub releases: Option<PathBuf>,

    /// Print albums as JSON
    #[arg(long)]
    pub json: bool,

    /// Compact album listing
    #[arg(short, long, conflicts_with = "json")]
    pub simple: bool,
}

impl Config {
    pub fn from_args(args: CliArgs) -> Self {
        let execution_mode = if args.apply {
            ExecutionMode::Apply
        } else {
            ExecutionMode::DryRun
        };

        let output = if args.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text {
                simple: args.simple,
            }
        };

        Self {
            library_path: args.library_path,
            archive_root: args.archive_root,
            execution_mode,
            threaded: args.threaded,
            queue_capacity: args.queue_capacity.max(1),
            cache_file: args.cache_file,
            releases_file: args.releases,
            output,
        }
    }

    pub fn is_check_mode(&self) -> bool {
        self.execution_mode == ExecutionMode::DryRun
    }

    pub fn is_apply_mode(&self) -> bool {
        self.execution_mode == ExecutionMode::Apply
    }
}
