use clap::{Args, Parser, Subcommand, ValueEnum};
use pkgdir_check_core::hasher::DigestAlgorithm;

#[derive(Debug, Parser)]
#[command(name = "pkgdir-check")]
#[command(about = "Check ebuild package directories for file-level problems", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan package directories and report findings
    Scan(ScanArgs),
    /// List every finding kind with its severity
    ListChecks,
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Restrict the scan to `category` or `category/package` targets
    pub targets: Vec<String>,

    /// Repository root (overrides the configured `repo_root`)
    #[arg(long)]
    pub repo: Option<String>,

    /// Report unknown entries in package directories
    #[arg(long)]
    pub strict: bool,

    /// Do not consult git's ignore rules
    #[arg(long)]
    pub no_gitignore: bool,

    /// Extra glob pattern of paths to ignore (repeatable)
    #[arg(long = "ignore", value_name = "GLOB")]
    pub ignore_patterns: Vec<String>,

    /// Digest used to confirm duplicate files
    #[arg(long, value_enum)]
    pub digest: Option<DigestAlgorithm>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Exit non-zero on warnings too
    #[arg(long)]
    pub fail_on_warning: bool,

    /// Draw a progress bar while scanning
    #[arg(long)]
    pub progress: bool,
}
