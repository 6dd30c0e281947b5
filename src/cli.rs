use std::path::PathBuf;

use clap::Parser;

use crate::config::CliSettings;

#[derive(Parser, Debug)]
#[command(
    name = "license-walk",
    about = "Identify and classify the license of every transitive dependency",
    version
)]
pub struct Cli {
    /// Root package paths or patterns to walk (passed to `go list`)
    #[arg(required = true, value_name = "PACKAGE")]
    pub roots: Vec<String>,

    /// Directory to run `go list` in
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Read a captured `go list -e -json -deps` listing instead of running `go list`
    #[arg(long, value_name = "FILE")]
    pub listing: Option<PathBuf>,

    /// Config file
    /// [default: ./.license-walk/config.toml, fallback ~/.config/license-walk/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory containing the reference license corpus (index.toml)
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// Minimum confidence required in order to positively identify a license [default: 0.9]
    #[arg(long = "confidence-threshold", value_name = "FRACTION")]
    pub confidence_threshold: Option<f64>,

    /// License type override for one package, as <import path>=<type> (repeatable)
    #[arg(long = "override", value_name = "PATH=TYPE")]
    pub overrides: Vec<String>,

    /// License types that fail the check (repeatable) [default: Forbidden]
    #[arg(long = "disallow", value_name = "TYPE")]
    pub disallowed: Vec<String>,

    /// Maximum number of packages resolved concurrently [default: number of CPUs]
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Give up after this many seconds and report what finished
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub report: ReportFormat,

    /// Show all packages (not just disallowed/unresolved) and debug logs
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print summary line
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
}

impl Cli {
    /// The subset of arguments that feed [`Settings`](crate::config::Settings).
    pub fn settings(&self) -> CliSettings {
        CliSettings {
            confidence_threshold: self.confidence_threshold,
            corpus: self.corpus.clone(),
            jobs: self.jobs,
            timeout_secs: self.timeout,
            overrides: self.overrides.clone(),
            disallowed: self.disallowed.clone(),
        }
    }
}
