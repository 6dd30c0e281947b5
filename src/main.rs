//! `license-walk` — find and classify the license of every transitive dependency.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]) and set up logging ([`logging`]).
//! 2. Load config and validate threshold and overrides into [`config::Settings`].
//! 3. Load the reference corpus ([`license::corpus`]).
//! 4. Load the import graph ([`graph::go_list`]) and walk it from the roots ([`graph::walker`]).
//! 5. Locate, classify, and apply overrides per package ([`aggregate`]).
//! 6. Render the report ([`report`]) or print it as JSON.
//! 7. Exit `0`, or `1` when a package has a disallowed license type.

mod aggregate;
mod cli;
mod config;
mod error;
mod graph;
mod license;
mod logging;
mod models;
mod report;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::time::Instant;
use tracing::info;

use aggregate::Aggregator;
use cli::{Cli, ReportFormat};
use config::{load_config, Settings};
use graph::go_list::GoListLoader;
use graph::walker::walk;
use license::classifier::Classifier;
use license::corpus::Corpus;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose);

    let dir = cli.dir.canonicalize().unwrap_or_else(|_| cli.dir.clone());

    // Everything configurable is validated before the graph is touched.
    let config = load_config(&dir, cli.config.as_deref())?;
    let settings = Settings::resolve(config, cli.settings())?;

    let corpus = Corpus::load(&settings.corpus).context("loading license corpus")?;
    let classifier = Classifier::new(corpus, settings.confidence_threshold);

    // A captured listing is addressed by exact import paths; a live `go list`
    // expands the arguments as patterns first.
    let (loader, roots) = match &cli.listing {
        Some(listing) => (GoListLoader::read(listing)?, cli.roots.clone()),
        None => {
            let loader = GoListLoader::run(&dir, &cli.roots)?;
            let roots = loader.roots().to_vec();
            (loader, roots)
        }
    };
    let entries = walk(&loader, &roots)?;

    let show_progress = !cli.quiet && matches!(cli.report, ReportFormat::Terminal);
    let mut aggregator = Aggregator::new(settings.overrides.clone(), classifier, settings.jobs)?;
    if show_progress {
        let pb = ProgressBar::new(entries.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )?
                .progress_chars("#>-"),
        );
        aggregator = aggregator.with_progress(pb);
    }

    let report = match settings.timeout {
        Some(timeout) => {
            aggregator
                .run_until(entries, Some(Instant::now() + timeout))
                .await
        }
        None => aggregator.run(entries).await,
    };

    match cli.report {
        ReportFormat::Terminal => {
            report::terminal::render(&report, &settings.disallowed, cli.verbose, cli.quiet);
        }
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    let violations = report.matching(&settings.disallowed).count();
    if violations > 0 {
        info!(violations, "disallowed licenses found");
        std::process::exit(1);
    }

    Ok(())
}
