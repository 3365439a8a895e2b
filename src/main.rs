//! Pageup CLI - Give me a status code
//!
//! Check that HTTP endpoints answer with the status codes you expect.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use pageup::config::RunConfig;
use pageup::description::{DescriptionDocument, merge, parse_documents};
use pageup::{ConsoleReporter, Harness, HarnessOptions};

/// Default run configuration file, read when present
const DEFAULT_CONFIG: &str = "pageup.yaml";

/// Pageup - give me a status code
#[derive(Debug, Parser)]
#[command(name = "pageup")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Request every described endpoint and compare statuses
    Run {
        /// Path to run configuration file
        #[arg(short, long)]
        config: Option<String>,

        /// Description file or glob (repeatable)
        #[arg(short, long = "file")]
        files: Vec<String>,

        /// Timeout for each request (e.g. 500ms, 5s)
        #[arg(short, long, value_parser = humantime::parse_duration)]
        timeout: Option<Duration>,

        /// Maximum requests in flight
        #[arg(long)]
        max_concurrency: Option<usize>,

        /// Report 3xx responses instead of following them
        #[arg(long)]
        no_follow_redirects: bool,

        /// Quick targets as [STATUS=]URL, e.g. 404=example.com/missing
        targets: Vec<String>,
    },

    /// Parse description files and print the resulting mapping
    Validate {
        /// Description files
        #[arg(required = true)]
        files: Vec<String>,
    },

    /// Write a sample description file
    Init {
        /// Output file path
        #[arg(short, long, default_value = "sample.description.json")]
        output: String,

        /// Also write a starter pageup.yaml
        #[arg(long)]
        config: bool,
    },
}

fn setup_logging(verbose: bool, json: bool) {
    let env_filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.json);

    match cli.command {
        Commands::Run {
            config,
            files,
            timeout,
            max_concurrency,
            no_follow_redirects,
            targets,
        } => {
            let mut options = load_config(config.as_deref())?;
            options.files.extend(files);
            options.descriptions = parse_targets(&targets);
            if timeout.is_some() {
                options.timeout = timeout;
            }
            if max_concurrency.is_some() {
                options.max_concurrency = max_concurrency;
            }
            if no_follow_redirects {
                options.follow_redirects = Some(false);
            }
            run_checks(options).await
        }

        Commands::Validate { files } => validate_descriptions(&files),

        Commands::Init { output, config } => {
            init_description(&output)?;
            if config {
                init_config(DEFAULT_CONFIG)?;
            }
            Ok(())
        }
    }
}

/// Load the run configuration, falling back to defaults
///
/// An explicit `--config` must exist; the default file is optional.
fn load_config(path: Option<&str>) -> Result<HarnessOptions> {
    let path = match path {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG).is_file() => DEFAULT_CONFIG,
        None => return Ok(HarnessOptions::default()),
    };

    tracing::info!(config = %path, "Loading configuration");
    let config =
        RunConfig::from_file(path).with_context(|| format!("Failed to load config from {path}"))?;

    Ok(config.to_harness_options())
}

/// Turn `[STATUS=]URL` arguments into descriptions, skipping invalid ones
fn parse_targets(targets: &[String]) -> Vec<DescriptionDocument> {
    targets
        .iter()
        .filter_map(|target| {
            DescriptionDocument::from_shorthand(target).or_else(|| {
                tracing::warn!(target = %target, "Ignoring target, its format is invalid");
                None
            })
        })
        .collect()
}

/// Run every configured check and fail if any did not pass
async fn run_checks(options: HarnessOptions) -> Result<()> {
    if options.files.is_empty() && options.description.is_none() && options.descriptions.is_empty()
    {
        anyhow::bail!("No tests to run");
    }

    let harness = Harness::from_options(options);
    let reporter = ConsoleReporter::new();

    let summary = harness
        .run(&reporter)
        .await
        .context("Run aborted before sending requests")?;

    tracing::info!(
        total = summary.total,
        passed = summary.passed,
        mismatched = summary.mismatched,
        errored = summary.errored,
        "Run complete"
    );

    if reporter.failures() > 0 {
        anyhow::bail!("{} of {} checks FAILED", reporter.failures(), summary.total)
    }

    Ok(())
}

/// Parse description files and print the merged mapping
fn validate_descriptions(files: &[String]) -> Result<()> {
    let mut contents = Vec::with_capacity(files.len());
    for file in files {
        let text = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read description from {file}"))?;
        contents.push(text);
    }

    let documents = parse_documents(&contents).context("Invalid description")?;
    let mapping = merge(&documents).context("Failed to resolve endpoints")?;

    println!("Descriptions are valid!");
    println!();
    println!("Endpoints: {}", mapping.len());

    for (url, status) in mapping.iter() {
        println!("  {status} {url}");
    }

    Ok(())
}

/// Write a sample description file
fn init_description(output: &str) -> Result<()> {
    let sample = DescriptionDocument::new("http://localhost:3000")
        .with_endpoint("/404", 404)
        .with_endpoint("/500", 500)
        .with_ok("/")
        .with_ok("/200");
    let json = sample.to_json().context("Failed to serialize description")?;

    std::fs::write(output, json + "\n")
        .with_context(|| format!("Failed to write description to {output}"))?;

    tracing::info!(path = %output, "Description file created");
    println!("Created {output}");
    println!();
    println!("Edit the file to describe your endpoints, then run:");
    println!("  pageup run --file {output}");

    Ok(())
}

/// Write a starter run configuration
fn init_config(output: &str) -> Result<()> {
    RunConfig::default_config()
        .to_file(output)
        .with_context(|| format!("Failed to write config to {output}"))?;

    tracing::info!(path = %output, "Configuration file created");
    println!("Created {output}");
    println!("  pageup run reads it automatically from the current directory");

    Ok(())
}
