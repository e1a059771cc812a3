//! Spidey main entry point
//!
//! This is the command-line interface for the Spidey focused crawler.

use anyhow::Context;
use clap::Parser;
use spidey::config::{load_config_with_hash, validate, Config};
use spidey::crawler::crawl;
use spidey::output::print_report;
use spidey::url::DomainPolicy;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Spidey: a focused web crawler
///
/// Spidey crawls outward from seed URLs, stays within the configured
/// domains, and saves every page with its resources into a dated,
/// per-domain folder layout.
#[derive(Parser, Debug)]
#[command(name = "spidey")]
#[command(version)]
#[command(about = "A focused web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Extra seed URL to crawl (repeatable)
    #[arg(long = "seed", value_name = "URL")]
    seeds: Vec<String>,

    /// Override the maximum number of pages to crawl
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if apply_overrides(&mut config, &cli) {
        validate(&config).context("Invalid command-line override")?;
    }

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("spidey=info,warn"),
            1 => EnvFilter::new("spidey=debug,info"),
            2 => EnvFilter::new("spidey=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Applies command-line overrides, returning true if anything changed
fn apply_overrides(config: &mut Config, cli: &Cli) -> bool {
    let mut changed = false;

    if !cli.seeds.is_empty() {
        config.scope.seeds.extend(cli.seeds.iter().cloned());
        changed = true;
    }

    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
        changed = true;
    }

    changed
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Spidey Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Workers: {}", config.crawler.effective_workers());
    println!("  Delay: {}ms", config.crawler.delay_ms);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Restrict to seeds: {}", config.crawler.restrict_to_seeds);
    println!("  User agent: {}", config.crawler.user_agent);

    println!("\nOutput:");
    println!("  Root: {}", config.output.root.display());
    println!("  Unique file names: {}", config.output.unique_file_names);
    if config.output.extensions.is_empty() {
        println!("  Resource downloads: disabled");
    } else {
        println!("  Extensions: {}", config.output.extensions.join(", "));
    }

    let policy = DomainPolicy::from_seeds(
        &config.scope.seeds,
        &config.scope.exclude,
        config.crawler.restrict_to_seeds,
    );
    let mut domains: Vec<_> = policy.seed_domains().iter().collect();
    domains.sort();

    println!("\nSeeds ({}):", config.scope.seeds.len());
    for seed in &config.scope.seeds {
        println!("  - {}", seed);
    }

    println!("\nSeed Domains ({}):", domains.len());
    for domain in domains {
        println!("  - {}", domain);
    }

    println!("\nExcluded Domains ({}):", config.scope.exclude.len());
    for pattern in &config.scope.exclude {
        println!("  - {}", pattern);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start crawling with {} seed URLs",
        config.scope.seeds.len()
    );
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Seeds: {}, Excluded: {}, Max pages: {}",
        config.scope.seeds.len(),
        config.scope.exclude.len(),
        config.crawler.max_pages
    );

    match crawl(config).await {
        Ok(report) => {
            tracing::info!("Crawl completed successfully");
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
