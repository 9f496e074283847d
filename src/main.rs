//! Sitegraph main entry point
//!
//! Command-line interface for generating and observing site maps.

use clap::{Parser, Subcommand};
use sitegraph::config::{load_tuning, validate, validate_seed_url, CrawlConfig, TuningConfig};
use sitegraph::crawler::generate_site_map;
use sitegraph::output::Observer;
use sitegraph::storage::{PageFilter, SqliteStorage, StoredPage};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Sitegraph: map a site's internal link graph
///
/// Crawls a web site starting from a seed URL, discovers hyperlinks up to a
/// configured depth, and records every visited page's title, raw HTML, and
/// outbound links in SQLite.
#[derive(Parser, Debug)]
#[command(name = "sitegraph")]
#[command(version)]
#[command(about = "Map a site's internal link graph", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the site map of the entered URL
    Generate {
        /// The URL to crawl for hyperlinks
        url: String,

        /// Link-expansion levels beyond the seed (0 = seed only)
        #[arg(short, long, default_value_t = 1)]
        depth: u32,

        /// The limit of concurrent requests
        #[arg(short = 'C', long = "concurrent", default_value_t = 6)]
        concurrency: usize,

        /// Follow links that leave the seed host
        #[arg(long)]
        allow_external: bool,

        /// Path to the SQLite database file
        #[arg(long, default_value = "sitegraph.db")]
        database: PathBuf,

        /// Optional TOML tuning file (HTTP timeouts, retry budgets, queue)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Observe stored pages
    Observe {
        /// Show pages related to this URL's site
        url: Option<String>,

        /// Site scheme (used with --host instead of a URL)
        #[arg(short, long)]
        scheme: Option<String>,

        /// Hostname substring to match
        #[arg(long = "host", visible_alias = "hostname")]
        hostname: Option<String>,

        /// Site port
        #[arg(short, long)]
        port: Option<u16>,

        /// The limit of rows to show (0 means no limit)
        #[arg(short, long, default_value_t = 50)]
        limit: u32,

        /// Path to the SQLite database file
        #[arg(long, default_value = "sitegraph.db")]
        database: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Generate {
            url,
            depth,
            concurrency,
            allow_external,
            database,
            config,
        } => {
            handle_generate(url, depth, concurrency, allow_external, database, config).await?;
        }
        Command::Observe {
            url,
            scheme,
            hostname,
            port,
            limit,
            database,
        } => {
            handle_observe(url, scheme, hostname, port, limit, database)?;
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitegraph=info,warn"),
            1 => EnvFilter::new("sitegraph=debug,info"),
            2 => EnvFilter::new("sitegraph=trace,debug"),
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

/// Handles the `generate` subcommand: runs a full crawl
async fn handle_generate(
    url: String,
    depth: u32,
    concurrency: usize,
    allow_external: bool,
    database: PathBuf,
    config_path: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let seed = validate_seed_url(&url)?;

    let tuning = match &config_path {
        Some(path) => {
            tracing::info!("Loading tuning from: {}", path.display());
            load_tuning(path)?
        }
        None => TuningConfig::default(),
    };

    let config = CrawlConfig::new(depth, concurrency, allow_external, database, tuning);
    validate(&config)?;

    tracing::info!(
        seed = %seed,
        depth = config.depth,
        concurrency = config.concurrency,
        allow_external = config.allow_external,
        "Starting crawl"
    );

    match generate_site_map(&config, seed.as_str()).await {
        Ok(()) => {
            tracing::info!("Crawl completed successfully");
            Ok(())
        }
        Err(e) => {
            tracing::error!(seed = %seed, depth = config.depth, "Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the `observe` subcommand: lists stored pages
fn handle_observe(
    url: Option<String>,
    scheme: Option<String>,
    hostname: Option<String>,
    port: Option<u16>,
    limit: u32,
    database: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = SqliteStorage::new(&database)?;
    let observer = Observer::new(&store);

    let pages = if let Some(url) = url {
        observer.related_pages_for_url(&url, limit)?
    } else if let (Some(scheme), Some(hostname)) = (scheme, hostname) {
        observer.related_pages(&PageFilter {
            scheme,
            hostname,
            port,
            limit,
        })?
    } else {
        return Err(
            "neither a URL nor a scheme with a hostname was passed in the parameters".into(),
        );
    };

    print_pages(&pages);
    Ok(())
}

fn print_pages(pages: &[StoredPage]) {
    if pages.is_empty() {
        println!("No stored pages matched");
        return;
    }

    for (i, page) in pages.iter().enumerate() {
        println!("{:4}. {} : {}", i + 1, page.url(), page.title);
    }
}
