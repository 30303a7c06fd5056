//! # grocer CLI
//!
//! ## Usage
//!
//! ```bash
//! grocer --config ./config/grocer.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `grocer init` | Create the SQLite database and run schema migrations |
//! | `grocer resolve "<term>"` | Best product for a term |
//! | `grocer alternatives "<term>" --exclude <id>` | Best product other than `<id>` |
//! | `grocer top "<term>"` | Ranked products for a term |
//! | `grocer rank "<term>" --file <json>` | Score saved candidates offline |
//! | `grocer rules ["<term>"]` | Show the rules a term is scored with |
//! | `grocer warm <terms>...` | Pre-populate the search cache |
//! | `grocer locations <zip>` | Find store locations near a ZIP code |
//! | `grocer sweep` | Delete expired cache entries and rate windows |
//! | `grocer stats` | Show cache and rate-limit statistics |
//! | `grocer serve` | Start the HTTP server |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use grocer::app::App;
use grocer::{config, logging, migrate, rank, resolve_cmd, server, stats};

/// grocer: rate-limit-safe ingredient to product resolution against a
/// grocery catalog.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/grocer.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "grocer",
    about = "grocer: resolve ingredient terms to grocery catalog products",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/grocer.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Resolve a term to the single best product.
    Resolve {
        /// Free-text ingredient term.
        term: String,

        /// Store location id to search.
        #[arg(long)]
        location: Option<String>,

        /// Query the catalog even if a cached result exists.
        #[arg(long)]
        skip_cache: bool,
    },

    /// Resolve a term to the best product other than an excluded one.
    Alternatives {
        term: String,

        #[arg(long)]
        location: Option<String>,

        /// Product id to skip.
        #[arg(long)]
        exclude: Option<String>,
    },

    /// List the top ranked products for a term.
    Top {
        term: String,

        #[arg(long)]
        location: Option<String>,

        /// Product ids to skip. May be repeated.
        #[arg(long)]
        exclude: Vec<String>,

        #[arg(long, default_value_t = 5)]
        limit: usize,
    },

    /// Score a saved candidate list offline.
    ///
    /// The file holds either a JSON array of candidates or a raw catalog
    /// products response. Prints scores and exclusion reasons.
    Rank {
        term: String,

        #[arg(long)]
        file: PathBuf,
    },

    /// Show the ingredient and category rules a term matches, or list all
    /// ingredient rules when no term is given.
    Rules { term: Option<String> },

    /// Pre-populate the search cache at the lowest queue priority.
    Warm {
        /// Terms to warm.
        terms: Vec<String>,

        /// File with one term per line.
        #[arg(long)]
        file: Option<PathBuf>,

        #[arg(long)]
        location: Option<String>,
    },

    /// Find store locations near a ZIP code.
    Locations {
        zip_code: String,

        #[arg(long, default_value_t = 10)]
        radius: u32,

        #[arg(long, default_value_t = 10)]
        limit: u32,
    },

    /// Delete expired cache entries and rate windows.
    Sweep,

    /// Show cache and rate-limit statistics.
    Stats {
        /// Print as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    logging::init(&cfg.logging);

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Resolve {
            term,
            location,
            skip_cache,
        } => {
            resolve_cmd::run_resolve(cfg, &term, location, skip_cache).await?;
        }
        Commands::Alternatives {
            term,
            location,
            exclude,
        } => {
            resolve_cmd::run_alternatives(cfg, &term, location, exclude).await?;
        }
        Commands::Top {
            term,
            location,
            exclude,
            limit,
        } => {
            resolve_cmd::run_top(cfg, &term, location, exclude, limit).await?;
        }
        Commands::Rank { term, file } => {
            rank::run_rank(&cfg, &term, &file)?;
        }
        Commands::Rules { term } => {
            rank::run_rules(&cfg, term.as_deref())?;
        }
        Commands::Warm {
            terms,
            file,
            location,
        } => {
            resolve_cmd::run_warm(cfg, terms, file.as_deref(), location.as_deref()).await?;
        }
        Commands::Locations {
            zip_code,
            radius,
            limit,
        } => {
            resolve_cmd::run_locations(cfg, &zip_code, radius, limit).await?;
        }
        Commands::Sweep => {
            resolve_cmd::run_sweep(&cfg).await?;
        }
        Commands::Stats { json } => {
            stats::run_stats(&cfg, json).await?;
        }
        Commands::Serve => {
            let app = App::from_config(cfg).await?;
            server::run_server(Arc::new(app)).await?;
        }
    }

    Ok(())
}
