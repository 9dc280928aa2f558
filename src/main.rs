//! reelvibe CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use reelvibe::{
    commands::{
        cmd_ingest, cmd_init, cmd_rank, cmd_serve, cmd_status, print_ingest_report,
        print_rank_result, print_status,
    },
    config::Config,
    error::Result,
};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "reelvibe")]
#[command(version, about = "Movie recommendations from community vibes", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize reelvibe configuration and suggestion store
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Ingest configured feeds into the suggestion store
    Ingest,

    /// Start the catalog HTTP service
    Serve,

    /// Rank catalog items for a query (or show the default ranking)
    Rank {
        /// The search query; omit for the default ranking
        query: Option<String>,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show system status
    Status,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    // Init doesn't need an existing config.
    if let Commands::Init { force } = &cli.command {
        let force = *force;
        let base_dir = cli.config.clone().and_then(|path| {
            if path.extension().map_or(false, |e| e == "toml") {
                path.parent().map(PathBuf::from)
            } else {
                Some(path)
            }
        });
        let config = cmd_init(base_dir, force).await?;
        println!("✓ reelvibe initialized");
        println!("  Config: {}", config.paths.config_file.display());
        println!("\nNext steps:");
        println!("  1. Place the reference catalog at {}", config.paths.catalog_db_file.display());
        println!("  2. Start an embedding backend and point REELVIBE_EMBEDDING_BACKEND_URL at it");
        println!("  3. Populate the store: reelvibe ingest");
        return Ok(());
    }

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        generate(*shell, &mut cmd, "reelvibe", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Init { .. } | Commands::Completions { .. } => unreachable!(),

        Commands::Ingest => {
            let report = cmd_ingest(&config).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_ingest_report(&report);
            }
        }

        Commands::Serve => {
            cmd_serve(&config).await?;
        }

        Commands::Rank { query, limit } => {
            let result = cmd_rank(&config, query, limit).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_rank_result(&result);
            }
        }

        Commands::Status => {
            let report = cmd_status(&config).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_status(&report);
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(Config::default_config_path);

    if !config_path.exists() {
        eprintln!(
            "Config file not found: {}\nRun 'reelvibe init' first.",
            config_path.display()
        );
        std::process::exit(1);
    }

    Config::load(&config_path)
}
