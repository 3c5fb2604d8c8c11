use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use stoplight_core::{App, Config, DriverRegistry, NdjsonLoader};

#[derive(Debug, Parser)]
#[command(name = "stoplight", version, about = "Sync LeadConnector CRM data to local storage")]
struct Cli {
    /// Config file (defaults to <config dir>/stoplight/config.toml)
    #[arg(long, global = true, env = "STOPLIGHT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List configured sources and registered drivers.
    Sources,

    /// Check credentials and reachability for a source.
    Test {
        /// Source id from the config file.
        source: String,
    },

    /// Fetch every object of a source and append it to the output directory.
    Sync {
        /// Source id from the config file.
        source: String,

        /// Interval start (RFC 3339). Defaults to the driver's refresh window before `--end`.
        #[arg(long)]
        start: Option<DateTime<Utc>>,

        /// Interval end (RFC 3339). Defaults to now.
        #[arg(long)]
        end: Option<DateTime<Utc>>,

        /// Override the output directory from the config file.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

fn build_registry() -> DriverRegistry {
    let mut registry = DriverRegistry::new();
    stoplight_leadconnector::register(&mut registry);
    registry
}

#[tokio::main]
async fn main() -> Result<()> {
    stoplight_core::init_logging()?;
    let cli = Cli::parse();

    let config = Config::load_validated(cli.config.as_deref()).context("Failed to load config")?;
    let app = App::new(config, build_registry());

    let cancel = app.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling in-flight requests");
            cancel.cancel();
        }
    });

    match cli.command {
        Commands::Sources => {
            println!("Drivers: {}", app.registry().source_types().join(", "));
            for source in app.sources() {
                let registered = if app.registry().contains(&source.source_type) {
                    ""
                } else {
                    " (no driver)"
                };
                println!(
                    "  {} [{}{}] -> {}",
                    source.id,
                    source.source_type,
                    registered,
                    source.collection.table_name()
                );
            }
        }
        Commands::Test { source } => {
            app.test_source(&source)
                .await
                .with_context(|| format!("Connection test failed for {}", source))?;
            println!("{}: connection OK", source);
        }
        Commands::Sync {
            source,
            start,
            end,
            output_dir,
        } => {
            let table = app
                .config()
                .source(&source)
                .map(|s| s.collection.table_name().to_string())
                .with_context(|| format!("Unknown source: {}", source))?;
            let root = output_dir.unwrap_or_else(|| app.config().output_dir.clone());
            let loader = NdjsonLoader::new(root, table);

            let used = app
                .sync_source(&source, start, end, &loader)
                .await
                .with_context(|| format!("Sync failed for {}", source))?;
            println!(
                "{}: synced {} into {}",
                source,
                used,
                loader.table_dir().display()
            );
        }
    }

    Ok(())
}
