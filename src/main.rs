//! llmroute - Staleness-aware provider routing for LLM clients
//!
//! Command-line companion to the library. It validates config files and
//! lists provider key sources; the health command loads every catalog
//! once and prints the freshness report.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use llmroute::config::KeySource;
use llmroute::{RouterClient, RouterConfig};

#[derive(Parser)]
#[command(name = "llmroute")]
#[command(about = "Staleness-aware provider routing for LLM clients")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate configuration file
    Check {
        /// Path to configuration file
        #[arg(short, long, default_value = "config.toml")]
        config: String,
    },

    /// Show configured providers and how their keys were resolved
    Providers {
        /// Path to configuration file
        #[arg(short, long, default_value = "config.toml")]
        config: String,
    },

    /// Load all catalogs once and print the data health report
    Health {
        /// Path to configuration file
        #[arg(short, long, default_value = "config.toml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "llmroute=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config } => {
            tracing::info!(config = %config, "Checking configuration");
            let (parsed, key_sources) = RouterConfig::from_file_with_env(&config)?;

            println!("Configuration OK");
            println!(
                "  analysis_api:   {}",
                parsed.analysis_api.as_deref().unwrap_or("(unset)")
            );
            println!("  max_age_hours:  {}", parsed.max_age_hours);
            println!(
                "  hierarchy:      {} > {} > {} > {}",
                parsed.hierarchy.first,
                parsed.hierarchy.second,
                parsed.hierarchy.third,
                parsed.hierarchy.last
            );
            println!("  reasoning:      {}", parsed.reasoning);
            println!("  stale_clean_up: {}", parsed.stale_clean_up);
            println!("  providers:      {}", key_sources.len());
            Ok(())
        }

        Commands::Providers { config } => {
            tracing::info!(config = %config, "Listing providers");
            let (_, key_sources) = RouterConfig::from_file_with_env(&config)?;

            if key_sources.is_empty() {
                println!("No providers configured");
                return Ok(());
            }

            for (name, source) in &key_sources {
                let key_note = match source {
                    KeySource::None => "no key",
                    _ => "key set",
                };
                println!("{:<24} {:<8} [{}]", name, key_note, source);
            }
            Ok(())
        }

        Commands::Health { config } => {
            tracing::info!(config = %config, "Probing catalog health");
            let (parsed, _) = RouterConfig::from_file_with_env(&config)?;
            let client = RouterClient::new(parsed)?;
            client.initialize().await?;

            let health = client.data_health();
            println!("{}", serde_json::to_string_pretty(&health)?);
            Ok(())
        }
    }
}
