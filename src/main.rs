//! Haven - SMS mental-health support companion
//!
//! Binary entry point: configuration, component wiring, and the periodic
//! fallback-tier sweep. Inbound webhook intake is mounted by the
//! deployment layer, which hands (user, text) pairs to the orchestrator.

#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use haven_core::{HavenConfig, Orchestrator};
use haven_llm::{AnthropicConfig, AnthropicGenerator};
use haven_sms::{TwilioConfig, TwilioTransport};
use haven_store::{RedisCache, SessionManager, SqliteStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "haven", version, about = "SMS mental-health support companion")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the service (default)
    Serve,
    /// Validate configuration and adapters, then exit
    Check,
    /// Push one message through the pipeline and print the outcome
    Simulate {
        /// Sender phone number (E.164)
        #[arg(long)]
        from: String,
        /// Message text
        #[arg(long)]
        message: String,
    },
}

struct Components {
    sessions: Arc<SessionManager>,
    orchestrator: Arc<Orchestrator>,
    config: HavenConfig,
}

async fn build_components() -> Result<Components> {
    let config = HavenConfig::load().context("loading configuration")?;

    let cache = Arc::new(RedisCache::new(&config.redis_url).context("connecting to Redis")?);
    let durable = Arc::new(
        SqliteStore::new(&config.database_path)
            .await
            .context("opening the durable store")?,
    );
    let sessions = Arc::new(
        SessionManager::new(cache, durable.clone()).with_ttl_seconds(config.session_ttl_seconds),
    );

    let generator = Arc::new(
        AnthropicGenerator::new(AnthropicConfig::from_env().context("generator credentials")?)
            .context("building the generator client")?,
    );
    let transport = Arc::new(
        TwilioTransport::new(TwilioConfig::from_env().context("transport credentials")?)
            .context("building the transport client")?,
    );

    let orchestrator = Arc::new(
        Orchestrator::new(sessions.clone(), durable, generator, transport)
            .with_max_inbound_chars(config.max_inbound_chars),
    );

    Ok(Components {
        sessions,
        orchestrator,
        config,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "haven=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Check => {
            let _ = build_components().await?;
            info!("configuration and adapters look good");
        }
        Command::Simulate { from, message } => {
            let components = build_components().await?;
            let outcome = components.orchestrator.handle(&from, &message).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Serve => {
            let components = build_components().await?;
            info!("Haven v{} ready", env!("CARGO_PKG_VERSION"));

            let sweep_sessions = components.sessions.clone();
            let sweep_interval = components.config.sweep_interval_seconds;
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(Duration::from_secs(sweep_interval));
                loop {
                    interval.tick().await;
                    let removed = sweep_sessions.cleanup_sessions().await;
                    if removed > 0 {
                        info!(removed = removed, "fallback sessions swept");
                    }
                }
            });

            // The webhook layer borrows the orchestrator for the life of
            // the process; keep it alive until shutdown.
            let _orchestrator = components.orchestrator;

            tokio::signal::ctrl_c()
                .await
                .context("waiting for shutdown signal")?;
            warn!("shutdown signal received, draining");
        }
    }

    Ok(())
}
