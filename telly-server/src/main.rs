//! # telly server
//!
//! TV metadata service in front of the TMDB API.
//!
//! - **Catalog**: shows, seasons and episodes normalized into PostgreSQL
//! - **Response cache**: Redis backed read-through cache with graceful
//!   degradation when Redis is away
//! - **Origin fallback**: shows and seasons missing locally are served from
//!   TMDB
//! - **Ingestion**: trending and popular feeds imported page by page

use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use sqlx::PgPool;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use telly_config::{Config, ConfigLoad, ConfigLoader};
use telly_core::{Feed, IngestReport, MIGRATOR};
use telly_server::{
    create_app,
    infra::startup::{build_state, connect_database, warm_cache},
    routes,
};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "telly-server")]
#[command(about = "TV metadata server with a read-through cache and origin fallback")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(ClapArgs, Debug, Clone)]
struct ServeArgs {
    /// Path to a TOML configuration file
    #[arg(long, env = "TELLY_CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Server port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long)]
    host: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (the default)
    Serve,
    #[command(subcommand)]
    Db(DbCommand),
    #[command(subcommand)]
    Ingest(IngestCommand),
}

#[derive(Debug, Subcommand)]
enum DbCommand {
    /// Apply database migrations and exit
    Migrate,
}

#[derive(Debug, Subcommand)]
enum IngestCommand {
    /// Import shows listed on trending feed pages
    Trending(PagesArg),
    /// Import shows listed on popular feed pages
    Popular(PagesArg),
    /// Import one show by its TMDB id
    Show { id: i64 },
}

#[derive(ClapArgs, Debug)]
struct PagesArg {
    /// Comma separated page numbers
    #[arg(long, value_delimiter = ',', default_value = "1")]
    pages: Vec<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config(&cli.serve)?;

    match cli.command {
        None | Some(Command::Serve) => run_server(config).await,
        Some(Command::Db(DbCommand::Migrate)) => run_db_migrate(&config).await,
        Some(Command::Ingest(command)) => run_ingest(config, command).await,
    }
}

fn load_config(args: &ServeArgs) -> anyhow::Result<Config> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = args.config.clone() {
        loader = loader.with_config_path(path);
    }
    let ConfigLoad {
        mut config,
        warnings,
    } = loader.load().context("failed to load configuration")?;

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = config.metadata.config_path.as_ref() {
        info!(path = %path.display(), "loaded configuration file");
    }
    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => warn!("{} ({})", warning.message, hint),
            None => warn!("{}", warning.message),
        }
    }

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host.clone() {
        config.server.host = host;
    }
    Ok(config)
}

async fn run_db_migrate(config: &Config) -> anyhow::Result<()> {
    migrated_pool(config).await?;
    Ok(())
}

async fn migrated_pool(config: &Config) -> anyhow::Result<PgPool> {
    let pool = connect_database(config).await?;
    MIGRATOR
        .run(&pool)
        .await
        .context("database migration failed")?;
    info!("Database migrations applied successfully");
    Ok(pool)
}

async fn run_ingest(config: Config, command: IngestCommand) -> anyhow::Result<()> {
    let pool = migrated_pool(&config).await?;
    let state = build_state(config, pool).await?;

    let report = match command {
        IngestCommand::Trending(args) => {
            state.ingest.ingest_feed(Feed::Trending, &args.pages).await?
        }
        IngestCommand::Popular(args) => {
            state.ingest.ingest_feed(Feed::Popular, &args.pages).await?
        }
        IngestCommand::Show { id } => state.ingest.ingest_show(id).await?,
    };
    print_report(&report)
}

fn print_report(report: &IngestReport) -> anyhow::Result<()> {
    for failure in &report.failed {
        error!(show_id = failure.show_id, "{}", failure.error);
    }
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server address")?;

    let pool = migrated_pool(&config).await?;
    let state = build_state(config, pool).await?;
    let app = create_app(state);

    tokio::spawn(warm_cache(app.clone(), routes::warm_paths()));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("telly listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
