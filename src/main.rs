use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use todo_lists::{
    build_router,
    config::{AppConfig, DatabaseBackend},
    models::{ItemParams, TodoListParams},
    notify::BroadcastNotifier,
    repository::{InMemoryRepository, PgRepository, TodoRepository},
    state::AppState,
};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "todo-lists")]
#[command(about = "Multi-list todo service with a JSON API and HTML interface")]
struct Cli {
    /// Overrides APP_HOST
    #[arg(long, global = true)]
    host: Option<String>,
    /// Overrides APP_PORT
    #[arg(long, global = true)]
    port: Option<u16>,
    /// Overrides DATABASE_BACKEND (memory or postgres)
    #[arg(long, global = true)]
    backend: Option<DatabaseBackend>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Default)]
enum Command {
    /// Run the HTTP server (default)
    #[default]
    Serve,
    /// Apply the database schema
    Migrate,
    /// Insert a sample list with a few items
    Seed,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env().context("failed to load application configuration")?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(backend) = cli.backend {
        config.database_backend = backend;
    }

    let repository = connect(&config).await?;
    repository
        .init()
        .await
        .context("failed to initialize schema")?;

    match cli.command.unwrap_or_default() {
        Command::Serve => serve(&config, repository).await,
        Command::Migrate => {
            info!("migrations applied successfully");
            Ok(())
        }
        Command::Seed => seed(&config, repository).await,
    }
}

async fn connect(config: &AppConfig) -> Result<Arc<dyn TodoRepository>> {
    match config.database_backend {
        DatabaseBackend::Memory => {
            info!("database backend: memory");
            Ok(Arc::new(InMemoryRepository::new()))
        }
        DatabaseBackend::Postgres => {
            info!("database backend: postgres");
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .connect(&config.database_url)
                .await
                .context("failed to connect to PostgreSQL")?;
            Ok(Arc::new(PgRepository::new(pool)))
        }
    }
}

async fn serve(config: &AppConfig, repository: Arc<dyn TodoRepository>) -> Result<()> {
    let (state, worker) = AppState::start(repository, Arc::new(BroadcastNotifier::new()))
        .context("failed to build application state")?;
    let app = build_router(state);

    let addr = config.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(address = %addr, "todo lists service started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // queued jobs still run once the last queue handle is gone
    if let Err(err) = worker.await {
        error!(error = %err, "job worker panicked");
    }
    Ok(())
}

async fn seed(config: &AppConfig, repository: Arc<dyn TodoRepository>) -> Result<()> {
    if config.database_backend == DatabaseBackend::Memory {
        warn!("seeding the memory backend; data is discarded on exit");
    }

    let (state, _worker) = AppState::start(repository, Arc::new(BroadcastNotifier::new()))
        .context("failed to build application state")?;

    let list = state
        .service
        .create_todo_list(TodoListParams::named("Groceries"))
        .await
        .context("failed to insert seed list")?;

    for (title, description) in [
        ("Milk", Some("Two liters")),
        ("Eggs", None),
        ("Bread", Some("Whole wheat")),
    ] {
        state
            .service
            .create_item(
                list.id,
                ItemParams {
                    title: Some(Some(title.to_string())),
                    description: Some(description.map(str::to_string)),
                    completed: None,
                },
            )
            .await
            .with_context(|| format!("failed to insert seed item {title}"))?;
    }

    info!(todo_list_id = list.id, "seed data inserted successfully");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("todo_lists=debug,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "unable to install Ctrl+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "unable to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
