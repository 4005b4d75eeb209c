//! cohort-ar - Attendance Reconciler microservice
//!
//! Reconciles uploaded meeting-attendance exports against course rosters
//! and keeps one attendance result per enrolled student per session.

use anyhow::{Context, Result};
use clap::Parser;
use cohort_common::config::{load_module_config, RootFolderInitializer, RootFolderResolver};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cohort_ar::config::resolve_port;
use cohort_ar::AppState;

const MODULE_NAME: &str = "cohort-ar";

#[derive(Debug, Parser)]
#[command(name = "cohort-ar", version, about = "Attendance Reconciler")]
struct Args {
    /// HTTP port (default 5731)
    #[arg(long, env = "COHORT_AR_PORT")]
    port: Option<u16>,

    /// Root folder holding the shared database
    #[arg(long, env = "COHORT_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let toml_config = load_module_config(MODULE_NAME);

    // RUST_LOG wins over the TOML level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&toml_config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        git_hash = env!("GIT_HASH"),
        built = env!("BUILD_TIMESTAMP"),
        profile = env!("BUILD_PROFILE"),
        "Starting cohort-ar (Attendance Reconciler)"
    );

    let root_folder = RootFolderResolver::new(MODULE_NAME)
        .with_cli_arg(args.root_folder)
        .resolve();

    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());
    let db_pool = cohort_ar::db::init_database_pool(&db_path)
        .await
        .context("Failed to open database")?;

    let port = resolve_port(args.port, &toml_config);
    let state = AppState::new(db_pool, toml_config);
    let app = cohort_ar::build_router(state);

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
