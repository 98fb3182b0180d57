//! nudge-server - MediaNudge recommendation and self-tracking service
//!
//! Serves the MediaNudge REST API: media catalog administration, per-user
//! three-dimensional ratings with transactional aggregate maintenance,
//! recommendations, follows, goals, content, and weekly challenges.

use anyhow::Result;
use clap::Parser;
use nudge_common::db::settings::get_bool_setting;
use nudge_server::{build_router, AppState};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    name = "nudge-server",
    about = "MediaNudge recommendation and self-tracking service"
)]
struct Args {
    /// Root folder holding the database (highest-priority override)
    #[arg(long)]
    root_folder: Option<String>,

    /// Address to bind
    #[arg(long, env = "MEDIANUDGE_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "MEDIANUDGE_PORT", default_value_t = 5730)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification IMMEDIATELY after tracing init -
    // provides instant startup feedback before database delays
    info!(
        "Starting MediaNudge (nudge-server) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let root_folder =
        nudge_common::config::resolve_root_folder(args.root_folder.as_deref(), "MEDIANUDGE_ROOT")?;
    std::fs::create_dir_all(&root_folder)?;

    let db_path = nudge_common::config::database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let pool = match nudge_common::db::init_database(&db_path).await {
        Ok(pool) => {
            info!("✓ Database ready");
            pool
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    // auth_required = false lets unidentified requests act as the Anonymous user
    let auth_required = get_bool_setting(&pool, "auth_required", true).await?;
    if auth_required {
        info!("✓ Request identity checking enabled");
    } else {
        info!("Request identity checking disabled (auth_required = false)");
    }

    let state = AppState::new(pool, auth_required);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind((args.host.as_str(), args.port)).await?;
    info!(
        "nudge-server listening on http://{}:{}",
        args.host, args.port
    );
    info!("Health check: http://{}:{}/health", args.host, args.port);

    axum::serve(listener, app).await?;

    Ok(())
}
