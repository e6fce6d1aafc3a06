//! campus-api - Learning platform REST service
//!
//! Hosts the course/lecture/quiz/live-class/payment/attention API on one
//! shared SQLite database. Companion service campus-ai handles notes
//! indexing and AI tutoring.

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use campus_api::clients::attention_engine::AttentionEngineClient;
use campus_api::clients::payment::PaymentClient;
use campus_api::clients::video_token::VideoTokenSigner;
use campus_api::{build_router, AppState};
use campus_common::config::{resolve_root_folder, RootFolder};

#[derive(Parser, Debug)]
#[command(name = "campus-api", about = "CAMPUS learning platform API service")]
struct Args {
    /// Root folder holding campus.db and the media directory
    #[arg(long)]
    root_folder: Option<String>,

    /// Listen port override (default from module_config)
    #[arg(long)]
    port: Option<u16>,
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

    // Log build identification immediately after tracing init
    info!(
        "Starting CAMPUS API (campus-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let root = RootFolder::new(resolve_root_folder(args.root_folder.as_deref()));
    root.ensure_exists()?;

    let db_path = root.database_path();
    info!("Database path: {}", db_path.display());

    let pool = match campus_common::db::init_database(&db_path).await {
        Ok(pool) => {
            info!("✓ Connected to database");
            pool
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    // External service clients from database settings (+ ENV/TOML fallback)
    let payment = campus_api::config::resolve_payment_client(&pool).await?;
    let attention_engine = AttentionEngineClient::from_settings(&pool).await?;
    let video = campus_api::config::resolve_video_signer(&pool).await?;

    let state = AppState::new(pool.clone(), root.media_dir(), payment, attention_engine, video);
    let app = build_router(state);

    let module = campus_common::config::load_module_config(&pool, "api").await?;
    let port = args.port.unwrap_or(module.port);

    let listener = tokio::net::TcpListener::bind((module.host.as_str(), port)).await?;
    info!("campus-api listening on http://{}:{}", module.host, port);
    info!("Health check: http://{}:{}/health", module.host, port);

    axum::serve(listener, app).await?;

    Ok(())
}
