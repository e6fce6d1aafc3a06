//! campus-ai - AI tutor service
//!
//! Companion service to campus-api: indexes lecture notes into embeddings
//! and answers course questions over them via a local Ollama server.

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};

use campus_ai::ollama::OllamaClient;
use campus_ai::{build_router, AppState};
use campus_common::config::{resolve_root_folder, RootFolder};
use campus_common::db::get_setting_or;

#[derive(Parser, Debug)]
#[command(name = "campus-ai", about = "CAMPUS AI tutor service")]
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
        "Starting CAMPUS AI Tutor (campus-ai) v{} [{}] built {} ({})",
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

    let ollama = OllamaClient::from_settings(&pool).await?;
    if ollama.is_running().await {
        info!("✓ Model server reachable at {}", ollama.base_url());
    } else {
        warn!(
            "Model server not reachable at {}; falling back to offline embeddings, \
             chat answers degrade until it comes up",
            ollama.base_url()
        );
    }

    let fallback_dim: usize = get_setting_or(&pool, "ai_fallback_embedding_dim", "384")
        .await?
        .parse()
        .unwrap_or(384);

    if !campus_ai::pdf::pdftotext_available() {
        warn!("pdftotext not found in PATH; PDF notes cannot be indexed");
    }

    let state = AppState::new(pool.clone(), ollama, root.media_dir(), fallback_dim);
    let app = build_router(state);

    let module = campus_common::config::load_module_config(&pool, "ai_tutor").await?;
    let port = args.port.unwrap_or(module.port);

    let listener = tokio::net::TcpListener::bind((module.host.as_str(), port)).await?;
    info!("campus-ai listening on http://{}:{}", module.host, port);
    info!("Health check: http://{}:{}/health", module.host, port);

    axum::serve(listener, app).await?;

    Ok(())
}
