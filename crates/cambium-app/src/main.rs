//! Cambium application binary - composition root.
//!
//! Ties together all Cambium crates into a single executable:
//! 1. Load configuration from TOML
//! 2. Construct the OpenAI client (fatal if no API key is configured)
//! 3. Build the document index through the process-wide cache
//! 4. Wire the session store and chat engine
//! 5. Start the axum REST API server

mod cli;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use clap::Parser;

use cambium_api::routes;
use cambium_api::state::AppState;
use cambium_chat::{ChatEngine, SessionStore};
use cambium_core::config::CambiumConfig;
use cambium_index::{IndexBuilder, IndexCache, IndexKey};
use cambium_llm::{DynChatModel, DynEmbeddingModel, OpenAiClient};

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = CambiumConfig::load_or_default(&config_file);
    config.general.port = args.resolve_port(config.general.port);
    if let Some(dir) = args.resolve_source_dir() {
        config.docs.source_dir = dir;
    }
    if let Some(level) = args.resolve_log_level() {
        config.general.log_level = level;
    }

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Cambium v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // LLM client. Missing credentials are fatal before any network call.
    let client = match OpenAiClient::from_config(&config.llm) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            tracing::error!(error = %e, "Failed to construct the model client");
            tracing::error!("Set OPENAI_API_KEY or add api_key to the [llm] config section");
            return Err(e.into());
        }
    };

    // Document index, built once at startup through the cache.
    let busy = Arc::new(AtomicBool::new(false));
    let builder = IndexBuilder::new(Arc::clone(&client) as Arc<dyn DynEmbeddingModel>)
        .with_busy_flag(Arc::clone(&busy));
    let cache = IndexCache::new();
    let key = IndexKey::new(&config.docs.source_dir, &config.llm);

    tracing::info!(
        dir = %config.docs.source_dir.display(),
        "Loading and indexing documents - this may take a while"
    );
    let index = match cache
        .get_or_build(key, || builder.build(&config.docs.source_dir, &config.llm))
        .await
    {
        Ok(index) => index,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build the document index");
            return Err(e.into());
        }
    };

    // Chat engine over the shared session store.
    let store = Arc::new(SessionStore::new(&config.chat.greeting));
    let engine = Arc::new(ChatEngine::new(
        store,
        Arc::clone(&client) as Arc<dyn DynChatModel>,
        client as Arc<dyn DynEmbeddingModel>,
        config.chat.clone(),
    ));

    // === API server ===

    let addr = format!("127.0.0.1:{}", config.general.port);
    let state = AppState::new(config, index, engine, busy);
    let router = routes::create_router(state);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "Failed to bind - is another instance running?");
            return Err(e.into());
        }
    };

    tracing::info!(addr = %addr, "API server listening");
    tracing::info!("Chat page at http://{}/ui", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
