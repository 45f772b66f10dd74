//! Coverbot service binary - configuration, wiring, and the axum server.

use std::error::Error;
use std::sync::Arc;

use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use coverbot::adapters::extraction::{HttpDocumentExtractor, HttpExtractorConfig};
use coverbot::adapters::http::chat::{api_router, ChatAppState};
use coverbot::adapters::persistence::FileResponseSink;
use coverbot::adapters::semantic::{AcceptAllValidator, LlmSemanticValidator, LlmValidatorConfig};
use coverbot::adapters::session::InMemorySessionStore;
use coverbot::application::handlers::{HandleMessageHandler, UploadDocumentHandler};
use coverbot::config::AppConfig;
use coverbot::domain::catalog::Catalog;
use coverbot::domain::dialog::DialogEngine;
use coverbot::ports::SemanticValidator;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("fatal: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config);

    let catalog = Arc::new(Catalog::load_default()?);
    tracing::info!(flows = catalog.flows().len(), "question catalog loaded");

    let store = Arc::new(InMemorySessionStore::new(catalog.clone()));
    InMemorySessionStore::spawn_sweeper(
        store.clone(),
        config.session.ttl(),
        config.session.sweep_interval(),
    );

    let api_key = config.semantic.api_key.as_deref().filter(|k| !k.is_empty());
    let semantic: Arc<dyn SemanticValidator> = match api_key {
        Some(api_key) => {
            let validator_config = LlmValidatorConfig::new(api_key)
                .with_model(&config.semantic.model)
                .with_base_url(&config.semantic.base_url)
                .with_timeout(config.semantic.timeout());
            Arc::new(LlmSemanticValidator::new(validator_config)?)
        }
        None => {
            tracing::warn!(
                "no semantic collaborator configured; free-text answers are accepted as-is"
            );
            Arc::new(AcceptAllValidator)
        }
    };

    let extractor = Arc::new(HttpDocumentExtractor::new(
        HttpExtractorConfig::new(&config.extraction.base_url)
            .with_timeout(config.extraction.timeout()),
    )?);

    let sink = Arc::new(FileResponseSink::new(&config.storage.responses_dir));
    let engine = DialogEngine::new(catalog);

    let state = ChatAppState::new(
        Arc::new(HandleMessageHandler::new(
            store.clone(),
            semantic,
            sink,
            engine,
        )),
        Arc::new(UploadDocumentHandler::new(
            store,
            extractor,
            config.extraction.max_upload_bytes,
        )),
    );

    let app = api_router(state, config.extraction.max_upload_bytes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(std::time::Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let addr = config.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "coverbot listening");
    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
