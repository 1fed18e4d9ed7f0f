//! Cardforge API Server Entry Point
//!
//! Bootstraps configuration, wires the catalog/deck stores and LLM provider
//! registry, and starts the Axum HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use cardforge_api::{AppConfig, AppState};
use cardforge_engine::{CardRepository, Orchestrator};
use cardforge_llm::{InProcessVectorIndex, ProviderRegistry};
use cardforge_storage::{
    CatalogDbConfig, CatalogStore, DeckStore, InMemoryCatalogStore, InMemoryDeckStore,
    PostgresCatalogStore, PostgresDeckStore, TieredCache,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    if config.llm_api_key.is_empty() {
        tracing::error!("LLM_API_KEY is required");
        return Err("LLM_API_KEY is required".into());
    }

    let (catalog, deck_store): (Arc<dyn CatalogStore>, Arc<dyn DeckStore>) = if config.has_database() {
        let db_config = CatalogDbConfig::from_discrete_parts(
            config.database_url.clone(),
            config.db_host.clone(),
            config.db_port,
            config.db_name.clone(),
            config.db_user.clone(),
            config.db_password.clone(),
        );
        tracing::info!("connecting to Postgres-backed catalog and deck stores");
        let catalog = Arc::new(PostgresCatalogStore::from_config(&db_config)?);
        let deck_store = Arc::new(PostgresDeckStore::from_config(&db_config)?);
        (catalog, deck_store)
    } else {
        tracing::info!("no database configured, using in-memory catalog and deck stores");
        (Arc::new(InMemoryCatalogStore::new(Vec::new())), Arc::new(InMemoryDeckStore::new()))
    };
    let cache = Arc::new(TieredCache::new(
        config.cache_l1_size,
        config.cache_l2_size,
        config.cache_l3_size,
        config.cache_promotion_threshold,
    ));
    let vector_index = Arc::new(InProcessVectorIndex::new());

    let llm = Arc::new(ProviderRegistry::with_round_robin());
    let provider = cardforge_llm::provider_for_model_id(&config.llm_model_id, &config.llm_api_key)?;
    llm.register(provider).await;

    let repository = Arc::new(CardRepository::new(catalog, cache, vector_index, llm.clone()));
    repository.preload().await?;

    let orchestrator = Arc::new(
        Orchestrator::new(repository.clone(), llm.clone()).with_bounds(config.quality_threshold, config.max_iterations),
    );

    let config = Arc::new(config);
    let state = AppState {
        repository,
        llm,
        orchestrator,
        deck_store,
        config: config.clone(),
        start_time: std::time::Instant::now(),
    };

    let cors = if config.cors_origins.is_empty() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<axum::http::HeaderValue> =
            config.cors_origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_credentials(config.cors_allow_credentials)
            .max_age(config.cors_max_age())
    };

    let app: Router = cardforge_api::create_api_router()
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.bind_addr().parse()?;
    tracing::info!(%addr, "starting cardforge-api server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
