//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! `ChatService` is generic over its repository, cache store and generator;
//! AppState pins them to the infra implementations chosen by configuration.

use std::path::PathBuf;
use std::sync::Arc;

use parley_core::chat::service::ChatService;
use parley_core::generator::box_generator::BoxResponseGenerator;
use parley_infra::cache::ConfiguredCacheStore;
use parley_infra::config::load_config;
use parley_infra::llm::build_generator;
use parley_infra::sqlite::chat::SqliteChatRepository;
use parley_infra::sqlite::pool::{DatabasePool, default_database_url};
use parley_types::config::ParleyConfig;
use tracing::info;

/// Chat service pinned to the infra implementations.
pub type ConcreteChatService =
    ChatService<SqliteChatRepository, ConfiguredCacheStore, BoxResponseGenerator>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub config: Arc<ParleyConfig>,
    pub data_dir: PathBuf,
    pub cache_backend: &'static str,
}

impl AppState {
    /// Initialize the application state: load config, connect to DB, wire services.
    pub async fn init(data_dir: PathBuf) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;

        let db_url = config
            .database
            .url
            .clone()
            .unwrap_or_else(|| default_database_url(&data_dir));
        let db_pool = DatabasePool::new(&db_url).await?;

        Self::from_parts(config, db_pool, data_dir)
    }

    /// Wire services over an already opened database.
    pub fn from_parts(
        config: ParleyConfig,
        db_pool: DatabasePool,
        data_dir: PathBuf,
    ) -> anyhow::Result<Self> {
        let store = ConfiguredCacheStore::from_config(&config.cache)?;
        let cache_backend = store.backend();
        let generator = build_generator(&config.generator);

        let chat_service = ChatService::new(
            SqliteChatRepository::new(db_pool),
            store,
            generator,
            &config.chat,
        );

        info!(
            cache = cache_backend,
            generator = chat_service.generator_name(),
            cache_window = config.chat.cache_window,
            "Chat service ready"
        );

        Ok(Self {
            chat_service: Arc::new(chat_service),
            config: Arc::new(config),
            data_dir,
            cache_backend,
        })
    }
}
