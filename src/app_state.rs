use std::sync::Arc;

use crate::{
    config::Config,
    error::AppResult,
    infrastructure::{
        database::DatabaseInterface, media::MediaStorage, page_cache::PageCache,
        sqlite_database::SqliteDatabase,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseInterface>,
    pub page_cache: Arc<PageCache>,
    pub media: MediaStorage,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        // Initialize database
        let database = SqliteDatabase::connect(&config.database.url).await?;

        tokio::fs::create_dir_all(&config.media.root).await?;

        Ok(Self::with_database(config, Arc::new(database)))
    }

    pub fn with_database(config: Config, db: Arc<dyn DatabaseInterface>) -> Self {
        let page_cache = Arc::new(PageCache::new(
            config.cache.capacity,
            config.index_cache_ttl(),
        ));
        let media = MediaStorage::new(config.media.root.clone());

        Self {
            db,
            page_cache,
            media,
            config,
        }
    }

    pub fn posts_per_page(&self) -> u64 {
        self.config.pagination.posts_per_page
    }
}
