// Core infrastructure modules
pub mod database;        // Database interface
pub mod sqlite_database; // SQLite implementation of the database interface
pub mod cache;           // Basic LRU caching
pub mod page_cache;      // Rendered page cache with expiry
pub mod media;           // Uploaded file storage
pub mod security;        // Password hashing and session cookies
pub mod viewer;          // Viewer context
pub mod middleware;      // Viewer context middleware and extractors

// Re-export core infrastructure components
pub use cache::Cache;
pub use database::DatabaseInterface;
pub use media::{MediaStorage, UploadedFile};
pub use page_cache::PageCache;
pub use sqlite_database::SqliteDatabase;
pub use viewer::ViewerContext;
