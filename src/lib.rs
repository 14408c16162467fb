// Yatube - a blogging platform: posts, groups, comments and follows

// Configuration and shared state
pub mod app_state;
pub mod config;

// Domain models
pub mod models;

// Infrastructure - database, caching, media storage, sessions
pub mod infrastructure;

// Web layer - forms, pagination, templates and views
pub mod forms;
pub mod paginator;
pub mod templates;
pub mod views;

// Common utilities
pub mod data_seeder;
pub mod error;

// Re-exports for convenience
pub use app_state::AppState;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use views::create_router;
