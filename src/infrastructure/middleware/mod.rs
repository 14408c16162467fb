pub mod viewer_context_extractor;
pub mod viewer_context_middleware;

pub use viewer_context_extractor::{CurrentUser, Vc};
pub use viewer_context_middleware::viewer_context_middleware;
