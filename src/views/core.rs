use axum::{http::Uri, response::Response};

use crate::templates::not_found_page;

/// Fallback for every unknown path.
pub async fn page_not_found(uri: Uri) -> Response {
    tracing::debug!("No route for {}", uri.path());
    not_found_page(uri.path())
}
