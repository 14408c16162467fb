// ViewerContext Middleware - resolves the session cookie into a viewer
// and injects it into request extensions

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tower_cookies::Cookies;
use tracing::warn;
use uuid::Uuid;

use crate::{
    app_state::AppState,
    infrastructure::{security::SESSION_COOKIE, viewer::ViewerContext},
};

/// Request-scoped viewer context middleware. Requires `CookieManagerLayer`
/// to wrap it.
pub async fn viewer_context_middleware(
    State(app_state): State<AppState>,
    cookies: Cookies,
    mut request: Request,
    next: Next,
) -> Response {
    let token = cookies
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string());

    let viewer_context = create_viewer_context(&app_state, token).await;
    request.extensions_mut().insert(viewer_context);

    next.run(request).await
}

/// Unknown or stale session tokens yield an anonymous viewer.
async fn create_viewer_context(app_state: &AppState, token: Option<String>) -> Arc<ViewerContext> {
    let request_id = format!("req-{}", Uuid::new_v4());

    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return Arc::new(ViewerContext::anonymous(request_id));
    };

    match app_state.db.get_session_user(&token).await {
        Ok(Some(user)) => Arc::new(ViewerContext::authenticated_user(user, token, request_id)),
        Ok(None) => Arc::new(ViewerContext::anonymous(request_id)),
        Err(e) => {
            warn!("Failed to resolve session: {}", e);
            Arc::new(ViewerContext::anonymous(request_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::infrastructure::sqlite_database::SqliteDatabase;

    async fn state() -> AppState {
        let db = SqliteDatabase::new_in_memory().await.unwrap();
        AppState::with_database(Config::default(), Arc::new(db))
    }

    #[tokio::test]
    async fn test_missing_token_is_anonymous() {
        let state = state().await;
        let vc = create_viewer_context(&state, None).await;
        assert!(!vc.is_authenticated());
        assert!(vc.request_id.starts_with("req-"));
    }

    #[tokio::test]
    async fn test_valid_token_authenticates() {
        let state = state().await;
        let user = state.db.create_user("auth", "hash").await.unwrap();
        let token = state.db.create_session(user.id).await.unwrap();

        let vc = create_viewer_context(&state, Some(token.clone())).await;
        assert_eq!(vc.user.as_ref(), Some(&user));
        assert_eq!(vc.session_token, Some(token));
    }

    #[tokio::test]
    async fn test_unknown_token_is_anonymous() {
        let state = state().await;
        let vc = create_viewer_context(&state, Some("stale".into())).await;
        assert!(!vc.is_authenticated());
    }
}
