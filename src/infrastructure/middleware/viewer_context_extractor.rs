// ViewerContext Extractors - handler access to the current viewer

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::infrastructure::{security::login_url, viewer::ViewerContext};
use crate::models::User;
use crate::views::ViewResponse;

/// Viewer of the current request, anonymous or not.
///
/// Derefs to [`ViewerContext`], so `vc.user`, `vc.is_authenticated()` work
/// directly. Cloning only clones the inner `Arc`.
#[derive(Debug, Clone)]
pub struct Vc(Arc<ViewerContext>);

impl Vc {
    pub fn new(vc: Arc<ViewerContext>) -> Self {
        Self(vc)
    }
}

impl std::ops::Deref for Vc {
    type Target = ViewerContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<ViewerContext> for Vc {
    fn from(vc: ViewerContext) -> Self {
        Self(Arc::new(vc))
    }
}

impl<S> FromRequestParts<S> for Vc
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Arc<ViewerContext>>()
            .map(|vc| Vc(vc.clone()))
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// A logged-in viewer. Anonymous requests are redirected to the login page
/// with the requested path as `next`.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub vc: Vc,
}

impl CurrentUser {
    pub fn from_vc(vc: Vc) -> Option<Self> {
        let user = vc.user.clone()?;
        Some(Self { user, vc })
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let vc = Vc::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        CurrentUser::from_vc(vc).ok_or_else(|| {
            let next = parts
                .uri
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or("/");
            ViewResponse::found(login_url(next)).into_response()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::LOCATION, Request};
    use chrono::Utc;

    fn parts_with(vc: ViewerContext, uri: &str) -> Parts {
        let (mut parts, _) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        parts.extensions.insert(Arc::new(vc));
        parts
    }

    #[tokio::test]
    async fn test_vc_deref() {
        let mut parts = parts_with(ViewerContext::anonymous("test-request".into()), "/");
        let vc = Vc::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(vc.request_id, "test-request");
        assert!(!vc.is_authenticated());
    }

    #[tokio::test]
    async fn test_missing_context_is_server_error() {
        let (mut parts, _) = Request::builder().uri("/").body(()).unwrap().into_parts();
        let err = Vc::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_anonymous_current_user_redirects_to_login() {
        let mut parts = parts_with(ViewerContext::anonymous("r".into()), "/create/");
        let response = CurrentUser::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[LOCATION].to_str().unwrap(),
            "/auth/login/?next=/create/"
        );
    }

    #[tokio::test]
    async fn test_authenticated_current_user() {
        let user = User {
            id: 1,
            username: "auth".into(),
            date_joined: Utc::now(),
        };
        let mut parts = parts_with(
            ViewerContext::authenticated_user(user.clone(), "token".into(), "r".into()),
            "/create/",
        );
        let current = CurrentUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(current.user, user);
    }
}
