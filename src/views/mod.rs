// Views - route handlers and the application router

pub mod core;
pub mod posts;
pub mod users;

use axum::{
    http::{header::LOCATION, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::app_state::AppState;
use crate::error::{AppError, AppResult};
use crate::infrastructure::middleware::viewer_context_middleware;
use crate::infrastructure::security::quote_segment;
use crate::templates::TemplateResponse;

/// Outcome of a view: a rendered page or a redirect.
#[derive(Debug)]
pub enum ViewResponse {
    Template(TemplateResponse),
    Redirect { location: String, status: StatusCode },
}

impl ViewResponse {
    /// `302 Found`, used for GET redirects.
    pub fn found(location: impl Into<String>) -> Self {
        ViewResponse::Redirect {
            location: location.into(),
            status: StatusCode::FOUND,
        }
    }

    /// `303 See Other`, used after a successful POST.
    pub fn see_other(location: impl Into<String>) -> Self {
        ViewResponse::Redirect {
            location: location.into(),
            status: StatusCode::SEE_OTHER,
        }
    }

    pub fn template(&self) -> Option<&TemplateResponse> {
        match self {
            ViewResponse::Template(template) => Some(template),
            ViewResponse::Redirect { .. } => None,
        }
    }
}

impl From<TemplateResponse> for ViewResponse {
    fn from(template: TemplateResponse) -> Self {
        ViewResponse::Template(template)
    }
}

impl IntoResponse for ViewResponse {
    fn into_response(self) -> Response {
        match self {
            ViewResponse::Template(template) => template.into_response(),
            ViewResponse::Redirect { location, status } => match HeaderValue::try_from(location) {
                Ok(value) => (status, [(LOCATION, value)]).into_response(),
                Err(e) => AppError::Internal(format!("Invalid redirect target: {}", e))
                    .into_response(),
            },
        }
    }
}

/// `?page=` query parameter of listing views.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
}

impl PageParams {
    pub fn number(&self) -> Option<&str> {
        self.page.as_deref()
    }
}

/// Route ids that are not integers do not match any post.
pub(crate) fn parse_id(raw: &str) -> AppResult<i64> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::NotFound(format!("No post matches id {:?}", raw)))
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", quote_segment(username))
}

pub fn post_detail_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

pub fn create_router(state: AppState) -> Router {
    let media = ServeDir::new(state.media.root().to_path_buf());

    Router::new()
        .route("/", get(posts::index))
        .route("/group/{slug}/", get(posts::group_posts))
        .route("/profile/{username}/", get(posts::profile))
        .route("/profile/{username}/follow/", get(posts::profile_follow))
        .route("/profile/{username}/unfollow/", get(posts::profile_unfollow))
        .route("/posts/{post_id}/", get(posts::post_detail))
        .route(
            "/posts/{post_id}/edit/",
            get(posts::post_edit_form).post(posts::post_edit),
        )
        .route("/posts/{post_id}/comment/", post(posts::add_comment))
        .route("/create/", get(posts::post_create_form).post(posts::post_create))
        .route("/follow/", get(posts::follow_index))
        .route("/auth/signup/", get(users::signup_form).post(users::signup))
        .route("/auth/login/", get(users::login_form).post(users::login))
        .route("/auth/logout/", get(users::logout))
        .nest_service("/media", media)
        .fallback(core::page_not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            viewer_context_middleware,
        ))
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("12").unwrap(), 12);
        assert!(matches!(parse_id("abc"), Err(AppError::NotFound(_))));
        assert!(matches!(parse_id("-1"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_redirect_response() {
        let response = ViewResponse::see_other(profile_url("auth")).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/profile/auth/");
    }

    #[test]
    fn test_profile_url_is_a_valid_location() {
        assert_eq!(profile_url("lev.t+1"), "/profile/lev.t%2B1/");
        assert_eq!(profile_url("Лев"), "/profile/%D0%9B%D0%B5%D0%B2/");

        let response = ViewResponse::found(profile_url("Лев")).into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[LOCATION].to_str().unwrap(),
            "/profile/%D0%9B%D0%B5%D0%B2/"
        );
    }
}
