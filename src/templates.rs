// Templates - Tera templates compiled into the binary

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use once_cell::sync::Lazy;
use serde::Serialize;
use tera::{Context, Tera};

use crate::error::{AppError, AppResult};
use crate::infrastructure::viewer::ViewerContext;

const TEMPLATE_SOURCES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("includes/header.html", include_str!("../templates/includes/header.html")),
    ("includes/paginator.html", include_str!("../templates/includes/paginator.html")),
    ("includes/post_card.html", include_str!("../templates/includes/post_card.html")),
    ("posts/index.html", include_str!("../templates/posts/index.html")),
    ("posts/group_list.html", include_str!("../templates/posts/group_list.html")),
    ("posts/profile.html", include_str!("../templates/posts/profile.html")),
    ("posts/post_detail.html", include_str!("../templates/posts/post_detail.html")),
    ("posts/create_post.html", include_str!("../templates/posts/create_post.html")),
    ("posts/follow.html", include_str!("../templates/posts/follow.html")),
    ("core/404.html", include_str!("../templates/core/404.html")),
    ("users/login.html", include_str!("../templates/users/login.html")),
    ("users/signup.html", include_str!("../templates/users/signup.html")),
    ("users/logged_out.html", include_str!("../templates/users/logged_out.html")),
];

static TEMPLATES: Lazy<Result<Tera, tera::Error>> = Lazy::new(|| {
    let mut tera = Tera::default();
    tera.add_raw_templates(TEMPLATE_SOURCES.iter().copied())?;
    Ok(tera)
});

pub fn templates() -> AppResult<&'static Tera> {
    TEMPLATES
        .as_ref()
        .map_err(|e| AppError::Template(format!("Failed to load templates: {}", e)))
}

pub fn render(template: &str, context: &Context) -> AppResult<String> {
    Ok(templates()?.render(template, context)?)
}

/// A template name plus the context it renders with. Handlers return this so
/// callers can inspect both before the HTML is produced.
#[derive(Debug, Clone)]
pub struct TemplateResponse {
    pub template: &'static str,
    pub context: Context,
    pub status: StatusCode,
}

impl TemplateResponse {
    /// Start a response; `user` is always present in the context (null for
    /// anonymous viewers).
    pub fn new(template: &'static str, viewer: &ViewerContext) -> Self {
        let mut context = Context::new();
        context.insert("user", &viewer.user);
        Self {
            template,
            context,
            status: StatusCode::OK,
        }
    }

    pub fn insert<T: Serialize + ?Sized>(mut self, key: &str, value: &T) -> Self {
        self.context.insert(key, value);
        self
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Context value as JSON, if present.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.context.get(key)
    }

    pub fn render(&self) -> AppResult<String> {
        render(self.template, &self.context)
    }
}

impl IntoResponse for TemplateResponse {
    fn into_response(self) -> Response {
        match self.render() {
            Ok(body) => (self.status, Html(body)).into_response(),
            Err(e) => e.into_response(),
        }
    }
}

/// The custom not-found page. Falls back to plain markup if templates are
/// unavailable.
pub fn not_found_page(path: &str) -> Response {
    let mut context = Context::new();
    context.insert("path", path);
    context.insert("user", &Option::<()>::None);

    match render("core/404.html", &context) {
        Ok(body) => (StatusCode::NOT_FOUND, Html(body)).into_response(),
        Err(e) => {
            tracing::error!("{}", e);
            (StatusCode::NOT_FOUND, Html("<h1>Not Found</h1>".to_string())).into_response()
        }
    }
}
