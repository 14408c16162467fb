#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{
        header::{CONTENT_TYPE, COOKIE, LOCATION},
        Request, Response,
    },
    Router,
};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use yatube::{
    app_state::AppState,
    config::Config,
    infrastructure::{
        middleware::{CurrentUser, Vc},
        security::SESSION_COOKIE,
        sqlite_database::SqliteDatabase,
        viewer::ViewerContext,
    },
    models::{Group, NewPost, Post, User},
    views::create_router,
};

pub const PASSWORD: &str = "war-and-peace";

pub const SMALL_GIF: &[u8] = b"\x47\x49\x46\x38\x39\x61\x02\x00\x01\x00\x80\x00\x00\x00\x00\x00\
\xFF\xFF\xFF\x21\xF9\x04\x00\x00\x00\x00\x00\x2C\x00\x00\x00\x00\x02\x00\x01\x00\x00\x02\x02\x0C\
\x0A\x00\x3B";

const BOUNDARY: &str = "----yatube-test-boundary";

/// A fresh application over an in-memory database and a temporary media root.
pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub media_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let media_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.media.root = media_dir.path().to_path_buf();

        let db = SqliteDatabase::new_in_memory().await.unwrap();
        let state = AppState::with_database(config, Arc::new(db));
        let router = create_router(state.clone());

        Self {
            state,
            router,
            media_dir,
        }
    }

    pub async fn create_user(&self, username: &str) -> User {
        let hash = yatube::infrastructure::security::hash_password(PASSWORD).unwrap();
        self.state.db.create_user(username, &hash).await.unwrap()
    }

    pub async fn create_group(&self, title: &str, slug: &str) -> Group {
        self.state
            .db
            .create_group(title, slug, "Тестовое описание")
            .await
            .unwrap()
    }

    pub async fn create_post(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
        let mut post = NewPost::new(text);
        if let Some(group) = group {
            post = post.group(group.id);
        }
        self.state.db.create_post(author.id, post).await.unwrap()
    }

    /// Open a session for `user` and return the `Cookie` header value.
    pub async fn login(&self, user: &User) -> String {
        let token = self.state.db.create_session(user.id).await.unwrap();
        format!("{}={}", SESSION_COOKIE, token)
    }

    /// Viewer context for calling handlers directly.
    pub async fn viewer(&self, user: Option<&User>) -> Vc {
        match user {
            Some(user) => {
                let token = self.state.db.create_session(user.id).await.unwrap();
                Vc::from(ViewerContext::authenticated_user(
                    user.clone(),
                    token,
                    "test".into(),
                ))
            }
            None => Vc::from(ViewerContext::anonymous("test".into())),
        }
    }

    pub async fn current_user(&self, user: &User) -> CurrentUser {
        CurrentUser::from_vc(self.viewer(Some(user)).await).unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response<Body> {
        let mut request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }
        self.send(request.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Submit `fields` and an optional `(field, file name, bytes)` upload as
    /// `multipart/form-data`.
    pub async fn post_multipart(
        &self,
        uri: &str,
        fields: &[(&str, &str)],
        file: Option<(&str, &str, &[u8])>,
        cookie: Option<&str>,
    ) -> Response<Body> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    BOUNDARY, name, value
                )
                .as_bytes(),
            );
        }
        if let Some((name, file_name, data)) = file {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: image/gif\r\n\r\n",
                    BOUNDARY, name, file_name
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let mut request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            );
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }
        self.send(request.body(Body::from(body)).unwrap()).await
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response.headers()[LOCATION].to_str().unwrap()
}
