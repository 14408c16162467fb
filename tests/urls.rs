mod common;

use axum::http::StatusCode;
use common::{body_text, location, TestApp};

#[tokio::test]
async fn test_public_pages_are_available_to_everyone() {
    let app = TestApp::new().await;
    let author = app.create_user("auth").await;
    let group = app.create_group("Тестовая группа", "test-slug").await;
    let post = app.create_post(&author, "Тестовый пост", Some(&group)).await;

    for uri in [
        "/".to_string(),
        "/group/test-slug/".to_string(),
        "/profile/auth/".to_string(),
        format!("/posts/{}/", post.id),
        "/auth/login/".to_string(),
        "/auth/signup/".to_string(),
    ] {
        let response = app.get(&uri, None).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
    }
}

#[tokio::test]
async fn test_private_pages_redirect_anonymous_to_login() {
    let app = TestApp::new().await;
    let author = app.create_user("auth").await;
    let post = app.create_post(&author, "Тестовый пост", None).await;

    let edit = format!("/posts/{}/edit/", post.id);
    for (uri, expected) in [
        ("/create/".to_string(), "/auth/login/?next=/create/".to_string()),
        (edit.clone(), format!("/auth/login/?next={}", edit)),
        ("/follow/".to_string(), "/auth/login/?next=/follow/".to_string()),
        (
            "/profile/auth/follow/".to_string(),
            "/auth/login/?next=/profile/auth/follow/".to_string(),
        ),
    ] {
        let response = app.get(&uri, None).await;
        assert_eq!(response.status(), StatusCode::FOUND, "{}", uri);
        assert_eq!(location(&response), expected);
    }
}

#[tokio::test]
async fn test_create_page_available_to_authorized_user() {
    let app = TestApp::new().await;
    let user = app.create_user("noname").await;
    let cookie = app.login(&user).await;

    let response = app.get("/create/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Новый пост"));
}

#[tokio::test]
async fn test_edit_page_available_to_author_only() {
    let app = TestApp::new().await;
    let author = app.create_user("auth").await;
    let other = app.create_user("noname").await;
    let post = app.create_post(&author, "Тестовый пост", None).await;
    let uri = format!("/posts/{}/edit/", post.id);

    let response = app.get(&uri, Some(&app.login(&author).await)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get(&uri, Some(&app.login(&other).await)).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), format!("/posts/{}/", post.id));
}

#[tokio::test]
async fn test_unknown_page_uses_custom_404() {
    let app = TestApp::new().await;

    let response = app.get("/unexisting_page/", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_text(response).await;
    assert!(body.contains("Страница не найдена"));
    assert!(body.contains("unexisting_page"));
}

#[tokio::test]
async fn test_missing_objects_are_not_found() {
    let app = TestApp::new().await;

    for uri in [
        "/group/no-such-group/",
        "/profile/nobody/",
        "/posts/999/",
        "/posts/abc/",
    ] {
        let response = app.get(uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
        assert!(body_text(response).await.contains("Страница не найдена"));
    }
}

#[tokio::test]
async fn test_unknown_session_is_anonymous() {
    let app = TestApp::new().await;

    let response = app.get("/create/", Some("sessionid=forged")).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/auth/login/?next=/create/");
}

#[tokio::test]
async fn test_anonymous_submission_redirects_to_login() {
    let app = TestApp::new().await;

    let response = app.post_form("/create/", "text=Anonymous", None).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/auth/login/?next=/create/");
    assert!(app
        .state
        .db
        .list_posts(yatube::models::PostScope::All, 10, 0)
        .await
        .unwrap()
        .is_empty());
}
