// Account views - signup, login and logout over cookie sessions

use axum::{
    extract::{Query, State},
    Form,
};
use serde::Deserialize;
use tower_cookies::Cookies;
use tracing::{info, warn};

use super::ViewResponse;
use crate::app_state::AppState;
use crate::error::{AppError, AppResult};
use crate::forms::{LoginForm, SignupForm};
use crate::infrastructure::middleware::Vc;
use crate::infrastructure::security::{
    expired_session_cookie, hash_password, safe_next, session_cookie, verify_password,
};
use crate::infrastructure::viewer::ViewerContext;
use crate::templates::TemplateResponse;

const USERNAME_TAKEN: &str = "A user with that username already exists.";

#[derive(Debug, Default, Deserialize)]
pub struct NextParams {
    pub next: Option<String>,
}

pub async fn signup_form(vc: Vc) -> TemplateResponse {
    TemplateResponse::new("users/signup.html", &vc).insert("form", &SignupForm::default())
}

/// Creates the account and logs the new user in.
pub async fn signup(
    State(state): State<AppState>,
    vc: Vc,
    cookies: Cookies,
    Form(mut form): Form<SignupForm>,
) -> AppResult<ViewResponse> {
    let cleaned = form.validate();

    if let Some((username, _)) = &cleaned {
        if state.db.get_user_by_username(username).await?.is_some() {
            form.errors.add("username", USERNAME_TAKEN);
        }
    }

    let Some((username, password)) = cleaned.filter(|_| form.errors.is_empty()) else {
        return Ok(TemplateResponse::new("users/signup.html", &vc)
            .insert("form", &form)
            .into());
    };

    let password_hash = hash_password(&password)?;
    let user = match state.db.create_user(&username, &password_hash).await {
        Ok(user) => user,
        Err(AppError::Validation(_)) => {
            form.errors.add("username", USERNAME_TAKEN);
            return Ok(TemplateResponse::new("users/signup.html", &vc)
                .insert("form", &form)
                .into());
        }
        Err(e) => return Err(e),
    };

    let token = state.db.create_session(user.id).await?;
    cookies.add(session_cookie(token));
    info!("New user signed up: {}", user.username);

    Ok(ViewResponse::see_other("/"))
}

pub async fn login_form(vc: Vc, Query(params): Query<NextParams>) -> TemplateResponse {
    let form = LoginForm {
        next: params.next,
        ..Default::default()
    };
    TemplateResponse::new("users/login.html", &vc).insert("form", &form)
}

pub async fn login(
    State(state): State<AppState>,
    vc: Vc,
    cookies: Cookies,
    Form(mut form): Form<LoginForm>,
) -> AppResult<ViewResponse> {
    let Some((username, password)) = form.validate() else {
        return Ok(TemplateResponse::new("users/login.html", &vc)
            .insert("form", &form)
            .into());
    };

    let user = match state.db.get_user_credentials(&username).await? {
        Some((user, hash)) if verify_password(&hash, &password) => user,
        _ => {
            warn!("Failed login attempt for {}", username);
            form.reject_credentials();
            return Ok(TemplateResponse::new("users/login.html", &vc)
                .insert("form", &form)
                .into());
        }
    };

    let token = state.db.create_session(user.id).await?;
    cookies.add(session_cookie(token));
    info!("User logged in: {}", user.username);

    Ok(ViewResponse::see_other(safe_next(form.next.as_deref())))
}

pub async fn logout(
    State(state): State<AppState>,
    vc: Vc,
    cookies: Cookies,
) -> AppResult<TemplateResponse> {
    if let Some(token) = &vc.session_token {
        state.db.delete_session(token).await?;
    }
    cookies.remove(expired_session_cookie());

    if let Some(user) = &vc.user {
        info!("User logged out: {}", user.username);
    }

    let anonymous = ViewerContext::anonymous(vc.request_id.clone());
    Ok(TemplateResponse::new("users/logged_out.html", &anonymous))
}
