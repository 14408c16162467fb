// Forms - cleaning and validation of submitted fields
// A form that fails validation carries field-level errors back to its template

use axum::{
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Form,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{AppError, AppResult};
use crate::infrastructure::media::{decode_image, UploadedFile};
use crate::models::{Group, Post, User};

pub const NON_FIELD_ERRORS: &str = "__all__";

const REQUIRED: &str = "This field is required.";
const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";
const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
const PASSWORD_MIN_LENGTH: usize = 8;

/// Error messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Raw fields of the post form, from either a multipart or an urlencoded body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostFormData {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub group: String,
    #[serde(skip)]
    pub image: Option<UploadedFile>,
}

impl PostFormData {
    async fn from_multipart(mut multipart: Multipart) -> AppResult<Self> {
        let mut data = PostFormData::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "text" => {
                    data.text = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.body_text()))?;
                }
                "group" => {
                    data.group = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.body_text()))?;
                }
                "image" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.body_text()))?;
                    let file = UploadedFile {
                        file_name,
                        content_type,
                        data: bytes.to_vec(),
                    };
                    if !file.is_empty() {
                        data.image = Some(file);
                    }
                }
                _ => {}
            }
        }

        Ok(data)
    }
}

impl<S> FromRequest<S> for PostFormData
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        match content_type {
            Some(ct) if ct.starts_with("multipart/form-data") => {
                let multipart = Multipart::from_request(req, state)
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                Self::from_multipart(multipart).await
            }
            Some(_) => {
                let Form(data) = Form::<PostFormData>::from_request(req, state)
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                Ok(data)
            }
            // an empty submission behaves like a form with every field blank
            None => Ok(PostFormData::default()),
        }
    }
}

/// Validated post fields ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedPost {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<UploadedFile>,
}

/// Form for creating and editing a post: `text`, `group` and `image`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PostForm {
    pub text: String,
    /// Selected group id, if any.
    pub group: Option<i64>,
    /// Image currently attached to the edited post.
    pub image: Option<String>,
    pub errors: FormErrors,
    #[serde(skip)]
    raw_group: String,
    #[serde(skip)]
    upload: Option<UploadedFile>,
}

impl PostForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Form pre-filled with the current values of `post`.
    pub fn initial(post: &Post) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group.as_ref().map(|g| g.id),
            image: post.image.clone(),
            raw_group: post
                .group
                .as_ref()
                .map(|g| g.id.to_string())
                .unwrap_or_default(),
            ..Default::default()
        }
    }

    pub fn bind(data: PostFormData, instance: Option<&Post>) -> Self {
        Self {
            text: data.text,
            group: data.group.trim().parse().ok(),
            image: instance.and_then(|post| post.image.clone()),
            errors: FormErrors::default(),
            raw_group: data.group,
            upload: data.image,
        }
    }

    /// Validate against the existing `groups`. On failure the errors are kept
    /// on the form for re-rendering.
    pub fn validate(&mut self, groups: &[Group]) -> Option<CleanedPost> {
        let text = self.text.trim().to_string();
        if text.is_empty() {
            self.errors.add("text", REQUIRED);
        }

        let raw_group = self.raw_group.trim();
        let group_id = if raw_group.is_empty() {
            None
        } else {
            match raw_group.parse::<i64>() {
                Ok(id) if groups.iter().any(|g| g.id == id) => Some(id),
                _ => {
                    self.errors.add("group", INVALID_CHOICE);
                    None
                }
            }
        };

        if let Some(upload) = &self.upload {
            if let Err(e) = decode_image(&upload.data) {
                tracing::debug!("Rejected upload {}: {}", upload.file_name, e);
                self.errors.add("image", INVALID_IMAGE);
            }
        }

        if !self.errors.is_empty() {
            return None;
        }

        Some(CleanedPost {
            text,
            group_id,
            image: self.upload.take(),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
    #[serde(skip_deserializing)]
    pub errors: FormErrors,
}

impl CommentForm {
    pub fn validate(&mut self) -> Option<String> {
        let text = self.text.trim();
        if text.is_empty() {
            self.errors.add("text", REQUIRED);
            return None;
        }
        Some(text.to_string())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password1: String,
    #[serde(default, skip_serializing)]
    pub password2: String,
    #[serde(skip_deserializing)]
    pub errors: FormErrors,
}

impl SignupForm {
    /// Returns `(username, password)` when every rule holds. Username
    /// uniqueness is checked by the caller against the store.
    pub fn validate(&mut self) -> Option<(String, String)> {
        let username = self.username.trim().to_string();
        if let Err(message) = User::validate_username(&username) {
            self.errors.add("username", message);
        }

        if self.password1.is_empty() {
            self.errors.add("password1", REQUIRED);
        }
        if self.password2.is_empty() {
            self.errors.add("password2", REQUIRED);
        } else if self.password1 != self.password2 {
            self.errors
                .add("password2", "The two password fields didn’t match.");
        } else {
            if self.password1.chars().count() < PASSWORD_MIN_LENGTH {
                self.errors.add(
                    "password2",
                    "This password is too short. It must contain at least 8 characters.",
                );
            }
            if self.password1.chars().all(|c| c.is_ascii_digit()) {
                self.errors.add("password2", "This password is entirely numeric.");
            }
        }

        if !self.errors.is_empty() {
            return None;
        }
        Some((username, self.password1.clone()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(skip_deserializing)]
    pub errors: FormErrors,
}

impl LoginForm {
    pub fn validate(&mut self) -> Option<(String, String)> {
        if self.username.trim().is_empty() {
            self.errors.add("username", REQUIRED);
        }
        if self.password.is_empty() {
            self.errors.add("password", REQUIRED);
        }
        if !self.errors.is_empty() {
            return None;
        }
        Some((self.username.trim().to_string(), self.password.clone()))
    }

    pub fn reject_credentials(&mut self) {
        self.errors.add(
            NON_FIELD_ERRORS,
            "Please enter a correct username and password. Note that both fields may be case-sensitive.",
        );
    }
}
