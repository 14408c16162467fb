use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Group, User};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author: User,
    pub group: Option<Group>,
    /// Path of the uploaded image relative to the media root, e.g. `posts/cat.gif`.
    pub image: Option<String>,
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview: String = self.text.chars().take(15).collect();
        f.write_str(&preview)
    }
}

/// Fields a user controls when creating or editing a post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPost {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

impl NewPost {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn group(mut self, group_id: i64) -> Self {
        self.group_id = Some(group_id);
        self
    }

    pub fn image(mut self, path: impl Into<String>) -> Self {
        self.image = Some(path.into());
        self
    }
}

/// Filter applied to a feed of posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    All,
    Group(i64),
    Author(i64),
    /// Posts by every author the given user follows.
    FollowedBy(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author: User,
    pub text: String,
    pub created: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::datetime_from_micros;

    #[test]
    fn test_post_display_truncates_to_fifteen_chars() {
        let post = Post {
            id: 1,
            text: "Тестовый текст поста".into(),
            pub_date: datetime_from_micros(0),
            author: User {
                id: 1,
                username: "auth".into(),
                date_joined: datetime_from_micros(0),
            },
            group: None,
            image: None,
        };
        assert_eq!(post.to_string(), "Тестовый текст ");
    }

    #[test]
    fn test_new_post_builder() {
        let post = NewPost::new("hello").group(3).image("posts/a.gif");
        assert_eq!(post.text, "hello");
        assert_eq!(post.group_id, Some(3));
        assert_eq!(post.image.as_deref(), Some("posts/a.gif"));
    }
}
