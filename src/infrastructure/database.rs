// Database Interface - Relational store access for Yatube
// Each method is a single SQL statement; cascades are left to foreign keys

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{Comment, Follow, Group, NewPost, Post, PostScope, User};

/// Store access layer used by every view.
#[async_trait]
pub trait DatabaseInterface: Send + Sync {
    // Users and sessions
    async fn create_user(&self, username: &str, password_hash: &str) -> AppResult<User>;
    async fn get_user(&self, id: i64) -> AppResult<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>>;
    /// Returns the user together with the stored argon2 hash.
    async fn get_user_credentials(&self, username: &str) -> AppResult<Option<(User, String)>>;
    async fn delete_user(&self, id: i64) -> AppResult<bool>;

    async fn create_session(&self, user_id: i64) -> AppResult<String>;
    async fn get_session_user(&self, token: &str) -> AppResult<Option<User>>;
    async fn delete_session(&self, token: &str) -> AppResult<bool>;

    // Groups
    async fn create_group(&self, title: &str, slug: &str, description: &str) -> AppResult<Group>;
    async fn get_group(&self, id: i64) -> AppResult<Option<Group>>;
    async fn get_group_by_slug(&self, slug: &str) -> AppResult<Option<Group>>;
    async fn list_groups(&self) -> AppResult<Vec<Group>>;
    async fn delete_group(&self, id: i64) -> AppResult<bool>;

    // Posts
    async fn create_post(&self, author_id: i64, post: NewPost) -> AppResult<Post>;
    async fn get_post(&self, id: i64) -> AppResult<Option<Post>>;
    /// Replaces text, group and image; author and pub_date never change.
    async fn update_post(&self, id: i64, post: NewPost) -> AppResult<Option<Post>>;
    async fn delete_post(&self, id: i64) -> AppResult<bool>;
    async fn count_posts(&self, scope: PostScope) -> AppResult<u64>;
    /// Newest first.
    async fn list_posts(&self, scope: PostScope, limit: u64, offset: u64) -> AppResult<Vec<Post>>;

    // Comments
    async fn create_comment(&self, post_id: i64, author_id: i64, text: &str) -> AppResult<Comment>;
    async fn list_comments(&self, post_id: i64) -> AppResult<Vec<Comment>>;

    // Follows
    /// `None` when the pair already exists.
    async fn create_follow(&self, user_id: i64, author_id: i64) -> AppResult<Option<Follow>>;
    async fn delete_follow(&self, user_id: i64, author_id: i64) -> AppResult<u64>;
    async fn is_following(&self, user_id: i64, author_id: i64) -> AppResult<bool>;
    async fn count_follows(&self, user_id: i64, author_id: i64) -> AppResult<u64>;
}
