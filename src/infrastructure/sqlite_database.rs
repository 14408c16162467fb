use async_trait::async_trait;
use sqlx::{
    sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow},
    QueryBuilder, Row,
};
use std::str::FromStr;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::infrastructure::database::DatabaseInterface;
use crate::models::{
    current_time_micros, datetime_from_micros, Comment, Follow, Group, NewPost, Post, PostScope,
    User,
};

const POST_SELECT: &str = r#"
    SELECT p.id, p.text, p.pub_date, p.image,
           u.id AS author_id, u.username AS author_username, u.date_joined AS author_date_joined,
           g.id AS group_id, g.title AS group_title, g.slug AS group_slug,
           g.description AS group_description
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN post_groups g ON g.id = p.group_id
"#;

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.post_id, c.text, c.created,
           u.id AS author_id, u.username AS author_username, u.date_joined AS author_date_joined
    FROM comments c
    JOIN users u ON u.id = c.author_id
"#;

/// SQLite implementation of the Yatube store
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Connect to `database_url` and create the schema if it does not exist yet.
    pub async fn connect(database_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| {
                AppError::Configuration(format!("Invalid database URL {}: {}", database_url, e))
            })?
            .create_if_missing(true)
            .foreign_keys(true);

        // every connection to `:memory:` opens a separate database
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options.connect_with(options).await.map_err(|e| {
            AppError::Database(format!("Failed to connect to {}: {}", database_url, e))
        })?;

        let db = Self { pool };
        db.initialize().await?;
        info!("Connected to database at {}", database_url);
        Ok(db)
    }

    pub async fn new_in_memory() -> AppResult<Self> {
        Self::connect("sqlite::memory:").await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create Yatube tables and indexes
    pub async fn initialize(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                date_joined INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create users table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create sessions table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS post_groups (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                slug TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create groups table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                text TEXT NOT NULL,
                pub_date INTEGER NOT NULL,
                group_id INTEGER REFERENCES post_groups(id) ON DELETE SET NULL,
                author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                image TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create posts table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                text TEXT NOT NULL,
                created INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create comments table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS follows (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create follows table: {}", e)))?;

        for statement in [
            "CREATE INDEX IF NOT EXISTS idx_posts_pub_date ON posts(pub_date DESC, id DESC)",
            "CREATE INDEX IF NOT EXISTS idx_posts_group ON posts(group_id)",
            "CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id)",
            "CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id)",
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_follows_user_author ON follows(user_id, author_id)",
        ] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::Database(format!("Failed to create index: {}", e)))?;
        }

        Ok(())
    }
}

fn user_from_row(row: &SqliteRow, prefix: &str) -> AppResult<User> {
    Ok(User {
        id: row.try_get(format!("{}id", prefix).as_str())?,
        username: row.try_get(format!("{}username", prefix).as_str())?,
        date_joined: datetime_from_micros(row.try_get(format!("{}date_joined", prefix).as_str())?),
    })
}

fn group_from_row(row: &SqliteRow) -> AppResult<Group> {
    Ok(Group {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        description: row.try_get("description")?,
    })
}

fn post_from_row(row: &SqliteRow) -> AppResult<Post> {
    let group = match row.try_get::<Option<i64>, _>("group_id")? {
        Some(id) => Some(Group {
            id,
            title: row.try_get("group_title")?,
            slug: row.try_get("group_slug")?,
            description: row.try_get("group_description")?,
        }),
        None => None,
    };

    Ok(Post {
        id: row.try_get("id")?,
        text: row.try_get("text")?,
        pub_date: datetime_from_micros(row.try_get("pub_date")?),
        author: user_from_row(row, "author_")?,
        group,
        image: row.try_get("image")?,
    })
}

fn comment_from_row(row: &SqliteRow) -> AppResult<Comment> {
    Ok(Comment {
        id: row.try_get("id")?,
        post_id: row.try_get("post_id")?,
        author: user_from_row(row, "author_")?,
        text: row.try_get("text")?,
        created: datetime_from_micros(row.try_get("created")?),
    })
}

fn push_scope(qb: &mut QueryBuilder<'_, Sqlite>, scope: PostScope) {
    match scope {
        PostScope::All => {}
        PostScope::Group(group_id) => {
            qb.push(" WHERE p.group_id = ");
            qb.push_bind(group_id);
        }
        PostScope::Author(author_id) => {
            qb.push(" WHERE p.author_id = ");
            qb.push_bind(author_id);
        }
        PostScope::FollowedBy(user_id) => {
            qb.push(" WHERE p.author_id IN (SELECT f.author_id FROM follows f WHERE f.user_id = ");
            qb.push_bind(user_id);
            qb.push(")");
        }
    }
}

#[async_trait]
impl DatabaseInterface for SqliteDatabase {
    #[instrument(skip(self, password_hash))]
    async fn create_user(&self, username: &str, password_hash: &str) -> AppResult<User> {
        User::validate_username(username).map_err(|e| AppError::Validation(e.to_string()))?;

        let date_joined = current_time_micros();
        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, date_joined) VALUES (?, ?, ?)",
        )
        .bind(username)
        .bind(password_hash)
        .bind(date_joined)
        .execute(&self.pool)
        .await?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            date_joined: datetime_from_micros(date_joined),
        })
    }

    async fn get_user(&self, id: i64) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT id, username, date_joined FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to get user {}: {}", id, e)))?;

        row.map(|row| user_from_row(&row, "")).transpose()
    }

    async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT id, username, date_joined FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| user_from_row(&row, "")).transpose()
    }

    async fn get_user_credentials(&self, username: &str) -> AppResult<Option<(User, String)>> {
        let row = sqlx::query(
            "SELECT id, username, date_joined, password_hash FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some((user_from_row(&row, "")?, row.try_get("password_hash")?))),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_session(&self, user_id: i64) -> AppResult<String> {
        let token = Uuid::new_v4().simple().to_string();
        sqlx::query("INSERT INTO sessions (token, user_id, created) VALUES (?, ?, ?)")
            .bind(&token)
            .bind(user_id)
            .bind(current_time_micros())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to create session for user {}: {}", user_id, e))
            })?;
        Ok(token)
    }

    async fn get_session_user(&self, token: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT u.id, u.username, u.date_joined
            FROM sessions s JOIN users u ON u.id = s.user_id
            WHERE s.token = ?
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| user_from_row(&row, "")).transpose()
    }

    async fn delete_session(&self, token: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, description))]
    async fn create_group(&self, title: &str, slug: &str, description: &str) -> AppResult<Group> {
        Group::validate_title(title).map_err(|e| AppError::Validation(e.to_string()))?;
        Group::validate_slug(slug).map_err(|e| AppError::Validation(e.to_string()))?;

        let result =
            sqlx::query("INSERT INTO post_groups (title, slug, description) VALUES (?, ?, ?)")
                .bind(title)
                .bind(slug)
                .bind(description)
                .execute(&self.pool)
                .await?;

        Ok(Group {
            id: result.last_insert_rowid(),
            title: title.to_string(),
            slug: slug.to_string(),
            description: description.to_string(),
        })
    }

    async fn get_group(&self, id: i64) -> AppResult<Option<Group>> {
        let row = sqlx::query("SELECT id, title, slug, description FROM post_groups WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| group_from_row(&row)).transpose()
    }

    async fn get_group_by_slug(&self, slug: &str) -> AppResult<Option<Group>> {
        let row =
            sqlx::query("SELECT id, title, slug, description FROM post_groups WHERE slug = ?")
                .bind(slug)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|row| group_from_row(&row)).transpose()
    }

    async fn list_groups(&self) -> AppResult<Vec<Group>> {
        let rows = sqlx::query("SELECT id, title, slug, description FROM post_groups ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(group_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn delete_group(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM post_groups WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, post), fields(group_id = ?post.group_id))]
    async fn create_post(&self, author_id: i64, post: NewPost) -> AppResult<Post> {
        let result = sqlx::query(
            "INSERT INTO posts (text, pub_date, group_id, author_id, image) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&post.text)
        .bind(current_time_micros())
        .bind(post.group_id)
        .bind(author_id)
        .bind(&post.image)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to create post for author {}: {}", author_id, e))
        })?;

        let id = result.last_insert_rowid();
        self.get_post(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Post {} vanished after insert", id)))
    }

    async fn get_post(&self, id: i64) -> AppResult<Option<Post>> {
        let mut qb = QueryBuilder::<Sqlite>::new(POST_SELECT);
        qb.push(" WHERE p.id = ");
        qb.push_bind(id);

        let row = qb
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to get post {}: {}", id, e)))?;

        row.map(|row| post_from_row(&row)).transpose()
    }

    #[instrument(skip(self, post))]
    async fn update_post(&self, id: i64, post: NewPost) -> AppResult<Option<Post>> {
        let result = sqlx::query("UPDATE posts SET text = ?, group_id = ?, image = ? WHERE id = ?")
            .bind(&post.text)
            .bind(post.group_id)
            .bind(&post.image)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to update post {}: {}", id, e)))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_post(id).await
    }

    #[instrument(skip(self))]
    async fn delete_post(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_posts(&self, scope: PostScope) -> AppResult<u64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) AS count FROM posts p");
        push_scope(&mut qb, scope);

        let row = qb.build().fetch_one(&self.pool).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count.max(0) as u64)
    }

    async fn list_posts(&self, scope: PostScope, limit: u64, offset: u64) -> AppResult<Vec<Post>> {
        let mut qb = QueryBuilder::<Sqlite>::new(POST_SELECT);
        push_scope(&mut qb, scope);
        qb.push(" ORDER BY p.pub_date DESC, p.id DESC LIMIT ");
        qb.push_bind(limit as i64);
        qb.push(" OFFSET ");
        qb.push_bind(offset as i64);

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to list posts: {}", e)))?;

        rows.iter().map(post_from_row).collect()
    }

    #[instrument(skip(self, text))]
    async fn create_comment(&self, post_id: i64, author_id: i64, text: &str) -> AppResult<Comment> {
        let result = sqlx::query(
            "INSERT INTO comments (post_id, author_id, text, created) VALUES (?, ?, ?, ?)",
        )
        .bind(post_id)
        .bind(author_id)
        .bind(text)
        .bind(current_time_micros())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to comment on post {}: {}", post_id, e))
        })?;

        let mut qb = QueryBuilder::<Sqlite>::new(COMMENT_SELECT);
        qb.push(" WHERE c.id = ");
        qb.push_bind(result.last_insert_rowid());
        let row = qb.build().fetch_one(&self.pool).await?;
        comment_from_row(&row)
    }

    async fn list_comments(&self, post_id: i64) -> AppResult<Vec<Comment>> {
        let mut qb = QueryBuilder::<Sqlite>::new(COMMENT_SELECT);
        qb.push(" WHERE c.post_id = ");
        qb.push_bind(post_id);
        qb.push(" ORDER BY c.created, c.id");

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(comment_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn create_follow(&self, user_id: i64, author_id: i64) -> AppResult<Option<Follow>> {
        let result = sqlx::query("INSERT OR IGNORE INTO follows (user_id, author_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(author_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(Follow {
            id: result.last_insert_rowid(),
            user_id,
            author_id,
        }))
    }

    #[instrument(skip(self))]
    async fn delete_follow(&self, user_id: i64, author_id: i64) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM follows WHERE user_id = ? AND author_id = ?")
            .bind(user_id)
            .bind(author_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn is_following(&self, user_id: i64, author_id: i64) -> AppResult<bool> {
        Ok(self.count_follows(user_id, author_id).await? > 0)
    }

    async fn count_follows(&self, user_id: i64, author_id: i64) -> AppResult<u64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM follows WHERE user_id = ? AND author_id = ?",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;
        let count: i64 = row.try_get("count")?;
        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> (SqliteDatabase, User, Group) {
        let db = SqliteDatabase::new_in_memory().await.unwrap();
        let user = db.create_user("auth", "hash").await.unwrap();
        let group = db
            .create_group("Название группы", "test-slug", "Тестовое описание")
            .await
            .unwrap();
        (db, user, group)
    }

    #[tokio::test]
    async fn test_create_and_get_post() {
        let (db, user, group) = setup().await;
        let before = chrono::Utc::now();

        let post = db
            .create_post(user.id, NewPost::new("Тестовый текст").group(group.id))
            .await
            .unwrap();

        assert_eq!(post.author, user);
        assert_eq!(post.group.as_ref(), Some(&group));
        assert!(post.pub_date >= before - chrono::Duration::seconds(1));

        let fetched = db.get_post(post.id).await.unwrap().unwrap();
        assert_eq!(fetched, post);
        assert!(db.get_post(post.id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_keeps_author_and_pub_date() {
        let (db, user, group) = setup().await;
        let post = db.create_post(user.id, NewPost::new("first")).await.unwrap();

        let updated = db
            .update_post(post.id, NewPost::new("second").group(group.id))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.text, "second");
        assert_eq!(updated.group.map(|g| g.id), Some(group.id));
        assert_eq!(updated.author, post.author);
        assert_eq!(updated.pub_date, post.pub_date);
        assert!(db.update_post(9999, NewPost::new("x")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_posts_newest_first_by_scope() {
        let (db, user, group) = setup().await;
        let other = db.create_user("other", "hash").await.unwrap();

        for i in 0..5 {
            db.create_post(user.id, NewPost::new(format!("group {}", i)).group(group.id))
                .await
                .unwrap();
        }
        db.create_post(other.id, NewPost::new("no group")).await.unwrap();

        let all = db.list_posts(PostScope::All, 10, 0).await.unwrap();
        assert_eq!(all.len(), 6);
        assert_eq!(all[0].text, "no group");
        assert!(all
            .windows(2)
            .all(|w| (w[0].pub_date, w[0].id) > (w[1].pub_date, w[1].id)));

        assert_eq!(db.count_posts(PostScope::Group(group.id)).await.unwrap(), 5);
        assert_eq!(db.count_posts(PostScope::Author(other.id)).await.unwrap(), 1);

        let page = db.list_posts(PostScope::Group(group.id), 2, 2).await.unwrap();
        let texts: Vec<_> = page.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["group 2", "group 1"]);
    }

    #[tokio::test]
    async fn test_followed_scope() {
        let (db, user, _) = setup().await;
        let follower = db.create_user("follower", "hash").await.unwrap();
        let stranger = db.create_user("stranger", "hash").await.unwrap();
        db.create_post(user.id, NewPost::new("followed")).await.unwrap();
        db.create_post(stranger.id, NewPost::new("not followed")).await.unwrap();

        db.create_follow(follower.id, user.id).await.unwrap();

        let feed = db.list_posts(PostScope::FollowedBy(follower.id), 10, 0).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].text, "followed");
        assert!(db.is_following(follower.id, user.id).await.unwrap());
        assert!(!db.is_following(user.id, follower.id).await.unwrap());

        assert_eq!(db.delete_follow(follower.id, user.id).await.unwrap(), 1);
        assert_eq!(db.delete_follow(follower.id, user.id).await.unwrap(), 0);
        assert_eq!(db.count_follows(follower.id, user.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_deleting_group_keeps_posts() {
        let (db, user, group) = setup().await;
        let post = db
            .create_post(user.id, NewPost::new("survivor").group(group.id))
            .await
            .unwrap();

        assert!(db.delete_group(group.id).await.unwrap());

        let post = db.get_post(post.id).await.unwrap().unwrap();
        assert!(post.group.is_none());
    }

    #[tokio::test]
    async fn test_follow_pair_is_stored_once() {
        let (db, user, _) = setup().await;
        let reader = db.create_user("reader", "hash").await.unwrap();

        let follow = db.create_follow(reader.id, user.id).await.unwrap().unwrap();
        assert_eq!((follow.user_id, follow.author_id), (reader.id, user.id));
        assert!(db.create_follow(reader.id, user.id).await.unwrap().is_none());

        let (a, b) = tokio::join!(
            db.create_follow(user.id, reader.id),
            db.create_follow(user.id, reader.id)
        );
        assert_eq!(
            [a.unwrap(), b.unwrap()].iter().filter(|f| f.is_some()).count(),
            1
        );
        assert_eq!(db.count_follows(reader.id, user.id).await.unwrap(), 1);
        assert_eq!(db.count_follows(user.id, reader.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_deleting_author_cascades() {
        let (db, user, _) = setup().await;
        let reader = db.create_user("reader", "hash").await.unwrap();
        let post = db.create_post(user.id, NewPost::new("doomed")).await.unwrap();
        let kept = db.create_post(reader.id, NewPost::new("kept")).await.unwrap();
        db.create_comment(post.id, reader.id, "nice").await.unwrap();
        db.create_comment(kept.id, user.id, "by the author").await.unwrap();
        db.create_follow(reader.id, user.id).await.unwrap();

        assert!(db.delete_user(user.id).await.unwrap());

        assert!(db.get_post(post.id).await.unwrap().is_none());
        assert!(db.list_comments(kept.id).await.unwrap().is_empty());
        assert_eq!(db.count_follows(reader.id, user.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_deleting_post_cascades_comments() {
        let (db, user, _) = setup().await;
        let post = db.create_post(user.id, NewPost::new("text")).await.unwrap();
        let comment = db.create_comment(post.id, user.id, "Комментарий").await.unwrap();
        assert_eq!(comment.author, user);
        assert_eq!(db.list_comments(post.id).await.unwrap(), vec![comment]);

        db.delete_post(post.id).await.unwrap();
        let left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(left, 0);
    }

    #[tokio::test]
    async fn test_sessions() {
        let (db, user, _) = setup().await;
        let token = db.create_session(user.id).await.unwrap();

        assert_eq!(db.get_session_user(&token).await.unwrap(), Some(user));
        assert!(db.delete_session(&token).await.unwrap());
        assert!(db.get_session_user(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unique_constraints_are_validation_errors() {
        let (db, _, _) = setup().await;

        let err = db.create_user("auth", "hash").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = db.create_group("Again", "test-slug", "").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = db.create_group("Bad", "bad slug", "").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
