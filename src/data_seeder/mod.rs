// Data Seeder - fills an empty database with demo users, groups and posts

use tracing::info;

use crate::{
    error::AppResult,
    infrastructure::{database::DatabaseInterface, security::hash_password},
    models::NewPost,
};

pub const SAMPLE_PASSWORD: &str = "yatube-demo";

const SAMPLE_USERS: &[&str] = &["leo", "anna", "fyodor", "ivan", "marina"];

const SAMPLE_GROUPS: &[(&str, &str, &str)] = &[
    ("Лев Толстой", "tolstoy", "Группа поклонников графа"),
    ("Поэзия", "poetry", "Стихи участников"),
    ("Путешествия", "travel", "Заметки о поездках"),
];

const SAMPLE_POSTS: &[(usize, Option<usize>, &str)] = &[
    (0, Some(0), "Все счастливые семьи похожи друг на друга"),
    (1, Some(1), "Я помню чудное мгновенье"),
    (2, None, "Красота спасёт мир"),
    (3, Some(2), "Утро в горах, туман над долиной"),
    (4, Some(1), "Мне нравится, что вы больны не мной"),
    (0, None, "Если ищешь совершенства, никогда не будешь доволен"),
    (2, Some(2), "Белые ночи в Петербурге"),
    (3, None, "Записки охотника, глава первая"),
];

const SAMPLE_FOLLOWS: &[(usize, usize)] = &[(1, 0), (2, 0), (3, 1), (4, 2), (0, 4)];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub groups: usize,
    pub posts: usize,
    pub comments: usize,
    pub follows: usize,
}

/// Seed demo content. Does nothing when the first sample user already exists.
pub async fn seed_sample_data(db: &dyn DatabaseInterface) -> AppResult<SeedSummary> {
    let mut summary = SeedSummary::default();

    if db.get_user_by_username(SAMPLE_USERS[0]).await?.is_some() {
        info!("Sample data already present, skipping");
        return Ok(summary);
    }

    let password_hash = hash_password(SAMPLE_PASSWORD)?;
    let mut users = Vec::with_capacity(SAMPLE_USERS.len());
    for username in SAMPLE_USERS {
        users.push(db.create_user(username, &password_hash).await?);
    }
    summary.users = users.len();

    let mut groups = Vec::with_capacity(SAMPLE_GROUPS.len());
    for (title, slug, description) in SAMPLE_GROUPS {
        groups.push(db.create_group(title, slug, description).await?);
    }
    summary.groups = groups.len();

    let mut posts = Vec::with_capacity(SAMPLE_POSTS.len());
    for (author, group, text) in SAMPLE_POSTS {
        let mut new_post = NewPost::new(*text);
        if let Some(group) = group {
            new_post = new_post.group(groups[*group].id);
        }
        posts.push(db.create_post(users[*author].id, new_post).await?);
    }
    summary.posts = posts.len();

    for (i, post) in posts.iter().enumerate() {
        // every other post gets a comment from the next user
        if i % 2 == 0 {
            let commenter = &users[(i + 1) % users.len()];
            db.create_comment(post.id, commenter.id, "Отличная запись!")
                .await?;
            summary.comments += 1;
        }
    }

    for (user, author) in SAMPLE_FOLLOWS {
        if db.create_follow(users[*user].id, users[*author].id).await?.is_some() {
            summary.follows += 1;
        }
    }

    info!(
        "Seeded {} users, {} groups, {} posts, {} comments, {} follows",
        summary.users, summary.groups, summary.posts, summary.comments, summary.follows
    );
    Ok(summary)
}
