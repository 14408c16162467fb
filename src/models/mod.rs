// Yatube data model - plain records mapped from the relational store

pub mod follow;
pub mod group;
pub mod post;
pub mod user;

pub use follow::Follow;
pub use group::Group;
pub use post::{Comment, NewPost, Post, PostScope};
pub use user::User;

use chrono::{DateTime, Utc};

/// Current time in microseconds since the Unix epoch, the storage format of
/// every timestamp column.
pub fn current_time_micros() -> i64 {
    Utc::now().timestamp_micros()
}

pub fn datetime_from_micros(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap_or_default()
}
