use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").unwrap());

pub const TITLE_MAX_LENGTH: usize = 200;
pub const SLUG_MAX_LENGTH: usize = 50;

/// A community posts can be published into, addressed by its unique slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl Group {
    pub fn validate_title(title: &str) -> Result<(), &'static str> {
        if title.trim().is_empty() {
            return Err("Group title must not be empty");
        }
        if title.chars().count() > TITLE_MAX_LENGTH {
            return Err("Group title must be at most 200 characters long");
        }
        Ok(())
    }

    pub fn validate_slug(slug: &str) -> Result<(), &'static str> {
        if slug.is_empty() || slug.len() > SLUG_MAX_LENGTH {
            return Err("Slug must be between 1 and 50 characters long");
        }
        if !SLUG_RE.is_match(slug) {
            return Err("Slug must only contain letters, numbers, underscores or hyphens");
        }
        Ok(())
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}
