// Paginator - fixed-size pages over a feed of posts

use serde::Serialize;

use crate::error::AppResult;
use crate::infrastructure::database::DatabaseInterface;
use crate::models::{Post, PostScope};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    count: u64,
    per_page: u64,
}

impl Paginator {
    pub fn new(count: u64, per_page: u64) -> Self {
        Self {
            count,
            per_page: per_page.max(1),
        }
    }

    /// An empty listing still has one (empty) page.
    pub fn num_pages(&self) -> u64 {
        if self.count == 0 {
            1
        } else {
            self.count.div_ceil(self.per_page)
        }
    }

    /// Resolve a raw `?page=` value: anything that is not an integer yields
    /// the first page, integers outside `1..=num_pages` yield the last page.
    pub fn page_number(&self, raw: Option<&str>) -> u64 {
        let Some(value) = raw.map(str::trim) else {
            return 1;
        };
        let num_pages = self.num_pages();

        match value.parse::<i128>() {
            Ok(number) if (1..=i128::from(num_pages)).contains(&number) => number as u64,
            Ok(_) => num_pages,
            Err(_) if is_integer_literal(value) => num_pages,
            Err(_) => 1,
        }
    }

    pub fn offset(&self, number: u64) -> u64 {
        (number.saturating_sub(1)) * self.per_page
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    pub fn page<T>(&self, number: u64, object_list: Vec<T>) -> Page<T> {
        let num_pages = self.num_pages();
        Page {
            object_list,
            number,
            num_pages,
            count: self.count,
            has_next: number < num_pages,
            has_previous: number > 1,
            next_page_number: (number < num_pages).then_some(number + 1),
            previous_page_number: (number > 1).then_some(number - 1),
        }
    }
}

/// Too large for `i128`, but still a number.
fn is_integer_literal(value: &str) -> bool {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// One page of a listing, exposed to templates as `page_obj`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub object_list: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<u64>,
    pub previous_page_number: Option<u64>,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.object_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_list.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.object_list.iter()
    }
}

impl<T> std::ops::Index<usize> for Page<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.object_list[index]
    }
}

/// Fetch the requested page of posts in `scope`, newest first.
pub async fn paginate_posts(
    db: &dyn DatabaseInterface,
    scope: PostScope,
    raw_page: Option<&str>,
    per_page: u64,
) -> AppResult<Page<Post>> {
    let paginator = Paginator::new(db.count_posts(scope).await?, per_page);
    let number = paginator.page_number(raw_page);
    let posts = db
        .list_posts(scope, paginator.per_page(), paginator.offset(number))
        .await?;
    Ok(paginator.page(number, posts))
}
