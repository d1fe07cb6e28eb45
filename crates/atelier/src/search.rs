//! Filtered, paginated listings of posts and users.

use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, ItemsAndPagesNumber, PaginatorTrait,
    QueryFilter, QueryOrder,
};
use serde::Serialize;
use tracing::debug;

use entity::{post, user};

use crate::error::{store, Result};
use crate::text::accent_insensitive_contains;
use crate::util::non_blank;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default: u64,
    pub max: u64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default: 20,
            max: 100,
        }
    }
}

/// 1-based page request with the limit clamped to `1..=limits.max`.
///
/// Only built through [`PageRequest::new`], so `page >= 1` and `limit >= 1` always hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    limit: u64,
}

impl PageRequest {
    pub fn new(page: Option<u64>, limit: Option<u64>, limits: PageLimits) -> Self {
        let max = limits.max.max(1);
        Self {
            page: page.filter(|p| *p > 0).unwrap_or(1),
            limit: limit.unwrap_or(limits.default).clamp(1, max),
        }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Zero-based index for the paginator.
    fn index(&self) -> u64 {
        self.page.saturating_sub(1)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None, PageLimits::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub pages: u64,
}

#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    /// Free text matched against title and description.
    pub q: Option<String>,
    pub category: Option<String>,
    pub author_id: Option<String>,
}

/// `term` in any of `columns`, or `None` if the term is blank.
fn any_contains<C: ColumnTrait>(columns: &[C], term: &str) -> Option<Condition> {
    let mut any = Condition::any();
    for column in columns {
        any = any.add(accent_insensitive_contains(*column, term)?);
    }
    Some(any)
}

pub async fn search_posts(
    db: &DatabaseConnection,
    filter: &PostFilter,
    page: PageRequest,
) -> Result<Page<post::Model>> {
    let mut cond = Condition::all();
    if let Some(q) = filter.q.as_deref() {
        if let Some(text) = any_contains(&[post::Column::Title, post::Column::Description], q) {
            cond = cond.add(text);
        }
    }
    if let Some(category) = filter.category.as_deref() {
        if let Some(expr) = accent_insensitive_contains(post::Column::Category, category) {
            cond = cond.add(expr);
        }
    }
    if let Some(author_id) = filter.author_id.as_deref().and_then(non_blank) {
        cond = cond.add(post::Column::UserId.eq(author_id));
    }

    let paginator = post::Entity::find()
        .filter(cond)
        .order_by_desc(post::Column::CreatedAt)
        .order_by_asc(post::Column::Id)
        .paginate(db, page.limit);

    let ItemsAndPagesNumber {
        number_of_items,
        number_of_pages,
    } = paginator
        .num_items_and_pages()
        .await
        .map_err(store("Failed to count posts"))?;
    let items = paginator
        .fetch_page(page.index())
        .await
        .map_err(store("Failed to fetch posts"))?;

    debug!(?filter, page = page.page, total = number_of_items, "Post search");
    Ok(Page {
        items,
        total: number_of_items,
        page: page.page,
        limit: page.limit,
        pages: number_of_pages,
    })
}

pub async fn search_users(
    db: &DatabaseConnection,
    q: Option<&str>,
    page: PageRequest,
) -> Result<Page<user::Model>> {
    let mut query = user::Entity::find();
    if let Some(text) = q.and_then(|q| any_contains(&[user::Column::Username, user::Column::Name], q)) {
        query = query.filter(text);
    }

    let paginator = query
        .order_by_asc(user::Column::Username)
        .paginate(db, page.limit);

    let ItemsAndPagesNumber {
        number_of_items,
        number_of_pages,
    } = paginator
        .num_items_and_pages()
        .await
        .map_err(store("Failed to count users"))?;
    let items = paginator
        .fetch_page(page.index())
        .await
        .map_err(store("Failed to fetch users"))?;

    Ok(Page {
        items,
        total: number_of_items,
        page: page.page,
        limit: page.limit,
        pages: number_of_pages,
    })
}
