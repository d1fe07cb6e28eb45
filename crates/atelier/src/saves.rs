//! Saved images: the flat Favorites set and named Folders.
//!
//! A `(user, post, image)` tuple lives in exactly one place at a time. Filing an image
//! into a folder takes it out of Favorites; taking it out of a folder (or deleting the
//! folder) puts it back. Every mutation runs in one transaction and only uses row-level
//! insert-if-absent / delete-by-match statements, so concurrent edits of the same folder
//! commute instead of overwriting each other.

use std::collections::{HashMap, HashSet};

use sea_orm::sea_query::{Expr, OnConflict, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{debug, info};

use entity::{favorite, folder, folder_item, user};

use crate::error::{store, Error, Result};
use crate::text::build_matcher;
use crate::util::{non_blank, now_ts, serialize_opt_ts, serialize_ts, uuid_v4};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderItem {
    pub content_id: String,
    pub image_url: String,
    #[serde(serialize_with = "serialize_ts")]
    pub added_at: i64,
}

/// A folder as clients see it. `posts` is derived from `items`, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderView {
    pub id: String,
    pub name: String,
    pub items: Vec<FolderItem>,
    pub posts: Vec<String>,
    #[serde(serialize_with = "serialize_ts")]
    pub created_at: i64,
    #[serde(serialize_with = "serialize_ts")]
    pub updated_at: i64,
}

impl FolderView {
    fn new(f: folder::Model, rows: Vec<folder_item::Model>) -> Self {
        let mut seen = HashSet::new();
        let mut posts = Vec::new();
        let items = rows
            .into_iter()
            .map(|row| {
                if seen.insert(row.content_id.clone()) {
                    posts.push(row.content_id.clone());
                }
                FolderItem {
                    content_id: row.content_id,
                    image_url: row.image_url,
                    added_at: row.added_at,
                }
            })
            .collect();

        Self {
            id: f.id,
            name: f.name,
            items,
            posts,
            created_at: f.created_at,
            updated_at: f.updated_at,
        }
    }

    pub fn contains(&self, content_id: &str, image_url: &str) -> bool {
        self.items
            .iter()
            .any(|i| i.content_id == content_id && i.image_url == image_url)
    }
}

/// One entry of a user's Favorites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FavoriteEntry {
    /// Whole-post reference from before images were saved individually.
    Legacy(String),
    #[serde(rename_all = "camelCase")]
    Image {
        content_id: String,
        saved_image: String,
        #[serde(serialize_with = "serialize_opt_ts")]
        saved_at: Option<i64>,
    },
}

impl FavoriteEntry {
    pub fn content_id(&self) -> &str {
        match self {
            FavoriteEntry::Legacy(id) => id,
            FavoriteEntry::Image { content_id, .. } => content_id,
        }
    }

    pub fn is_image(&self, content_id: &str, image_url: &str) -> bool {
        matches!(
            self,
            FavoriteEntry::Image { content_id: c, saved_image: i, .. }
                if c == content_id && i == image_url
        )
    }
}

impl From<favorite::Model> for FavoriteEntry {
    fn from(m: favorite::Model) -> Self {
        match m.saved_image {
            Some(saved_image) => FavoriteEntry::Image {
                content_id: m.content_id,
                saved_image,
                saved_at: m.saved_at,
            },
            None => FavoriteEntry::Legacy(m.content_id),
        }
    }
}

/// Where a saved image currently lives for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "folderId", rename_all = "camelCase")]
pub enum SaveState {
    Unsaved,
    Favorited,
    InFolder(String),
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str> {
    non_blank(value).ok_or_else(|| Error::invalid(field, "is required"))
}

fn folder_name(raw: &str) -> Result<&str> {
    non_blank(raw).ok_or_else(|| Error::invalid("name", "Folder name cannot be blank"))
}

/// Open a transaction for a mutation of `user_id`'s saves.
///
/// The first statement writes the user's row, so the transaction holds the write lock
/// before it reads anything. Concurrent mutations of the same user queue up here instead
/// of deadlocking on a read-to-write upgrade.
async fn begin(db: &DatabaseConnection, user_id: &str) -> Result<DatabaseTransaction> {
    let txn = db.begin().await.map_err(store("Failed to begin transaction"))?;
    user::Entity::update_many()
        .col_expr(user::Column::UpdatedAt, SimpleExpr::from(Expr::col(user::Column::UpdatedAt)))
        .filter(user::Column::Id.eq(user_id))
        .exec(&txn)
        .await
        .map_err(store("Failed to lock user"))?;
    Ok(txn)
}

async fn commit(txn: DatabaseTransaction) -> Result<()> {
    txn.commit().await.map_err(store("Failed to commit transaction"))
}

async fn touch_user_revision<C: ConnectionTrait>(db: &C, user_id: &str, now: i64) -> Result<()> {
    user::Entity::update_many()
        .col_expr(user::Column::UpdatedAt, Expr::value(now))
        .filter(user::Column::Id.eq(user_id))
        .exec(db)
        .await
        .map_err(store("Failed to touch user revision"))?;
    Ok(())
}

async fn touch_folder<C: ConnectionTrait>(db: &C, f: &mut folder::Model, now: i64) -> Result<()> {
    folder::Entity::update_many()
        .col_expr(folder::Column::UpdatedAt, Expr::value(now))
        .filter(folder::Column::Id.eq(f.id.as_str()))
        .exec(db)
        .await
        .map_err(store("Failed to touch folder"))?;
    f.updated_at = now;
    Ok(())
}

/// Load a folder only if `user_id` owns it. Missing and foreign folders look the same.
async fn owned_folder<C: ConnectionTrait>(db: &C, user_id: &str, folder_id: &str) -> Result<folder::Model> {
    folder::Entity::find_by_id(folder_id.to_string())
        .filter(folder::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(store("Failed to load folder"))?
        .ok_or(Error::NotFound("folder"))
}

async fn folder_rows<C: ConnectionTrait>(db: &C, folder_id: &str) -> Result<Vec<folder_item::Model>> {
    folder_item::Entity::find()
        .filter(folder_item::Column::FolderId.eq(folder_id))
        .order_by_asc(folder_item::Column::AddedAt)
        .order_by_asc(folder_item::Column::Id)
        .all(db)
        .await
        .map_err(store("Failed to load folder items"))
}

/// Insert a structured favorite unless the same `(user, post, image)` already exists.
/// Returns whether a row was written.
async fn insert_favorite<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    content_id: &str,
    image_url: &str,
    now: i64,
) -> Result<bool> {
    let active = favorite::ActiveModel {
        id: NotSet,
        user_id: Set(user_id.to_string()),
        content_id: Set(content_id.to_string()),
        saved_image: Set(Some(image_url.to_string())),
        saved_at: Set(Some(now)),
    };

    let inserted = favorite::Entity::insert(active)
        .on_conflict(
            OnConflict::columns([
                favorite::Column::UserId,
                favorite::Column::ContentId,
                favorite::Column::SavedImage,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(db)
        .await
        .map_err(store("Failed to insert favorite"))?;

    Ok(inserted > 0)
}

/// The user's folder currently holding this image, oldest filing first.
async fn folder_holding<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    content_id: &str,
    image_url: &str,
) -> Result<Option<String>> {
    let row = folder_item::Entity::find()
        .inner_join(folder::Entity)
        .filter(folder::Column::UserId.eq(user_id))
        .filter(folder_item::Column::ContentId.eq(content_id))
        .filter(folder_item::Column::ImageUrl.eq(image_url))
        .order_by_asc(folder_item::Column::AddedAt)
        .order_by_asc(folder_item::Column::Id)
        .one(db)
        .await
        .map_err(store("Failed to look up folder item"))?;

    Ok(row.map(|r| r.folder_id))
}

pub async fn create_folder(db: &DatabaseConnection, user_id: &str, name: &str) -> Result<FolderView> {
    let name = folder_name(name)?;
    let now = now_ts();

    let active = folder::ActiveModel {
        id: Set(uuid_v4()),
        user_id: Set(user_id.to_string()),
        name: Set(name.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let txn = begin(db, user_id).await?;
    let created = active
        .insert(&txn)
        .await
        .map_err(store("Failed to create folder"))?;
    touch_user_revision(&txn, user_id, now).await?;
    commit(txn).await?;

    debug!(user_id, folder_id = %created.id, "Folder created");
    Ok(FolderView::new(created, Vec::new()))
}

pub async fn rename_folder(
    db: &DatabaseConnection,
    user_id: &str,
    folder_id: &str,
    name: &str,
) -> Result<FolderView> {
    let folder_id = required("folderId", folder_id)?;
    let name = folder_name(name)?;

    let txn = begin(db, user_id).await?;
    let found = owned_folder(&txn, user_id, folder_id).await?;

    let now = now_ts();
    let mut active: folder::ActiveModel = found.into();
    active.name = Set(name.to_string());
    active.updated_at = Set(now);

    let updated = active
        .update(&txn)
        .await
        .map_err(store("Failed to rename folder"))?;
    touch_user_revision(&txn, user_id, now).await?;
    let rows = folder_rows(&txn, folder_id).await?;
    commit(txn).await?;

    Ok(FolderView::new(updated, rows))
}

pub async fn get_folder(db: &DatabaseConnection, user_id: &str, folder_id: &str) -> Result<FolderView> {
    let folder_id = required("folderId", folder_id)?;
    let found = owned_folder(db, user_id, folder_id).await?;
    let rows = folder_rows(db, folder_id).await?;
    Ok(FolderView::new(found, rows))
}

/// All of a user's folders, oldest first, optionally narrowed by an accent-insensitive
/// match on the name.
pub async fn list_folders(
    db: &DatabaseConnection,
    user_id: &str,
    name_filter: Option<&str>,
) -> Result<Vec<FolderView>> {
    let matcher = build_matcher(name_filter.unwrap_or_default());

    let folders: Vec<folder::Model> = folder::Entity::find()
        .filter(folder::Column::UserId.eq(user_id))
        .order_by_asc(folder::Column::CreatedAt)
        .order_by_asc(folder::Column::Id)
        .all(db)
        .await
        .map_err(store("Failed to list folders"))?
        .into_iter()
        .filter(|f| matcher.is_match(&f.name))
        .collect();

    if folders.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<String> = folders.iter().map(|f| f.id.clone()).collect();
    let mut by_folder: HashMap<String, Vec<folder_item::Model>> = HashMap::new();
    for row in folder_item::Entity::find()
        .filter(folder_item::Column::FolderId.is_in(ids))
        .order_by_asc(folder_item::Column::AddedAt)
        .order_by_asc(folder_item::Column::Id)
        .all(db)
        .await
        .map_err(store("Failed to load folder items"))?
    {
        by_folder.entry(row.folder_id.clone()).or_default().push(row);
    }

    Ok(folders
        .into_iter()
        .map(|f| {
            let rows = by_folder.remove(&f.id).unwrap_or_default();
            FolderView::new(f, rows)
        })
        .collect())
}

/// File an image into a folder, taking it out of Favorites.
///
/// Filing an image that is already in the folder changes nothing (its `addedAt` is kept).
/// Only the structured favorite for this exact image is removed; legacy whole-post
/// favorites stay.
pub async fn add_to_folder(
    db: &DatabaseConnection,
    user_id: &str,
    folder_id: &str,
    content_id: &str,
    image_url: &str,
) -> Result<FolderView> {
    let folder_id = required("folderId", folder_id)?;
    let content_id = required("postId", content_id)?;
    let image_url = required("imageUrl", image_url)?;

    let txn = begin(db, user_id).await?;
    let mut found = owned_folder(&txn, user_id, folder_id).await?;
    let now = now_ts();

    let item = folder_item::ActiveModel {
        id: NotSet,
        folder_id: Set(found.id.clone()),
        content_id: Set(content_id.to_string()),
        image_url: Set(image_url.to_string()),
        added_at: Set(now),
    };

    let inserted = folder_item::Entity::insert(item)
        .on_conflict(
            OnConflict::columns([
                folder_item::Column::FolderId,
                folder_item::Column::ContentId,
                folder_item::Column::ImageUrl,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(&txn)
        .await
        .map_err(store("Failed to add folder item"))?;

    let unfavorited = favorite::Entity::delete_many()
        .filter(favorite::Column::UserId.eq(user_id))
        .filter(favorite::Column::ContentId.eq(content_id))
        .filter(favorite::Column::SavedImage.eq(image_url))
        .exec(&txn)
        .await
        .map_err(store("Failed to remove favorite"))?
        .rows_affected;

    if inserted > 0 || unfavorited > 0 {
        if inserted > 0 {
            touch_folder(&txn, &mut found, now).await?;
        }
        touch_user_revision(&txn, user_id, now).await?;
    }

    let rows = folder_rows(&txn, folder_id).await?;
    commit(txn).await?;

    debug!(user_id, folder_id, content_id, image_url, inserted, unfavorited, "Image filed into folder");
    Ok(FolderView::new(found, rows))
}

/// Take an image (or, without `image_url`, every image of a post) out of a folder.
///
/// A single image goes back to Favorites. The whole-post form only detaches the post and
/// does not restore anything to Favorites.
pub async fn remove_from_folder(
    db: &DatabaseConnection,
    user_id: &str,
    folder_id: &str,
    content_id: &str,
    image_url: Option<&str>,
) -> Result<FolderView> {
    let folder_id = required("folderId", folder_id)?;
    let content_id = required("postId", content_id)?;

    let txn = begin(db, user_id).await?;
    let mut found = owned_folder(&txn, user_id, folder_id).await?;
    let now = now_ts();

    let mut delete = folder_item::Entity::delete_many()
        .filter(folder_item::Column::FolderId.eq(found.id.as_str()))
        .filter(folder_item::Column::ContentId.eq(content_id));
    let image_url = image_url.and_then(non_blank);
    if let Some(image_url) = image_url {
        delete = delete.filter(folder_item::Column::ImageUrl.eq(image_url));
    }

    let removed = delete
        .exec(&txn)
        .await
        .map_err(store("Failed to remove folder item"))?
        .rows_affected;

    let mut restored = false;
    if removed > 0 {
        if let Some(image_url) = image_url {
            restored = insert_favorite(&txn, user_id, content_id, image_url, now).await?;
        }
        touch_folder(&txn, &mut found, now).await?;
        touch_user_revision(&txn, user_id, now).await?;
    }

    let rows = folder_rows(&txn, folder_id).await?;
    commit(txn).await?;

    debug!(user_id, folder_id, content_id, ?image_url, removed, restored, "Removed from folder");
    Ok(FolderView::new(found, rows))
}

/// Delete a folder, returning every image it held to Favorites first.
///
/// Re-insertion skips images already favorited, so re-running after an interrupted
/// delete never duplicates entries. Returns the user's Favorites afterwards.
pub async fn delete_folder(
    db: &DatabaseConnection,
    user_id: &str,
    folder_id: &str,
) -> Result<Vec<FavoriteEntry>> {
    let folder_id = required("folderId", folder_id)?;

    let txn = begin(db, user_id).await?;
    let found = owned_folder(&txn, user_id, folder_id).await?;
    let rows = folder_rows(&txn, &found.id).await?;
    let now = now_ts();

    let mut restored = 0usize;
    for row in &rows {
        if insert_favorite(&txn, user_id, &row.content_id, &row.image_url, now).await? {
            restored += 1;
        }
    }

    folder_item::Entity::delete_many()
        .filter(folder_item::Column::FolderId.eq(found.id.as_str()))
        .exec(&txn)
        .await
        .map_err(store("Failed to delete folder items"))?;

    folder::Entity::delete_many()
        .filter(folder::Column::Id.eq(found.id.as_str()))
        .filter(folder::Column::UserId.eq(user_id))
        .exec(&txn)
        .await
        .map_err(store("Failed to delete folder"))?;

    touch_user_revision(&txn, user_id, now).await?;
    commit(txn).await?;

    info!(user_id, folder_id, items = rows.len(), restored, "Folder deleted");
    list_favorites(db, user_id).await
}

pub async fn list_favorites(db: &DatabaseConnection, user_id: &str) -> Result<Vec<FavoriteEntry>> {
    let rows = favorite::Entity::find()
        .filter(favorite::Column::UserId.eq(user_id))
        .order_by_asc(favorite::Column::Id)
        .all(db)
        .await
        .map_err(store("Failed to list favorites"))?;

    Ok(rows.into_iter().map(FavoriteEntry::from).collect())
}

/// Favorite an image. Images already filed into one of the user's folders stay there.
pub async fn favorite(
    db: &DatabaseConnection,
    user_id: &str,
    content_id: &str,
    image_url: &str,
) -> Result<SaveState> {
    let content_id = required("postId", content_id)?;
    let image_url = required("imageUrl", image_url)?;

    let txn = begin(db, user_id).await?;
    if let Some(folder_id) = folder_holding(&txn, user_id, content_id, image_url).await? {
        commit(txn).await?;
        return Ok(SaveState::InFolder(folder_id));
    }

    let now = now_ts();
    if insert_favorite(&txn, user_id, content_id, image_url, now).await? {
        touch_user_revision(&txn, user_id, now).await?;
    }
    commit(txn).await?;

    Ok(SaveState::Favorited)
}

/// Drop a favorite. Without `image_url`, every favorite for the post goes, legacy form
/// included. Returns how many entries were removed.
pub async fn unfavorite(
    db: &DatabaseConnection,
    user_id: &str,
    content_id: &str,
    image_url: Option<&str>,
) -> Result<u64> {
    let content_id = required("postId", content_id)?;

    let mut delete = favorite::Entity::delete_many()
        .filter(favorite::Column::UserId.eq(user_id))
        .filter(favorite::Column::ContentId.eq(content_id));
    if let Some(image_url) = image_url.and_then(non_blank) {
        delete = delete.filter(favorite::Column::SavedImage.eq(image_url));
    }

    let txn = begin(db, user_id).await?;
    let removed = delete
        .exec(&txn)
        .await
        .map_err(store("Failed to remove favorite"))?
        .rows_affected;
    if removed > 0 {
        touch_user_revision(&txn, user_id, now_ts()).await?;
    }
    commit(txn).await?;

    Ok(removed)
}

pub async fn save_state(
    db: &DatabaseConnection,
    user_id: &str,
    content_id: &str,
    image_url: &str,
) -> Result<SaveState> {
    let content_id = required("postId", content_id)?;
    let image_url = required("imageUrl", image_url)?;

    if let Some(folder_id) = folder_holding(db, user_id, content_id, image_url).await? {
        return Ok(SaveState::InFolder(folder_id));
    }

    let favorited = favorite::Entity::find()
        .filter(favorite::Column::UserId.eq(user_id))
        .filter(favorite::Column::ContentId.eq(content_id))
        .filter(favorite::Column::SavedImage.eq(image_url))
        .one(db)
        .await
        .map_err(store("Failed to look up favorite"))?
        .is_some();

    Ok(if favorited {
        SaveState::Favorited
    } else {
        SaveState::Unsaved
    })
}
