use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User-authored content that owns one or more images.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Author.
    pub user_id: String,

    pub title: String,

    pub description: Option<String>,

    /// Free-form discipline tag ("ilustración", "fotografía", ...).
    pub category: Option<String>,

    /// JSON array of image URLs.
    pub images: String,

    /// Unix timestamp (seconds).
    pub created_at: i64,

    /// Unix timestamp (seconds).
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
