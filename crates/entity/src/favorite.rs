use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-user saved images that are not filed into any folder.
///
/// Rows without `saved_image` are the legacy form that referenced a whole post.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "favorites")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub user_id: String,

    pub content_id: String,

    pub saved_image: Option<String>,

    /// Unix timestamp (seconds).
    pub saved_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
