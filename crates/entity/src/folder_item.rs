use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One saved image inside a folder.
///
/// The folder's list of distinct posts is derived from these rows on read.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "folder_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub folder_id: String,
    pub content_id: String,
    pub image_url: String,

    /// Unix timestamp (seconds).
    pub added_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::folder::Entity",
        from = "Column::FolderId",
        to = "super::folder::Column::Id",
        on_delete = "Cascade"
    )]
    Folder,
}

impl Related<super::folder::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Folder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
