use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Folders::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Folders::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Folders::UserId).string().not_null())
                    .col(ColumnDef::new(Folders::Name).string().not_null())
                    .col(ColumnDef::new(Folders::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Folders::UpdatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_folders_user_id")
                            .from(Folders::Table, Folders::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_folders_user_id")
                    .table(Folders::Table)
                    .col(Folders::UserId)
                    .to_owned(),
            )
            .await?;

        // Items are the only stored membership; a folder's post list is derived from them.
        manager
            .create_table(
                Table::create()
                    .table(FolderItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FolderItems::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FolderItems::FolderId).string().not_null())
                    .col(ColumnDef::new(FolderItems::ContentId).string().not_null())
                    .col(ColumnDef::new(FolderItems::ImageUrl).string().not_null())
                    .col(ColumnDef::new(FolderItems::AddedAt).big_integer().not_null())
                    .index(
                        Index::create()
                            .name("uidx_folder_items_folder_content_image")
                            .col(FolderItems::FolderId)
                            .col(FolderItems::ContentId)
                            .col(FolderItems::ImageUrl)
                            .unique(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_folder_items_folder_id")
                            .from(FolderItems::Table, FolderItems::FolderId)
                            .to(Folders::Table, Folders::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_folder_items_content_id")
                            .from(FolderItems::Table, FolderItems::ContentId)
                            .to(Posts::Table, Posts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_folder_items_folder_id")
                    .table(FolderItems::Table)
                    .col(FolderItems::FolderId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse dependency order.
        manager
            .drop_table(Table::drop().table(FolderItems::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Folders::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Posts {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Folders {
    Table,
    Id,
    UserId,
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum FolderItems {
    Table,
    Id,
    FolderId,
    ContentId,
    ImageUrl,
    AddedAt,
}
