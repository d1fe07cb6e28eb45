pub use sea_orm_migration::prelude::*;

mod m20260301_000001_users_and_posts;
mod m20260301_000002_favorites;
mod m20260301_000003_folders;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_users_and_posts::Migration),
            Box::new(m20260301_000002_favorites::Migration),
            Box::new(m20260301_000003_folders::Migration),
        ]
    }
}
