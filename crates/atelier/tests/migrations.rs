mod common;

use migration::{Migrator, MigratorTrait};

use atelier::db;

use common::empty_db;

#[tokio::test]
async fn schema_rolls_back_and_reapplies() {
    let conn = empty_db(1).await;
    assert!(db::pending_migrations(&conn).await.unwrap().is_empty());

    Migrator::down(&conn, None).await.unwrap();
    assert_eq!(db::pending_migrations(&conn).await.unwrap().len(), 3);

    assert_eq!(db::migrate(&conn, Some(2)).await.unwrap(), 2);
    assert_eq!(db::migrate(&conn, None).await.unwrap(), 1);
    assert_eq!(db::migrate(&conn, None).await.unwrap(), 0);
}
