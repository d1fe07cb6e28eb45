#![allow(dead_code)]

use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, DatabaseConnection, Set};

use atelier::{db, Config};
use entity::{favorite, post, user};

/// Fresh in-memory database with the schema applied and nothing else.
///
/// Every connection of the pool opens the same shared in-memory database, so
/// `max_connections > 1` gives truly concurrent transactions.
pub async fn empty_db(max_connections: u32) -> DatabaseConnection {
    let max_connections = max_connections.to_string();
    let config = Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("sqlite::memory:".to_string()),
        "DB_MAX_CONNECTIONS" => Some(max_connections.clone()),
        _ => None,
    })
    .unwrap();

    let conn = db::connect(&config).await.unwrap();
    db::migrate(&conn, None).await.unwrap();
    conn
}

/// Seeded database on a single connection: two users (`u1`, `u2`) who each own a
/// couple of posts.
pub async fn setup() -> DatabaseConnection {
    let conn = empty_db(1).await;
    seed(&conn).await;
    conn
}

/// Same seed data, on a pool of `max_connections`.
pub async fn setup_pool(max_connections: u32) -> DatabaseConnection {
    let conn = empty_db(max_connections).await;
    seed(&conn).await;
    conn
}

async fn seed(conn: &DatabaseConnection) {
    add_user(conn, "u1", "lucia", Some("Lucía Peña")).await;
    add_user(conn, "u2", "marco", None).await;

    add_post(conn, "c1", "u1", "Café con leche", Some("acuarela sobre papel"), Some("Ilustración"), 100).await;
    add_post(conn, "c2", "u1", "Retrato", None, Some("Fotografía"), 200).await;
    add_post(conn, "c3", "u2", "Niño en la playa", Some("Óleo, 50% terminado"), Some("Pintura"), 300).await;
}

pub async fn add_user(db: &DatabaseConnection, id: &str, username: &str, name: Option<&str>) {
    user::ActiveModel {
        id: Set(id.to_string()),
        username: Set(username.to_string()),
        name: Set(name.map(str::to_string)),
        email: Set(format!("{username}@example.com")),
        created_at: Set(0),
        updated_at: Set(0),
    }
    .insert(db)
    .await
    .unwrap();
}

pub async fn add_post(
    db: &DatabaseConnection,
    id: &str,
    user_id: &str,
    title: &str,
    description: Option<&str>,
    category: Option<&str>,
    created_at: i64,
) {
    post::ActiveModel {
        id: Set(id.to_string()),
        user_id: Set(user_id.to_string()),
        title: Set(title.to_string()),
        description: Set(description.map(str::to_string)),
        category: Set(category.map(str::to_string)),
        images: Set("[]".to_string()),
        created_at: Set(created_at),
        updated_at: Set(created_at),
    }
    .insert(db)
    .await
    .unwrap();
}

/// Legacy whole-post favorite, as older clients stored them.
pub async fn add_legacy_favorite(db: &DatabaseConnection, user_id: &str, content_id: &str) {
    favorite::ActiveModel {
        id: NotSet,
        user_id: Set(user_id.to_string()),
        content_id: Set(content_id.to_string()),
        saved_image: Set(None),
        saved_at: Set(None),
    }
    .insert(db)
    .await
    .unwrap();
}
