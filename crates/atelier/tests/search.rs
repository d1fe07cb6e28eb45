mod common;

use atelier::search::{search_posts, search_users, PageLimits, PageRequest, PostFilter};

use common::setup;

fn query(q: &str) -> PostFilter {
    PostFilter {
        q: Some(q.to_string()),
        ..PostFilter::default()
    }
}

async fn ids(db: &sea_orm::DatabaseConnection, filter: PostFilter) -> Vec<String> {
    search_posts(db, &filter, PageRequest::default())
        .await
        .unwrap()
        .items
        .into_iter()
        .map(|p| p.id)
        .collect()
}

#[tokio::test]
async fn text_search_ignores_case_and_accents() {
    let db = setup().await;

    assert_eq!(ids(&db, query("CAFE")).await, vec!["c1"]);
    assert_eq!(ids(&db, query("café")).await, vec!["c1"]);
    assert_eq!(ids(&db, query("nino")).await, vec!["c3"]);
    assert_eq!(ids(&db, query("NIÑO")).await, vec!["c3"]);
    // Description matches too.
    assert_eq!(ids(&db, query("oleo")).await, vec!["c3"]);
    assert_eq!(ids(&db, query("acuarela")).await, vec!["c1"]);
    assert!(ids(&db, query("escultura")).await.is_empty());
}

#[tokio::test]
async fn like_wildcards_in_the_term_are_literal() {
    let db = setup().await;

    assert_eq!(ids(&db, query("50%")).await, vec!["c3"]);
    assert!(ids(&db, query("5_%")).await.is_empty());
    assert!(ids(&db, query("caf%leche")).await.is_empty());
}

#[tokio::test]
async fn store_folding_covers_spanish_accents_only() {
    let db = setup().await;
    common::add_post(&db, "c4", "u2", "Pingüino", None, None, 400).await;

    assert_eq!(ids(&db, query("ping")).await, vec!["c4"]);
    assert!(ids(&db, query("pingüino")).await.is_empty());
    assert!(ids(&db, query("pinguino")).await.is_empty());
    assert!(atelier::text::build_matcher("pinguino").is_match("Pingüino"));
}

#[tokio::test]
async fn blank_term_means_no_filter() {
    let db = setup().await;

    assert_eq!(ids(&db, query("   ")).await, vec!["c3", "c2", "c1"]);
    assert_eq!(ids(&db, PostFilter::default()).await, vec!["c3", "c2", "c1"]);
}

#[tokio::test]
async fn filters_combine() {
    let db = setup().await;

    let by_category = PostFilter {
        category: Some("fotografia".to_string()),
        ..PostFilter::default()
    };
    assert_eq!(ids(&db, by_category).await, vec!["c2"]);

    let by_author = PostFilter {
        author_id: Some("u1".to_string()),
        ..PostFilter::default()
    };
    assert_eq!(ids(&db, by_author).await, vec!["c2", "c1"]);

    let both = PostFilter {
        q: Some("retrato".to_string()),
        author_id: Some("u2".to_string()),
        ..PostFilter::default()
    };
    assert!(ids(&db, both).await.is_empty());
}

#[tokio::test]
async fn pages_through_results() {
    let db = setup().await;
    let limits = PageLimits::default();

    let first = search_posts(&db, &PostFilter::default(), PageRequest::new(Some(1), Some(2), limits))
        .await
        .unwrap();
    assert_eq!(first.total, 3);
    assert_eq!(first.pages, 2);
    assert_eq!(first.limit, 2);
    assert_eq!(
        first.items.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
        vec!["c3", "c2"]
    );

    let second = search_posts(&db, &PostFilter::default(), PageRequest::new(Some(2), Some(2), limits))
        .await
        .unwrap();
    assert_eq!(second.page, 2);
    assert_eq!(
        second.items.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
        vec!["c1"]
    );

    let past_end = search_posts(&db, &PostFilter::default(), PageRequest::new(Some(9), Some(2), limits))
        .await
        .unwrap();
    assert!(past_end.items.is_empty());
    assert_eq!(past_end.total, 3);

    let zeroes = search_posts(&db, &PostFilter::default(), PageRequest::new(Some(0), Some(0), limits))
        .await
        .unwrap();
    assert_eq!((zeroes.page, zeroes.limit, zeroes.pages), (1, 1, 3));
    assert_eq!(zeroes.items[0].id, "c3");
}

#[tokio::test]
async fn user_search_matches_username_or_name() {
    let db = setup().await;
    let page = PageRequest::default();

    let found = search_users(&db, Some("lucia"), page).await.unwrap();
    assert_eq!(found.items.len(), 1);
    assert_eq!(found.items[0].id, "u1");

    let found = search_users(&db, Some("PENA"), page).await.unwrap();
    assert_eq!(found.items[0].id, "u1");

    let found = search_users(&db, Some("marco"), page).await.unwrap();
    assert_eq!(found.items[0].id, "u2");

    let all = search_users(&db, None, page).await.unwrap();
    assert_eq!(all.total, 2);
    assert_eq!(all.items[0].username, "lucia");
}

#[tokio::test]
async fn pages_serialize_camel_case() {
    let db = setup().await;
    let page = search_posts(&db, &query("retrato"), PageRequest::default())
        .await
        .unwrap();

    let json = serde_json::to_value(&page).unwrap();
    assert_eq!(json["total"], 1);
    assert_eq!(json["pages"], 1);
    assert_eq!(json["items"][0]["title"], "Retrato");
}
