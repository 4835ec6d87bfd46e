use chrono::{TimeZone, Utc};
use httpmock::prelude::*;

use dada_studio::content::actions::{self, CreateArticleError, TAGS_FAILED};
use dada_studio::content::model::NewArticle;
use dada_studio::content::store::ContentStore;

fn store_for(server: &MockServer) -> ContentStore {
    ContentStore::new(&server.base_url(), &server.base_url(), "test-key")
}

fn new_article(published: bool, tags: Vec<i64>) -> NewArticle {
    NewArticle {
        title: "Rust 在 Web 团队的落地".to_string(),
        slug: "rust-adoption".to_string(),
        content: "word ".repeat(400).trim_end().to_string(),
        excerpt: None,
        cover_image: None,
        category_id: Some(2),
        tags,
        published,
    }
}

#[tokio::test]
async fn publishing_sets_timestamp_and_redirect() {
    let server = MockServer::start_async().await;
    let insert = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/articles")
                .query_param("select", "id")
                .header("Prefer", "return=representation")
                .header("apikey", "test-key")
                .json_body_partial(r#"{ "slug": "rust-adoption", "read_time_minutes": 2 }"#);
            then.status(201).json_body(serde_json::json!([{ "id": 41 }]));
        })
        .await;

    let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    let created = actions::create_article(&store_for(&server), &new_article(true, vec![]), now)
        .await
        .expect("create");

    insert.assert_async().await;
    assert_eq!(created.id, 41);
    assert_eq!(created.published_at, Some(now));
    assert_eq!(created.redirect.as_deref(), Some("/blog/rust-adoption"));
}

#[tokio::test]
async fn draft_gets_null_timestamp_and_no_redirect() {
    let server = MockServer::start_async().await;
    let insert = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/articles")
                .json_body_partial(r#"{ "published_at": null }"#);
            then.status(201).json_body(serde_json::json!([{ "id": 42 }]));
        })
        .await;

    let created = actions::create_article(&store_for(&server), &new_article(false, vec![]), Utc::now())
        .await
        .expect("create");

    insert.assert_async().await;
    assert_eq!(created.published_at, None);
    assert_eq!(created.redirect, None);
}

#[tokio::test]
async fn tags_are_linked_to_the_new_article() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/articles");
            then.status(201).json_body(serde_json::json!([{ "id": 43 }]));
        })
        .await;
    let links = server
        .mock_async(|when, then| {
            when.method(POST).path("/article_tags").json_body(serde_json::json!([
                { "article_id": 43, "tag_id": 5 },
                { "article_id": 43, "tag_id": 9 },
            ]));
            then.status(201);
        })
        .await;

    actions::create_article(&store_for(&server), &new_article(true, vec![5, 9]), Utc::now())
        .await
        .expect("create");
    links.assert_async().await;
}

#[tokio::test]
async fn tag_failure_is_partial_and_leaves_the_article_behind() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/articles");
            then.status(201).json_body(serde_json::json!([{ "id": 44 }]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/article_tags");
            then.status(409).body("duplicate key value");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/articles")
                .query_param("slug", "eq.rust-adoption");
            then.status(200).json_body(serde_json::json!([{
                "id": 44,
                "title": "Rust 在 Web 团队的落地",
                "slug": "rust-adoption",
                "content": "…",
                "published_at": "2026-03-01T09:00:00Z",
                "read_time_minutes": 2,
                "categories": { "name": "工程" },
                "article_tags": [],
            }]));
        })
        .await;

    let store = store_for(&server);
    let err = actions::create_article(&store, &new_article(true, vec![5]), Utc::now())
        .await
        .expect_err("tag link must fail");
    assert!(matches!(err, CreateArticleError::TagsFailed { article_id: 44 }));
    assert_eq!(err.to_string(), TAGS_FAILED);

    // No rollback: the article row is already visible by slug.
    let article = store
        .article_by_slug("rust-adoption")
        .await
        .expect("query")
        .expect("row present");
    assert_eq!(article.id, 44);
    assert_eq!(article.category_name.as_deref(), Some("工程"));
}

#[tokio::test]
async fn rejected_insert_is_a_total_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/articles");
            then.status(409)
                .body("duplicate key value violates unique constraint \"articles_slug_key\"");
        })
        .await;
    let links = server
        .mock_async(|when, then| {
            when.method(POST).path("/article_tags");
            then.status(201);
        })
        .await;

    let err = actions::create_article(&store_for(&server), &new_article(true, vec![5]), Utc::now())
        .await
        .expect_err("insert must fail");
    assert!(matches!(err, CreateArticleError::Insert(_)));
    // Tag linking never runs when the article row was rejected.
    links.assert_hits_async(0).await;
}

#[tokio::test]
async fn missing_slug_resolves_to_none() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/articles");
            then.status(200).json_body(serde_json::json!([]));
        })
        .await;

    let found = store_for(&server)
        .article_by_slug("no-such-slug")
        .await
        .expect("query");
    assert!(found.is_none());
}
