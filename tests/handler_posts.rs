mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use blog_publisher::domain::jobs::{Job, JobChain};
use blog_publisher::domain::notification::Notification;
use blog_publisher::routes::router;
use serde_json::json;
use sqlx::PgPool;

async fn make_server(
    pool: PgPool,
) -> (
    TestServer,
    String,
    common::QueuedJobs,
    std::sync::Arc<common::MemoryCache>,
) {
    let token = common::create_admin_token(&pool).await;
    let (state, jobs, cache) = common::create_test_state(pool);
    let server = TestServer::new(router(state)).unwrap();
    (server, format!("Bearer {token}"), jobs, cache)
}

// ─── Authoring ───────────────────────────────────────────────────────────────

#[sqlx::test]
async fn test_create_requires_token(pool: PgPool) {
    let (server, _auth, _jobs, _cache) = make_server(pool).await;

    let response = server
        .post("/api/posts")
        .json(&json!({ "title": "Hello", "text": "Body" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[sqlx::test]
async fn test_create_draft_queues_preview_chain(pool: PgPool) {
    let (server, auth, jobs, cache) = make_server(pool).await;

    let response = server
        .post("/api/posts")
        .add_header("Authorization", auth)
        .json(&json!({
            "title": "Hello",
            "text": "Body",
            "tags_text": "PHP, Laravel, laravel"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["published"], false);
    assert_eq!(json["tags"], json!(["laravel", "php"]));

    let id = json["id"].as_i64().unwrap();
    assert_eq!(jobs.take().await, vec![JobChain::after_draft_save(id)]);
    assert_eq!(cache.clears(), 0);
}

#[sqlx::test]
async fn test_create_published_post_publishes_once(pool: PgPool) {
    let (server, auth, jobs, cache) = make_server(pool).await;

    let response = server
        .post("/api/posts")
        .add_header("Authorization", auth)
        .json(&json!({ "title": "Launch", "text": "Body", "published": true }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["published"], true);
    assert!(json["publish_date"].is_string());
    assert_eq!(cache.clears(), 1);

    let chains = jobs.take().await;
    assert_eq!(chains.len(), 1);
    assert!(matches!(
        chains[0].jobs(),
        [Job::Deliver(Notification::PostPublished { .. })]
    ));
}

#[sqlx::test]
async fn test_create_without_tweet_skips_announcement(pool: PgPool) {
    let (server, auth, jobs, cache) = make_server(pool).await;

    server
        .post("/api/posts")
        .add_header("Authorization", auth)
        .json(&json!({
            "title": "Quiet",
            "text": "Body",
            "published": true,
            "send_automated_tweet": false
        }))
        .await
        .assert_status(StatusCode::CREATED);

    assert!(jobs.take().await.is_empty());
    assert_eq!(cache.clears(), 1);
}

#[sqlx::test]
async fn test_create_blank_title_lists_missing_fields(pool: PgPool) {
    let (server, auth, jobs, _cache) = make_server(pool.clone()).await;

    let response = server
        .post("/api/posts")
        .add_header("Authorization", auth)
        .json(&json!({ "title": "  ", "text": "" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["error"]["details"]["missing"], json!(["title", "text"]));
    assert!(jobs.take().await.is_empty());

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test]
async fn test_create_rejects_bad_external_url(pool: PgPool) {
    let (server, auth, _jobs, _cache) = make_server(pool).await;

    let response = server
        .post("/api/posts")
        .add_header("Authorization", auth)
        .json(&json!({ "title": "Link", "text": "Body", "external_url": "not a url" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[sqlx::test]
async fn test_update_published_post_does_not_republish(pool: PgPool) {
    let id = common::create_test_post(&pool, "Live", true).await;
    let (server, auth, jobs, cache) = make_server(pool).await;

    let response = server
        .put(&format!("/api/posts/{id}"))
        .add_header("Authorization", auth)
        .json(&json!({ "title": "Live, edited", "text": "New body" }))
        .await;

    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["title"], "Live, edited");
    assert_eq!(json["published"], true);
    assert!(jobs.take().await.is_empty());
    assert_eq!(cache.clears(), 0);
}

#[sqlx::test]
async fn test_update_unknown_post(pool: PgPool) {
    let (server, auth, _jobs, _cache) = make_server(pool).await;

    let response = server
        .put("/api/posts/999999")
        .add_header("Authorization", auth)
        .json(&json!({ "title": "Ghost", "text": "Body" }))
        .await;

    response.assert_status_not_found();
}

// ─── Publishing ──────────────────────────────────────────────────────────────

#[sqlx::test]
async fn test_publish_twice_has_one_effect(pool: PgPool) {
    let id = common::create_test_post(&pool, "Draft", false).await;
    let (server, auth, jobs, cache) = make_server(pool.clone()).await;

    let first = server
        .post(&format!("/api/posts/{id}/publish"))
        .add_header("Authorization", auth.clone())
        .await;
    first.assert_status_ok();
    let first_date = first.json::<serde_json::Value>()["publish_date"].clone();

    let second = server
        .post(&format!("/api/posts/{id}/publish"))
        .add_header("Authorization", auth)
        .await;
    second.assert_status_ok();

    assert_eq!(second.json::<serde_json::Value>()["publish_date"], first_date);
    assert!(common::published_flag(&pool, id).await);
    assert_eq!(cache.clears(), 1);
    assert_eq!(jobs.take().await.len(), 1);
}

#[sqlx::test]
async fn test_publish_due_only_publishes_past_dates(pool: PgPool) {
    let due = common::create_test_post(&pool, "Due", false).await;
    let future = common::create_test_post(&pool, "Future", false).await;
    sqlx::query("UPDATE posts SET publish_date = NOW() - INTERVAL '1 hour' WHERE id = $1")
        .bind(due)
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("UPDATE posts SET publish_date = NOW() + INTERVAL '1 day' WHERE id = $1")
        .bind(future)
        .execute(&pool)
        .await
        .unwrap();
    let (server, auth, _jobs, _cache) = make_server(pool.clone()).await;

    let scheduled = server
        .get("/api/posts/scheduled")
        .add_header("Authorization", auth.clone())
        .await;
    scheduled.assert_status_ok();
    assert_eq!(scheduled.json::<serde_json::Value>().as_array().unwrap().len(), 2);

    let response = server
        .post("/api/posts/publish-due")
        .add_header("Authorization", auth)
        .await;

    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["id"], due);
    assert!(common::published_flag(&pool, due).await);
    assert!(!common::published_flag(&pool, future).await);
}

#[sqlx::test]
async fn test_post_kind_reads_stored_tags(pool: PgPool) {
    let (server, auth, _jobs, _cache) = make_server(pool).await;

    let created = server
        .post("/api/posts")
        .add_header("Authorization", auth.clone())
        .json(&json!({ "title": "Short", "text": "Body", "tags_text": "Tweet" }))
        .await;
    let id = created.json::<serde_json::Value>()["id"].as_i64().unwrap();

    let response = server
        .get(&format!("/api/posts/{id}/type"))
        .add_header("Authorization", auth)
        .await;

    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["kind"], "tweet");
}

// ─── Public pages ────────────────────────────────────────────────────────────

#[sqlx::test]
async fn test_draft_is_hidden_without_preview_secret(pool: PgPool) {
    let id = common::create_test_post(&pool, "Secret draft", false).await;
    let (server, auth, _jobs, _cache) = make_server(pool).await;

    server
        .get(&format!("/posts/{id}-secret-draft"))
        .await
        .assert_status_not_found();

    server
        .get(&format!("/posts/{id}-secret-draft?preview_secret=wrong"))
        .await
        .assert_status_not_found();

    server
        .get(&format!("/posts/{id}-secret-draft?preview_secret=secret1234"))
        .await
        .assert_status_ok();

    server
        .get(&format!("/posts/{id}"))
        .add_header("Authorization", auth)
        .await
        .assert_status_ok();
}

#[sqlx::test]
async fn test_published_post_renders_markdown(pool: PgPool) {
    let id = common::create_test_post(&pool, "Hello world", true).await;
    sqlx::query("UPDATE posts SET text = 'Some *emphasis*' WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();
    let (server, _auth, _jobs, _cache) = make_server(pool).await;

    let response = server.get(&format!("/posts/{id}-hello-world")).await;

    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["url"], format!("{}/posts/{id}-hello-world", common::BASE_URL));
    assert!(json["html"].as_str().unwrap().contains("<em>emphasis</em>"));
}

#[sqlx::test]
async fn test_page_cache_is_flushed_by_publish(pool: PgPool) {
    let live = common::create_test_post(&pool, "Live", true).await;
    let draft = common::create_test_post(&pool, "Draft", false).await;
    let (server, auth, _jobs, cache) = make_server(pool).await;

    let first = server.get(&format!("/posts/{live}")).await;
    first.assert_status_ok();
    assert_eq!(first.header("x-cache"), "MISS");

    let second = server.get(&format!("/posts/{live}")).await;
    assert_eq!(second.header("x-cache"), "HIT");
    assert_eq!(cache.len(), 1);

    server
        .post(&format!("/api/posts/{draft}/publish"))
        .add_header("Authorization", auth)
        .await
        .assert_status_ok();

    assert_eq!(cache.len(), 0);
    let third = server.get(&format!("/posts/{live}")).await;
    assert_eq!(third.header("x-cache"), "MISS");
}

#[sqlx::test]
async fn test_edited_live_page_stays_cached_until_next_flush(pool: PgPool) {
    let live = common::create_test_post(&pool, "Live", true).await;
    let draft = common::create_test_post(&pool, "Draft", false).await;
    let (server, auth, _jobs, cache) = make_server(pool).await;

    server.get(&format!("/posts/{live}")).await.assert_status_ok();

    server
        .put(&format!("/api/posts/{live}"))
        .add_header("Authorization", auth.clone())
        .json(&json!({ "title": "Live", "text": "Corrected body" }))
        .await
        .assert_status_ok();

    let stale = server.get(&format!("/posts/{live}")).await;
    assert_eq!(stale.header("x-cache"), "HIT");
    assert!(!stale.text().contains("Corrected body"));
    assert_eq!(cache.clears(), 0);

    server
        .post(&format!("/api/posts/{draft}/publish"))
        .add_header("Authorization", auth)
        .await
        .assert_status_ok();

    let fresh = server.get(&format!("/posts/{live}")).await;
    assert_eq!(fresh.header("x-cache"), "MISS");
    assert!(fresh.text().contains("Corrected body"));
}

#[sqlx::test]
async fn test_series_lists_posts_in_order(pool: PgPool) {
    let one = common::create_test_post(&pool, "Part one", true).await;
    let two = common::create_test_post(&pool, "Part two", true).await;
    sqlx::query("UPDATE posts SET series_slug = 'intro' WHERE id = ANY($1)")
        .bind(vec![one, two])
        .execute(&pool)
        .await
        .unwrap();
    let (server, _auth, _jobs, _cache) = make_server(pool).await;

    let response = server.get(&format!("/posts/{two}/series")).await;

    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json[0]["id"], one);
    assert_eq!(json[0]["current"], false);
    assert_eq!(json[1]["id"], two);
    assert_eq!(json[1]["current"], true);
}

#[sqlx::test]
async fn test_originals_listing(pool: PgPool) {
    let original = common::create_test_post(&pool, "Mine", true).await;
    common::create_test_post(&pool, "Linked", true).await;
    sqlx::query("UPDATE posts SET original_content = TRUE WHERE id = $1")
        .bind(original)
        .execute(&pool)
        .await
        .unwrap();
    let (server, _auth, _jobs, _cache) = make_server(pool).await;

    let response = server.get("/originals").await;

    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["items"].as_array().unwrap().len(), 1);
    assert_eq!(json["items"][0]["id"], original);
    assert_eq!(json["has_more"], false);

    server.get("/originals?page=0").await.assert_status_bad_request();
}

#[sqlx::test]
async fn test_oversized_page_is_served_uncached(pool: PgPool) {
    let id = common::create_test_post(&pool, "Long read", true).await;
    sqlx::query("UPDATE posts SET text = repeat('a', 3 * 1024 * 1024) WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();
    let (server, _auth, _jobs, cache) = make_server(pool).await;

    let response = server.get(&format!("/posts/{id}")).await;

    response.assert_status_ok();
    assert_eq!(response.header("x-cache"), "BYPASS");
    assert!(response.text().len() > 3 * 1024 * 1024);
    assert_eq!(cache.len(), 0);
}

// ─── Search projection ───────────────────────────────────────────────────────

#[sqlx::test]
async fn test_search_document_of_published_post(pool: PgPool) {
    let id = common::create_test_post(&pool, "Indexed", true).await;
    let draft = common::create_test_post(&pool, "Not yet", false).await;
    let (server, auth, _jobs, _cache) = make_server(pool).await;

    let response = server
        .get(&format!("/api/posts/{id}/search-document"))
        .add_header("Authorization", auth.clone())
        .await;

    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["id"], id);
    assert_eq!(json["title"], "Indexed");
    assert!(json.get("text").is_none());

    server
        .get(&format!("/api/posts/{draft}/search-document"))
        .add_header("Authorization", auth)
        .await
        .assert_status_not_found();
}
