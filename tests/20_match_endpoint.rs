mod common;

use anyhow::Result;
use axum::http::StatusCode;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use tradematch_api::auth::{generate_jwt, Claims};
use tradematch_api::database::DatabaseManager;

const TEST_JWT_SECRET: &str = "integration-test-secret";

/// Explicit-matching tests need a live Postgres because the ownership check
/// runs inside the handler's user-scoped query. They are skipped unless
/// TRADEMATCH_TEST_DATABASE_URL points at a scratch database.
async fn test_pool() -> Result<Option<PgPool>> {
    let Ok(url) = std::env::var("TRADEMATCH_TEST_DATABASE_URL") else {
        eprintln!("TRADEMATCH_TEST_DATABASE_URL not set; skipping database-backed test");
        return Ok(None);
    };

    // Must be set before anything touches the config singleton so the server
    // verifies the tokens minted below.
    std::env::set_var("JWT_SECRET", TEST_JWT_SECRET);

    let pool = PgPoolOptions::new().max_connections(5).connect(&url).await?;
    DatabaseManager::migrate(&pool).await?;
    Ok(Some(pool))
}

fn token_for(user_id: Uuid) -> Result<String> {
    let claims = Claims::new(user_id, None);
    Ok(generate_jwt(&claims, TEST_JWT_SECRET)?)
}

async fn seed_profile(pool: &PgPool, role: &str, trade: Option<&str>) -> Result<Uuid> {
    let id = sqlx::query_scalar(
        "INSERT INTO profiles (role, display_name, trade) \
         VALUES ($1::profile_role, $2, $3) RETURNING id",
    )
    .bind(role)
    .bind("Test User")
    .bind(trade)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

async fn seed_request(pool: &PgPool, customer_id: Uuid, trade: &str, status: &str) -> Result<Uuid> {
    let id = sqlx::query_scalar(
        "INSERT INTO requests (customer_id, title, trade, status) \
         VALUES ($1, 'Boiler swap', $2, $3::request_status) RETURNING id",
    )
    .bind(customer_id)
    .bind(trade)
    .bind(status)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

async fn match_count(pool: &PgPool, request_id: Uuid) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT count(*) FROM request_matches WHERE request_id = $1")
        .bind(request_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// A caller who does not own the request gets 404, whatever the request
/// status, and no matches are created.
#[tokio::test]
async fn match_on_another_customers_request_is_not_found() -> Result<()> {
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };
    let app = common::app_with_pool(pool.clone());

    // Unique trade per run so candidate search only sees this test's rows
    let trade = format!("ownership-trade-{}", Uuid::new_v4());
    let owner = seed_profile(&pool, "customer", None).await?;
    let intruder = seed_profile(&pool, "customer", None).await?;
    seed_profile(&pool, "contractor", Some(&trade)).await?;

    let open_request = seed_request(&pool, owner, &trade, "open").await?;
    let draft_request = seed_request(&pool, owner, &trade, "draft").await?;

    let token = token_for(intruder)?;
    for request_id in [open_request, draft_request] {
        let uri = format!("/api/requests/{}/match", request_id);
        let res = app
            .clone()
            .oneshot(common::post_with_auth(&uri, &token))
            .await?;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let body = common::body_json(res).await;
        assert_eq!(body["error"], "Request not found");
        assert_eq!(match_count(&pool, request_id).await?, 0);
    }
    Ok(())
}

/// The owner of a non-open request gets 400 and no matches are created.
#[tokio::test]
async fn match_on_non_open_request_is_rejected() -> Result<()> {
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };
    let app = common::app_with_pool(pool.clone());

    let trade = format!("draft-trade-{}", Uuid::new_v4());
    let owner = seed_profile(&pool, "customer", None).await?;
    seed_profile(&pool, "contractor", Some(&trade)).await?;
    let request_id = seed_request(&pool, owner, &trade, "draft").await?;

    let uri = format!("/api/requests/{}/match", request_id);
    let res = app
        .oneshot(common::post_with_auth(&uri, &token_for(owner)?))
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = common::body_json(res).await;
    assert_eq!(body["error"], "Request must be open to match contractors");
    assert_eq!(match_count(&pool, request_id).await?, 0);
    Ok(())
}

/// The owner of an open request gets a pending match per eligible contractor;
/// a repeat run finds everyone already matched.
#[tokio::test]
async fn owner_matches_open_request_once() -> Result<()> {
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };
    let app = common::app_with_pool(pool.clone());

    let trade = format!("owner-trade-{}", Uuid::new_v4());
    let owner = seed_profile(&pool, "customer", None).await?;
    seed_profile(&pool, "contractor", Some(&trade)).await?;
    let request_id = seed_request(&pool, owner, &trade, "open").await?;

    let token = token_for(owner)?;
    let uri = format!("/api/requests/{}/match", request_id);

    let res = app.clone().oneshot(common::post_with_auth(&uri, &token)).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = common::body_json(res).await;
    assert_eq!(body["matched"], 1);
    assert_eq!(body["message"], "Matched 1 contractor");
    assert_eq!(match_count(&pool, request_id).await?, 1);

    let res = app.oneshot(common::post_with_auth(&uri, &token)).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = common::body_json(res).await;
    assert_eq!(body["matched"], 0);
    assert_eq!(body["message"], "All found contractors already matched");
    assert_eq!(match_count(&pool, request_id).await?, 1);
    Ok(())
}
