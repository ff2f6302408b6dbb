mod common;

use std::time::Duration;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use bookflow_api::config::AppConfig;
use bookflow_api::openlibrary::AuthorSearchResult;
use common::{FakeAuth, FakeCatalog};

fn tolkien() -> AuthorSearchResult {
    AuthorSearchResult {
        openlibrary_id: "OL26320A".to_string(),
        name: "J.R.R. Tolkien".to_string(),
        birth_date: Some("3 January 1892".to_string()),
        death_date: Some("2 September 1973".to_string()),
        top_work: Some("The Hobbit".to_string()),
        work_count: Some(431),
    }
}

#[tokio::test]
async fn search_requires_a_session_after_validation() -> Result<()> {
    let app = common::spawn_app().await?;

    let res = app.client.get(app.url("/api/openlibrary/authors/search")).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .client
        .get(app.url("/api/openlibrary/authors/search?q=tolkien"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn search_returns_catalog_hits() -> Result<()> {
    let catalog = FakeCatalog {
        authors: vec![tolkien()],
        ..FakeCatalog::default()
    };
    let app = common::spawn_with(AppConfig::for_tests(), FakeAuth::default(), catalog).await?;

    let res = app
        .client
        .get(app.url("/api/openlibrary/authors/search?q=tolkien&limit=5"))
        .bearer_auth(app.token_for(Uuid::new_v4()))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["items"][0]["openlibrary_id"], "OL26320A");
    assert_eq!(body["items"][0]["top_work"], "The Hobbit");
    Ok(())
}

#[tokio::test]
async fn catalog_outage_is_a_bad_gateway() -> Result<()> {
    let catalog = FakeCatalog {
        unavailable: true,
        ..FakeCatalog::default()
    };
    let app = common::spawn_with(AppConfig::for_tests(), FakeAuth::default(), catalog).await?;

    let res = app
        .client
        .get(app.url("/api/openlibrary/authors/search?q=tolkien"))
        .bearer_auth(app.token_for(Uuid::new_v4()))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "Bad gateway");
    Ok(())
}

#[tokio::test]
async fn catalog_calls_are_rate_limited_per_user() -> Result<()> {
    let mut config = AppConfig::for_tests();
    config.api.rate_limit_requests = 2;
    config.api.rate_limit_window_secs = 60;
    let app = common::spawn_with(config, FakeAuth::default(), FakeCatalog::default()).await?;

    let reader = app.token_for(Uuid::new_v4());
    let other = app.token_for(Uuid::new_v4());
    let search = app.url("/api/openlibrary/authors/search?q=tolkien");

    for _ in 0..2 {
        let res = app.client.get(&search).bearer_auth(&reader).send().await?;
        assert_eq!(res.status(), StatusCode::OK);
    }

    let res = app.client.get(&search).bearer_auth(&reader).send().await?;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        res.headers().get("x-ratelimit-remaining").and_then(|v| v.to_str().ok()),
        Some("0")
    );

    let res = app.client.get(&search).bearer_auth(&other).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    app.clock.advance(Duration::from_secs(61));
    let res = app.client.get(&search).bearer_auth(&reader).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn import_rejects_long_form_ids() -> Result<()> {
    let app = common::spawn_app().await?;

    let res = app
        .client
        .post(app.url("/api/openlibrary/import/author"))
        .bearer_auth(app.token_for(Uuid::new_v4()))
        .json(&json!({ "openlibrary_id": "/authors/OL26320A" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["details"][0]["path"][0], "openlibrary_id");
    Ok(())
}

#[tokio::test]
async fn import_of_unknown_author_is_not_found() -> Result<()> {
    let app = common::spawn_app().await?;

    let res = app
        .client
        .post(app.url("/api/openlibrary/import/author"))
        .bearer_auth(app.token_for(Uuid::new_v4()))
        .json(&json!({ "openlibrary_id": "OL1A" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
