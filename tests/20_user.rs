mod common;

use anyhow::Result;
use chrono::Duration;
use reqwest::{header, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

use bookflow_api::config::AppConfig;
use common::{FakeAuth, FakeCatalog};

#[tokio::test]
async fn profile_requires_a_session() -> Result<()> {
    let app = common::spawn_app().await?;

    let res = app.client.get(app.url("/api/user/profile")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await?;
    assert_eq!(body, json!({ "error": "Unauthorized", "message": "Authentication required" }));
    Ok(())
}

#[tokio::test]
async fn expired_or_foreign_tokens_count_as_anonymous() -> Result<()> {
    let app = common::spawn_app().await?;
    let user = Uuid::new_v4();

    let expired = common::sign_token(&app.config.supabase.jwt_secret, user, Duration::hours(-2));
    let foreign = common::sign_token("some-other-project-secret", user, Duration::hours(1));

    for token in [expired, foreign] {
        let res = app
            .client
            .delete(app.url("/api/user/account"))
            .bearer_auth(&token)
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
    assert!(app.auth.deleted.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn account_deletion_removes_the_user_and_clears_cookies() -> Result<()> {
    let app = common::spawn_app().await?;
    let user = Uuid::new_v4();

    let res = app
        .client
        .delete(app.url("/api/user/account"))
        .bearer_auth(app.token_for(user))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(res.headers().get_all(header::SET_COOKIE).iter().count(), 2);
    assert!(res.bytes().await?.is_empty());
    assert_eq!(app.auth.deleted.lock().unwrap().as_slice(), [user]);
    Ok(())
}

#[tokio::test]
async fn account_deletion_failure_is_a_server_error() -> Result<()> {
    let app = common::spawn_with(
        AppConfig::for_tests(),
        FakeAuth {
            fail_delete: true,
            ..FakeAuth::default()
        },
        FakeCatalog::default(),
    )
    .await?;

    let res = app
        .client
        .delete(app.url("/api/user/account"))
        .bearer_auth(app.token_for(Uuid::new_v4()))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await?;
    assert_eq!(body["message"], "Failed to delete account");
    Ok(())
}

#[tokio::test]
async fn user_work_queries_are_validated_before_authentication() -> Result<()> {
    let app = common::spawn_app().await?;

    let res = app
        .client
        .get(app.url("/api/user/works?status=reading&page=0"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "Validation error");

    let res = app.client.get(app.url("/api/user/works")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn bulk_add_rejects_empty_and_malformed_ids() -> Result<()> {
    let app = common::spawn_app().await?;
    let token = app.token_for(Uuid::new_v4());

    for body in [
        json!({ "work_ids": [] }),
        json!({ "work_ids": [Uuid::new_v4(), "not-a-uuid"] }),
        json!({ "work_ids": [Uuid::new_v4()], "status": "finished" }),
    ] {
        let res = app
            .client
            .post(app.url("/api/user/works/bulk"))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
    Ok(())
}
