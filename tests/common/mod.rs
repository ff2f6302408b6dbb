#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use sqlx::{Connection, Executor, PgConnection, PgPool};
use uuid::Uuid;

use bookflow_api::auth::{AuthError, AuthProvider, AuthSession, AuthUser, Claims, SignUp, TokenVerifier};
use bookflow_api::config::AppConfig;
use bookflow_api::database::DatabaseManager;
use bookflow_api::openlibrary::{
    AuthorSearchResult, Catalog, CatalogAuthor, CatalogEdition, CatalogError, CatalogWork,
};
use bookflow_api::rate_limit::{ManualClock, RateLimiter};
use bookflow_api::{build_router, AppState};

pub const PASSWORD: &str = "correct-horse-battery";

/// Auth service double: accepts `PASSWORD` for any email and records side effects
#[derive(Default)]
pub struct FakeAuth {
    pub fail_recovery: bool,
    pub fail_delete: bool,
    pub recoveries: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<Uuid>>,
    pub signed_out: Mutex<Vec<String>>,
}

impl FakeAuth {
    fn session_for(email: &str) -> AuthSession {
        AuthSession {
            access_token: "fake-access-token".to_string(),
            refresh_token: "fake-refresh-token".to_string(),
            expires_in: 3600,
            user: AuthUser {
                id: Uuid::new_v4(),
                email: Some(email.to_string()),
            },
        }
    }
}

#[async_trait]
impl AuthProvider for FakeAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        if password != PASSWORD {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(Self::session_for(email))
    }

    async fn sign_up(&self, email: &str, _password: &str) -> Result<SignUp, AuthError> {
        let session = Self::session_for(email);
        Ok(SignUp {
            user: session.user.clone(),
            session: None,
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.signed_out.lock().unwrap().push(access_token.to_string());
        Ok(())
    }

    async fn send_recovery(&self, email: &str, _redirect_to: Option<&str>) -> Result<(), AuthError> {
        if self.fail_recovery {
            return Err(AuthError::Rejected {
                status: 422,
                message: "User not found".to_string(),
            });
        }
        self.recoveries.lock().unwrap().push(email.to_string());
        Ok(())
    }

    async fn update_password(&self, _access_token: &str, _password: &str) -> Result<AuthUser, AuthError> {
        Ok(AuthUser {
            id: Uuid::new_v4(),
            email: None,
        })
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), AuthError> {
        if self.fail_delete {
            return Err(AuthError::UnexpectedResponse("admin API unavailable".to_string()));
        }
        self.deleted.lock().unwrap().push(user_id);
        Ok(())
    }
}

/// Catalog double serving fixed records, or failing every call
#[derive(Default)]
pub struct FakeCatalog {
    pub authors: Vec<AuthorSearchResult>,
    pub works: Vec<CatalogWork>,
    pub editions: Vec<CatalogEdition>,
    /// Applied to every work lookup
    pub delay: Option<StdDuration>,
    pub unavailable: bool,
}

impl FakeCatalog {
    fn check(&self) -> Result<(), CatalogError> {
        if self.unavailable {
            return Err(CatalogError::Status(503));
        }
        Ok(())
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn search_authors(&self, _query: &str, limit: u32) -> Result<Vec<AuthorSearchResult>, CatalogError> {
        self.check()?;
        Ok(self.authors.iter().take(limit as usize).cloned().collect())
    }

    async fn author(&self, _openlibrary_id: &str) -> Result<Option<CatalogAuthor>, CatalogError> {
        self.check()?;
        Ok(None)
    }

    async fn work(&self, openlibrary_id: &str) -> Result<Option<CatalogWork>, CatalogError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.check()?;
        Ok(self.works.iter().find(|w| w.openlibrary_id == openlibrary_id).cloned())
    }

    async fn work_editions(&self, openlibrary_id: &str, limit: u32) -> Result<Vec<CatalogEdition>, CatalogError> {
        self.check()?;
        Ok(self
            .editions
            .iter()
            .filter(|e| e.work_ids.iter().any(|id| id == openlibrary_id))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn edition(&self, openlibrary_id: &str) -> Result<Option<CatalogEdition>, CatalogError> {
        self.check()?;
        Ok(self.editions.iter().find(|e| e.openlibrary_id == openlibrary_id).cloned())
    }
}

/// A running server on an ephemeral port, with handles to its doubles
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub config: AppConfig,
    pub auth: Arc<FakeAuth>,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Access token the server will accept for `user_id`
    pub fn token_for(&self, user_id: Uuid) -> String {
        sign_token(&self.config.supabase.jwt_secret, user_id, Duration::hours(1))
    }
}

pub fn sign_token(secret: &str, user_id: Uuid, valid_for: Duration) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        email: Some("reader@example.com".to_string()),
        role: Some("authenticated".to_string()),
        aud: "authenticated".to_string(),
        exp: (now + valid_for).timestamp(),
        iat: Some(now.timestamp()),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
}

pub async fn spawn_app() -> Result<TestApp> {
    spawn_with(AppConfig::for_tests(), FakeAuth::default(), FakeCatalog::default()).await
}

pub async fn spawn_with(config: AppConfig, auth: FakeAuth, catalog: FakeCatalog) -> Result<TestApp> {
    let auth = Arc::new(auth);
    let clock = Arc::new(ManualClock::new(Utc::now().timestamp_millis()));

    let state = AppState {
        config: Arc::new(config.clone()),
        db: DatabaseManager::connect_lazy(&config.database)?,
        auth: auth.clone(),
        catalog: Arc::new(catalog),
        rate_limiter: Arc::new(RateLimiter::new(clock.clone())),
        verifier: TokenVerifier::new(&config.supabase.jwt_secret)?,
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("failed to bind test listener")?;
    let addr = listener.local_addr()?;
    let app = build_router(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(TestApp {
        base_url: format!("http://{}", addr),
        client: reqwest::Client::new(),
        config,
        auth,
        clock,
    })
}

const AUTH_SHIM: &str = include_str!("../fixtures/supabase_auth.sql");
const SCHEMA: &str = include_str!("../../migrations/0001_bookflow.sql");

/// Live database for store-backed tests; `None` skips them
pub fn store_url() -> Option<String> {
    std::env::var("DATABASE_URL").ok().filter(|url| !url.is_empty())
}

/// Apply the schema once per database and return a pool that bypasses row-level security
pub async fn prepare_store(url: &str) -> Result<PgPool> {
    let mut conn = PgConnection::connect(url).await.context("failed to connect to DATABASE_URL")?;
    // Test binaries run in parallel; only one of them applies the schema
    (&mut conn).execute("SELECT pg_advisory_lock(727001)").await?;
    let missing: bool = sqlx::query_scalar("SELECT to_regclass('public.profiles') IS NULL")
        .fetch_one(&mut conn)
        .await?;
    if missing {
        (&mut conn).execute(AUTH_SHIM).await.context("failed to apply auth shim")?;
        (&mut conn).execute(SCHEMA).await.context("failed to apply schema")?;
    }
    (&mut conn).execute("SELECT pg_advisory_unlock(727001)").await?;
    conn.close().await?;

    Ok(PgPool::connect(url).await?)
}

/// Insert an auth user; the schema's trigger creates the profile
pub async fn seed_user(pool: &PgPool) -> Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO auth.users (id, email) VALUES ($1, $2)")
        .bind(id)
        .bind(format!("{}@example.com", id.simple()))
        .execute(pool)
        .await?;
    Ok(id)
}

/// Digits unique enough to keep ISBNs and Open Library IDs apart across runs
pub fn unique_digits(len: u32) -> String {
    let n = Uuid::new_v4().as_u128() % 10u128.pow(len);
    format!("{:0width$}", n, width = len as usize)
}

pub async fn spawn_with_store(url: &str, tweak: impl FnOnce(&mut AppConfig), catalog: FakeCatalog) -> Result<TestApp> {
    let mut config = AppConfig::for_tests();
    config.database.url = url.to_string();
    config.database.connection_timeout = 5;
    tweak(&mut config);
    spawn_with(config, FakeAuth::default(), catalog).await
}
