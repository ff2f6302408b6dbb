//! Authentication against the Supabase platform.
//!
//! Session tokens are Supabase access tokens. They are verified locally with the project's JWT
//! secret ([`TokenVerifier`]); every other operation (sign-in, sign-up, recovery, account deletion)
//! goes to the platform's auth REST API through an [`AuthProvider`].

pub mod cookies;
pub mod supabase;
pub mod token;

pub use cookies::{bearer_token, clear_session_cookies, session_cookies, session_token, ACCESS_COOKIE, REFRESH_COOKIE};
pub use supabase::SupabaseAuth;
pub use token::{Claims, TokenVerifier};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid session token: {0}")]
    InvalidToken(String),

    #[error("No active session")]
    MissingSession,

    #[error("Auth service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Auth service unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected auth service response: {0}")]
    UnexpectedResponse(String),

    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),
}

/// Authenticated user as seen by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Tokens issued by a successful sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Seconds until the access token expires
    pub expires_in: i64,
    pub user: AuthUser,
}

/// Result of a sign-up: a session only when the project confirms emails automatically
#[derive(Debug, Clone)]
pub struct SignUp {
    pub user: AuthUser,
    pub session: Option<AuthSession>,
}

/// Operations delegated to the hosted auth service
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUp, AuthError>;

    /// Revoke the session behind `access_token`
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;

    /// Email a recovery link; unknown addresses are not reported
    async fn send_recovery(&self, email: &str, redirect_to: Option<&str>) -> Result<(), AuthError>;

    async fn update_password(&self, access_token: &str, password: &str) -> Result<AuthUser, AuthError>;

    /// Irreversibly delete the user (admin API)
    async fn delete_user(&self, user_id: Uuid) -> Result<(), AuthError>;
}
