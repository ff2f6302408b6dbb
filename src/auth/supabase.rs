use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{AuthError, AuthProvider, AuthSession, AuthUser, SignUp};
use crate::config::SupabaseConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the Supabase auth REST API (`/auth/v1`)
pub struct SupabaseAuth {
    http: Client,
    base_url: String,
    anon_key: String,
    service_role_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserBody {
    id: Uuid,
    email: Option<String>,
}

impl From<UserBody> for AuthUser {
    fn from(body: UserBody) -> Self {
        Self {
            id: body.id,
            email: body.email,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SessionBody {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: UserBody,
}

impl From<SessionBody> for AuthSession {
    fn from(body: SessionBody) -> Self {
        Self {
            access_token: body.access_token,
            refresh_token: body.refresh_token,
            expires_in: body.expires_in,
            user: body.user.into(),
        }
    }
}

impl SupabaseAuth {
    pub fn new(config: &SupabaseConfig) -> Result<Self, AuthError> {
        if config.url.is_empty() {
            return Err(AuthError::ConfigMissing("SUPABASE_URL"));
        }
        if config.anon_key.is_empty() {
            return Err(AuthError::ConfigMissing("SUPABASE_ANON_KEY"));
        }
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: format!("{}/auth/v1", config.url.trim_end_matches('/')),
            anon_key: config.anon_key.clone(),
            service_role_key: config.service_role_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Request carrying the project key, authorized as `bearer` (the anon key when absent)
    fn request(&self, method: reqwest::Method, path: &str, bearer: Option<&str>) -> RequestBuilder {
        self.http
            .request(method, self.endpoint(path))
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer.unwrap_or(self.anon_key.as_str()))
    }

    /// Pass successful responses through, turn anything else into [`AuthError::Rejected`]
    async fn ensure_success(response: Response) -> Result<Response, AuthError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body: Value = response.json().await.unwrap_or(Value::Null);
        Err(AuthError::Rejected {
            status: status.as_u16(),
            message: error_message(&body).unwrap_or_else(|| status.to_string()),
        })
    }
}

/// Human-readable message from the auth service's error body (its shape varies by version)
fn error_message(body: &Value) -> Option<String> {
    ["msg", "error_description", "message", "error"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .map(str::to_string)
}

fn is_invalid_credentials(status: u16, body: &Value) -> bool {
    if status != StatusCode::BAD_REQUEST.as_u16() {
        return false;
    }
    let code = body
        .get("error_code")
        .or_else(|| body.get("error"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    matches!(code, "invalid_credentials" | "invalid_grant")
}

/// Sign-up answers with a session when emails are auto-confirmed and with the bare user otherwise
fn parse_sign_up(body: Value) -> Result<SignUp, AuthError> {
    if body.get("access_token").is_some() {
        let session: SessionBody =
            serde_json::from_value(body).map_err(|e| AuthError::UnexpectedResponse(e.to_string()))?;
        let session = AuthSession::from(session);
        return Ok(SignUp {
            user: session.user.clone(),
            session: Some(session),
        });
    }
    let user = body.get("user").cloned().unwrap_or(body);
    let user: UserBody = serde_json::from_value(user).map_err(|e| AuthError::UnexpectedResponse(e.to_string()))?;
    Ok(SignUp {
        user: user.into(),
        session: None,
    })
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let response = self
            .request(reqwest::Method::POST, "/token?grant_type=password", None)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            if is_invalid_credentials(status.as_u16(), &body) {
                return Err(AuthError::InvalidCredentials);
            }
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                message: error_message(&body).unwrap_or_else(|| status.to_string()),
            });
        }

        let session: SessionBody = response.json().await?;
        debug!("Signed in user {}", session.user.id);
        Ok(session.into())
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUp, AuthError> {
        let response = self
            .request(reqwest::Method::POST, "/signup", None)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let body: Value = Self::ensure_success(response).await?.json().await?;
        parse_sign_up(body)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .request(reqwest::Method::POST, "/logout", Some(access_token))
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn send_recovery(&self, email: &str, redirect_to: Option<&str>) -> Result<(), AuthError> {
        let mut request = self
            .request(reqwest::Method::POST, "/recover", None)
            .json(&json!({ "email": email }));
        if let Some(redirect_to) = redirect_to {
            request = request.query(&[("redirect_to", redirect_to)]);
        }
        let response = request.send().await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn update_password(&self, access_token: &str, password: &str) -> Result<AuthUser, AuthError> {
        let response = self
            .request(reqwest::Method::PUT, "/user", Some(access_token))
            .json(&json!({ "password": password }))
            .send()
            .await?;
        let user: UserBody = Self::ensure_success(response).await?.json().await?;
        Ok(user.into())
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), AuthError> {
        let Some(service_role_key) = self.service_role_key.as_deref() else {
            warn!("Account deletion requested but SUPABASE_SERVICE_ROLE_KEY is not set");
            return Err(AuthError::ConfigMissing("SUPABASE_SERVICE_ROLE_KEY"));
        };
        let response = self
            .http
            .delete(self.endpoint(&format!("/admin/users/{user_id}")))
            .header("apikey", service_role_key)
            .bearer_auth(service_role_key)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_reads_any_known_field() {
        assert_eq!(
            error_message(&json!({ "code": 422, "msg": "Password should be at least 8 characters" })).as_deref(),
            Some("Password should be at least 8 characters")
        );
        assert_eq!(
            error_message(&json!({ "error": "invalid_grant", "error_description": "Invalid login credentials" }))
                .as_deref(),
            Some("Invalid login credentials")
        );
        assert_eq!(error_message(&Value::Null), None);
    }

    #[test]
    fn detects_invalid_credentials_across_versions() {
        assert!(is_invalid_credentials(400, &json!({ "error_code": "invalid_credentials" })));
        assert!(is_invalid_credentials(400, &json!({ "error": "invalid_grant" })));
        assert!(!is_invalid_credentials(400, &json!({ "error_code": "email_not_confirmed" })));
        assert!(!is_invalid_credentials(500, &json!({ "error": "invalid_grant" })));
    }

    #[test]
    fn sign_up_without_session_returns_the_user() {
        let id = Uuid::new_v4();
        let outcome = parse_sign_up(json!({ "id": id, "email": "new@example.com", "role": "" })).unwrap();
        assert_eq!(outcome.user.id, id);
        assert!(outcome.session.is_none());
    }

    #[test]
    fn sign_up_with_session_keeps_tokens() {
        let id = Uuid::new_v4();
        let outcome = parse_sign_up(json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3600,
            "token_type": "bearer",
            "user": { "id": id, "email": "new@example.com" }
        }))
        .unwrap();
        assert_eq!(outcome.user.id, id);
        assert_eq!(outcome.session.map(|s| s.access_token).as_deref(), Some("a"));
    }

    #[test]
    fn requires_project_url_and_key() {
        let mut config = crate::config::AppConfig::for_tests().supabase;
        config.anon_key.clear();
        assert!(matches!(
            SupabaseAuth::new(&config),
            Err(AuthError::ConfigMissing("SUPABASE_ANON_KEY"))
        ));
    }
}
