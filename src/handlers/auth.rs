// handlers/auth.rs - session endpoints backed by the Supabase auth API

use axum::extract::State;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::auth::{clear_session_cookies, session_cookies, AuthError};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, JsonBody, Session};
use crate::state::AppState;
use crate::validation::auth::{ForgotPasswordCommand, LoginCommand, RegisterCommand, ResetPasswordCommand};
use crate::validation::Schema;

/// Message shown after a recovery request whether or not the account exists
pub const RECOVERY_SENT: &str = "If an account exists for that email, a password reset link is on its way";

/// POST /api/auth/login - password sign-in; stores the session in cookies
pub async fn login(State(state): State<AppState>, JsonBody(body): JsonBody) -> ApiResult<Value> {
    let command = LoginCommand::parse(&body)?;

    let session = state
        .auth
        .sign_in(&command.email, &command.password)
        .await
        .map_err(|e| {
            if matches!(e, AuthError::InvalidCredentials) {
                warn!("Failed sign-in attempt");
            }
            ApiError::from(e)
        })?;

    info!("User {} signed in", session.user.id);
    let cookies = session_cookies(&session, state.config.security.secure_cookies);
    Ok(ApiResponse::success(json!({ "user": session.user })).with_cookies(cookies))
}

/// POST /api/auth/register - sign-up; signs the user in when no email confirmation is needed
pub async fn register(State(state): State<AppState>, JsonBody(body): JsonBody) -> ApiResult<Value> {
    let command = RegisterCommand::parse(&body)?;

    let outcome = state.auth.sign_up(&command.email, &command.password).await?;
    info!("Registered user {}", outcome.user.id);

    let confirmation_required = outcome.session.is_none();
    let response = ApiResponse::created(json!({
        "user": outcome.user,
        "confirmation_required": confirmation_required,
    }));
    Ok(match outcome.session {
        Some(session) => response.with_cookies(session_cookies(&session, state.config.security.secure_cookies)),
        None => response,
    })
}

/// POST /api/auth/logout - revoke the session and clear cookies
pub async fn logout(State(state): State<AppState>, session: Session) -> ApiResult<Value> {
    let Some(token) = session.token.as_deref() else {
        return Err(ApiError::bad_request("No active session"));
    };

    state.auth.sign_out(token).await?;

    if let Some(user_id) = session.user_id() {
        info!("User {} signed out", user_id);
    }
    let cookies = clear_session_cookies(state.config.security.secure_cookies);
    Ok(ApiResponse::success(json!({ "success": true })).with_cookies(cookies))
}

/// POST /api/auth/forgot-password - always answers the same way so accounts cannot be probed
pub async fn forgot_password(State(state): State<AppState>, JsonBody(body): JsonBody) -> ApiResult<Value> {
    let command = ForgotPasswordCommand::parse(&body)?;

    let redirect_to = state.config.supabase.recovery_redirect_url.as_deref();
    if let Err(e) = state.auth.send_recovery(&command.email, redirect_to).await {
        warn!("Password recovery request failed: {}", e);
    }

    Ok(ApiResponse::success(json!({ "success": true, "message": RECOVERY_SENT })))
}

/// POST /api/auth/reset-password - set a new password inside a recovery session
pub async fn reset_password(
    State(state): State<AppState>,
    session: Session,
    JsonBody(body): JsonBody,
) -> ApiResult<Value> {
    let command = ResetPasswordCommand::parse(&body)?;
    session.require()?;
    let Some(token) = session.token.as_deref() else {
        return Err(ApiError::unauthorized("Authentication required"));
    };

    let user = state.auth.update_password(token, &command.password).await?;
    info!("User {} reset their password", user.id);
    Ok(ApiResponse::success(json!({ "success": true })))
}
