use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
    Json,
};
use serde_json::Value;
use std::convert::Infallible;
use tracing::debug;
use uuid::Uuid;

use crate::auth::{session_token, AuthUser};
use crate::database::DatabaseRole;
use crate::error::ApiError;
use crate::state::AppState;

/// Caller's session as resolved by [`session_middleware`]
///
/// Present on every request. `user` is `None` for anonymous callers and for tokens that failed
/// verification; handlers that need a user call [`Session::require`] after validating input.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Raw token as sent by the client, verified or not
    pub token: Option<String>,
    pub user: Option<AuthUser>,
}

impl Session {
    pub fn require(&self) -> Result<&AuthUser, ApiError> {
        self.user
            .as_ref()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user.as_ref().map(|user| user.id)
    }

    /// Database role for queries made on behalf of this caller
    pub fn role(&self) -> DatabaseRole {
        DatabaseRole::for_user(self.user_id())
    }
}

/// Resolve the session token (cookie or bearer header) and attach a [`Session`]; never rejects
pub async fn session_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let token = session_token(request.headers());
    let user = token.as_deref().and_then(|token| match state.verifier.verify(token) {
        Ok(user) => Some(user),
        Err(e) => {
            debug!("Ignoring session token: {}", e);
            None
        }
    });

    request.extensions_mut().insert(Session { token, user });
    next.run(request).await
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Session>().cloned().unwrap_or_default())
    }
}

/// JSON body that is validated by a schema afterwards; malformed JSON becomes a 400
#[derive(Debug)]
pub struct JsonBody(pub Value);

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<Value>::from_request(request, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                debug!("Rejected request body: {}", rejection.body_text());
                Err(ApiError::invalid_json("Request body must be valid JSON"))
            }
        }
    }
}
