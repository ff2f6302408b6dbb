use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AuthError, AuthUser};

/// Audience Supabase stamps on user access tokens
pub const AUTHENTICATED_AUDIENCE: &str = "authenticated";

/// Claims of a Supabase access token that the API relies on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    pub aud: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
}

/// Verifies HS256 access tokens with the project's JWT secret
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::ConfigMissing("SUPABASE_JWT_SECRET"));
        }
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[AUTHENTICATED_AUDIENCE]);
        Ok(Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    pub fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        Ok(AuthUser {
            id: data.claims.sub,
            email: data.claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "unit-test-secret";

    fn token(sub: Uuid, aud: &str, expires_in: Duration, secret: &str) -> String {
        let claims = Claims {
            sub,
            email: Some("reader@example.com".to_string()),
            role: Some("authenticated".to_string()),
            aud: aud.to_string(),
            exp: (Utc::now() + expires_in).timestamp(),
            iat: Some(Utc::now().timestamp()),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn accepts_valid_tokens() {
        let verifier = TokenVerifier::new(SECRET).unwrap();
        let id = Uuid::new_v4();
        let user = verifier
            .verify(&token(id, AUTHENTICATED_AUDIENCE, Duration::hours(1), SECRET))
            .unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.email.as_deref(), Some("reader@example.com"));
    }

    #[test]
    fn rejects_expired_foreign_or_misaddressed_tokens() {
        let verifier = TokenVerifier::new(SECRET).unwrap();
        let id = Uuid::new_v4();
        let cases = [
            token(id, AUTHENTICATED_AUDIENCE, Duration::hours(-2), SECRET),
            token(id, AUTHENTICATED_AUDIENCE, Duration::hours(1), "another-secret"),
            token(id, "anon", Duration::hours(1), SECRET),
        ];
        for case in cases {
            assert!(matches!(verifier.verify(&case), Err(AuthError::InvalidToken(_))));
        }
        assert!(matches!(verifier.verify("not-a-jwt"), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn empty_secret_is_a_configuration_error() {
        assert!(matches!(TokenVerifier::new(""), Err(AuthError::ConfigMissing(_))));
    }
}
