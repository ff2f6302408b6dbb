use serde_json::Value;

use super::rules;
use super::{incomplete, Fields, Schema, ValidationErrors};

const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 128;

/// POST /api/auth/login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCommand {
    pub email: String,
    pub password: String,
}

impl Schema for LoginCommand {
    fn parse(input: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(input);
        let email = fields.check("email", rules::email(fields.get("email")));
        // Sign-in only requires a password to be present; strength is checked at registration
        let password = fields.check("password", rules::password(fields.get("password"), 1, PASSWORD_MAX));
        fields.finish()?;

        let (Some(email), Some(password)) = (email, password) else {
            return Err(incomplete());
        };
        Ok(Self { email, password })
    }
}

/// POST /api/auth/register
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterCommand {
    pub email: String,
    pub password: String,
}

impl Schema for RegisterCommand {
    fn parse(input: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(input);
        let email = fields.check("email", rules::email(fields.get("email")));
        let password = fields.check(
            "password",
            rules::password(fields.get("password"), PASSWORD_MIN, PASSWORD_MAX),
        );
        let confirmation = confirm_password(&mut fields, password.as_deref());
        fields.finish()?;

        let (Some(email), Some(password), Some(())) = (email, password, confirmation) else {
            return Err(incomplete());
        };
        Ok(Self { email, password })
    }
}

/// POST /api/auth/forgot-password
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForgotPasswordCommand {
    pub email: String,
}

impl Schema for ForgotPasswordCommand {
    fn parse(input: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(input);
        let email = fields.check("email", rules::email(fields.get("email")));
        fields.finish()?;

        let Some(email) = email else {
            return Err(incomplete());
        };
        Ok(Self { email })
    }
}

/// POST /api/auth/reset-password
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetPasswordCommand {
    pub password: String,
}

impl Schema for ResetPasswordCommand {
    fn parse(input: &Value) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(input);
        let password = fields.check(
            "password",
            rules::password(fields.get("password"), PASSWORD_MIN, PASSWORD_MAX),
        );
        let confirmation = confirm_password(&mut fields, password.as_deref());
        fields.finish()?;

        let (Some(password), Some(())) = (password, confirmation) else {
            return Err(incomplete());
        };
        Ok(Self { password })
    }
}

/// `confirmPassword` must repeat the password; skipped when the password itself failed
fn confirm_password(fields: &mut Fields<'_>, password: Option<&str>) -> Option<()> {
    let confirmation = match fields.get("confirmPassword") {
        Some(Value::String(s)) => Some(s.as_str()),
        _ => None,
    };
    match (password, confirmation) {
        (None, _) => Some(()),
        (Some(password), Some(confirmation)) if password == confirmation => Some(()),
        (Some(_), None) => fields.check("confirmPassword", Err("Please confirm your password".into())),
        (Some(_), Some(_)) => fields.check("confirmPassword", Err("Passwords do not match".into())),
    }
}
