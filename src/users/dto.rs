use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::users::model::{Role, User};

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdminUpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

/// Text fields collected from the signup multipart form.
#[derive(Debug, Default)]
pub struct SignupFields {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl SignupFields {
    /// Explicit validator run before the storage call; messages are part of
    /// the public API contract.
    pub fn validate(self) -> Result<(String, String, String), ApiError> {
        let (Some(name), Some(email), Some(password)) = (self.name, self.email, self.password)
        else {
            return Err(ApiError::bad_request("Name, email and password are required"));
        };
        let name = name.trim().to_string();
        let email = email.trim().to_lowercase();
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(ApiError::bad_request("Name, email and password are required"));
        }
        if !is_valid_email(&email) {
            return Err(ApiError::bad_request("Invalid email"));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(ApiError::bad_request("Password must be at least 6 characters"));
        }
        Ok((name, email, password))
    }
}

// --- Response bodies ---

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: User,
}

/// Listing shape kept wire-compatible with the original API: the array is
/// still keyed `user`.
#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub success: bool,
    #[serde(rename = "user")]
    pub users: Vec<User>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: &str, email: &str, password: &str) -> SignupFields {
        SignupFields {
            name: Some(name.into()),
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    #[test]
    fn accepts_a_complete_signup_and_normalizes_email() {
        let (name, email, password) = fields("Alice", "  Alice@Example.COM ", "hunter22")
            .validate()
            .unwrap();
        assert_eq!(name, "Alice");
        assert_eq!(email, "alice@example.com");
        assert_eq!(password, "hunter22");
    }

    #[test]
    fn rejects_missing_or_empty_fields() {
        for broken in [
            SignupFields::default(),
            SignupFields {
                name: None,
                ..fields("x", "a@b.co", "hunter22")
            },
            fields("", "a@b.co", "hunter22"),
            fields("Alice", "  ", "hunter22"),
            fields("Alice", "a@b.co", ""),
        ] {
            let err = broken.validate().unwrap_err();
            assert_eq!(err.message, "Name, email and password are required");
        }
    }

    #[test]
    fn rejects_bad_email_shape() {
        let err = fields("Alice", "not-an-email", "hunter22").validate().unwrap_err();
        assert_eq!(err.message, "Invalid email");
    }

    #[test]
    fn rejects_short_password() {
        let err = fields("Alice", "a@b.co", "short").validate().unwrap_err();
        assert_eq!(err.message, "Password must be at least 6 characters");
    }

    #[test]
    fn email_regex_cases() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last@sub.domain.org"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.de"));
        assert!(!is_valid_email("@c.de"));
    }

    #[test]
    fn user_list_response_keeps_legacy_key() {
        let body = UserListResponse {
            success: true,
            users: vec![],
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains(r#""user":[]"#));
        assert!(!json.contains(r#""users""#));
    }
}
