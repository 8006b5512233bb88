use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use crate::{
    auth::{jwt::JwtKeys, session::SESSION_COOKIE},
    error::ApiError,
    state::AppState,
    users::model::{Role, User},
};

/// Resolved identity of an authenticated request: the full user row behind
/// the session token. Token checks run before any I/O; the row is loaded
/// afterwards so handlers see the current role.
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .or_else(|| bearer_token(parts));

        let Some(token) = token else {
            return Err(ApiError::unauthorized("Login first to access this page"));
        };

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(&token).map_err(|_| {
            warn!("invalid or expired session token");
            ApiError::unauthorized("Invalid or expired token")
        })?;

        // A token may outlive its subject; a deleted user is not a session.
        let user = User::find_by_id(&state.db, claims.sub)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Invalid or expired token"))?;

        Ok(CurrentUser(user))
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Admin-gated identity; runs after `CurrentUser` in the same pipeline.
pub struct RequireAdmin(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        require_role(&user, Role::Admin)?;
        Ok(RequireAdmin(user))
    }
}

/// Manager-gated identity.
pub struct RequireManager(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireManager {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        require_role(&user, Role::Manager)?;
        Ok(RequireManager(user))
    }
}

fn require_role(user: &User, role: Role) -> Result<(), ApiError> {
    if user.role != role {
        warn!(user_id = %user.id, have = ?user.role, want = ?role, "role check failed");
        return Err(ApiError::forbidden("You are not allowed for this resource"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn user_with_role(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Test".into(),
            email: "test@example.com".into(),
            password_hash: "hash".into(),
            photo_id: "users/x.jpg".into(),
            photo_url: "https://fake.local/users/x.jpg".into(),
            role,
            forgot_password_token: None,
            forgot_password_expiry: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn admin_passes_admin_check() {
        assert!(require_role(&user_with_role(Role::Admin), Role::Admin).is_ok());
    }

    #[test]
    fn user_fails_admin_check_with_forbidden() {
        let err = require_role(&user_with_role(Role::User), Role::Admin).unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.message, "You are not allowed for this resource");
    }

    #[test]
    fn admin_is_not_a_manager() {
        assert!(require_role(&user_with_role(Role::Admin), Role::Manager).is_err());
    }
}
