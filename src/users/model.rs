use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::media::StoredPhoto;

/// Route-gating role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Manager,
    Admin,
}

/// User record in the database. The credential hash and reset-token fields
/// never leave the process as JSON.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub photo_id: String,
    pub photo_url: String,
    pub role: Role,
    #[serde(skip_serializing)]
    pub forgot_password_token: Option<String>,
    #[serde(skip_serializing)]
    pub forgot_password_expiry: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl User {
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
        photo: &StoredPhoto,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, photo_id, photo_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, password_hash, photo_id, photo_url, role,
                      forgot_password_token, forgot_password_expiry, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(&photo.id)
        .bind(&photo.url)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, photo_id, photo_url, role,
                   forgot_password_token, forgot_password_expiry, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, photo_id, photo_url, role,
                   forgot_password_token, forgot_password_expiry, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, photo_id, photo_url, role,
                   forgot_password_token, forgot_password_expiry, created_at
            FROM users
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn list_by_role(db: &PgPool, role: Role) -> anyhow::Result<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, photo_id, photo_url, role,
                   forgot_password_token, forgot_password_expiry, created_at
            FROM users
            WHERE role = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(role)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Validated profile update; the photo columns change only when a new
    /// photo was uploaded.
    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        name: &str,
        email: &str,
        photo: Option<&StoredPhoto>,
    ) -> anyhow::Result<Option<User>> {
        let user = match photo {
            Some(photo) => {
                sqlx::query_as::<_, User>(
                    r#"
                    UPDATE users
                    SET name = $2, email = $3, photo_id = $4, photo_url = $5
                    WHERE id = $1
                    RETURNING id, name, email, password_hash, photo_id, photo_url, role,
                              forgot_password_token, forgot_password_expiry, created_at
                    "#,
                )
                .bind(id)
                .bind(name)
                .bind(email)
                .bind(&photo.id)
                .bind(&photo.url)
                .fetch_optional(db)
                .await?
            }
            None => {
                sqlx::query_as::<_, User>(
                    r#"
                    UPDATE users
                    SET name = $2, email = $3
                    WHERE id = $1
                    RETURNING id, name, email, password_hash, photo_id, photo_url, role,
                              forgot_password_token, forgot_password_expiry, created_at
                    "#,
                )
                .bind(id)
                .bind(name)
                .bind(email)
                .fetch_optional(db)
                .await?
            }
        };
        Ok(user)
    }

    /// Admin update: may also move the user to another role.
    pub async fn admin_update(
        db: &PgPool,
        id: Uuid,
        name: &str,
        email: &str,
        role: Role,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $2, email = $3, role = $4
            WHERE id = $1
            RETURNING id, name, email, password_hash, photo_id, photo_url, role,
                      forgot_password_token, forgot_password_expiry, created_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(role)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Partial save: only the credential hash changes.
    pub async fn set_password(db: &PgPool, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        sqlx::query(r#"UPDATE users SET password_hash = $2 WHERE id = $1"#)
            .bind(id)
            .bind(password_hash)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Partial save: stores the digest of a freshly issued reset token,
    /// overwriting any outstanding one.
    pub async fn set_reset_token(
        db: &PgPool,
        id: Uuid,
        token_digest: &str,
        expiry: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET forgot_password_token = $2, forgot_password_expiry = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token_digest)
        .bind(expiry)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Partial save: rollback path when the reset email never went out.
    pub async fn clear_reset_token(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET forgot_password_token = NULL, forgot_password_expiry = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Expiry is a query predicate: expired tokens never match.
    pub async fn find_by_reset_token(
        db: &PgPool,
        token_digest: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, photo_id, photo_url, role,
                   forgot_password_token, forgot_password_expiry, created_at
            FROM users
            WHERE forgot_password_token = $1 AND forgot_password_expiry > $2
            "#,
        )
        .bind(token_digest)
        .bind(now)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Partial save: new credential hash and token consumption in one
    /// statement, so a consumed token can never be replayed.
    pub async fn reset_password(
        db: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET password_hash = $2, forgot_password_token = NULL, forgot_password_expiry = NULL
            WHERE id = $1
            RETURNING id, name, email, password_hash, photo_id, photo_url, role,
                      forgot_password_token, forgot_password_expiry, created_at
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}
