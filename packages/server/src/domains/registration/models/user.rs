use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// User - a finalized, phone-verified account
///
/// Written once at the end of a registration flow. Holds the Argon2 digest
/// and a reference to the identity created in Keycloak.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub password_hash: String,
    pub phone_verified: bool,
    pub active: bool,
    pub keycloak_user_id: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl User {
    pub async fn insert(self, pool: &PgPool) -> Result<Self> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users
                (id, first_name, last_name, email, phone_number,
                 password_hash, phone_verified, active, keycloak_user_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(&self.first_name)
        .bind(&self.last_name)
        .bind(&self.email)
        .bind(&self.phone_number)
        .bind(&self.password_hash)
        .bind(self.phone_verified)
        .bind(self.active)
        .bind(&self.keycloak_user_id)
        .bind(self.created_at)
        .fetch_one(pool)
        .await?;
        Ok(user)
    }

    pub async fn exists_by_email(email: &str, pool: &PgPool) -> Result<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(pool)
                .await?;
        Ok(exists)
    }

    pub async fn exists_by_phone(phone_number: &str, pool: &PgPool) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE phone_number = $1)",
        )
        .bind(phone_number)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    pub async fn find_by_email(email: &str, pool: &PgPool) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }
}
