use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// RegistrationSession - an in-progress enrollment attempt
///
/// The opaque `session_id` is the client-visible handle for the flow.
/// Identity fields are immutable after creation; only the two flags and
/// eventual deletion mutate the row. `completed` implies `otp_verified`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RegistrationSession {
    pub id: i64,
    pub session_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub otp_verified: bool,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl RegistrationSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl RegistrationSession {
    pub async fn insert(
        session_id: &str,
        first_name: &str,
        last_name: &str,
        email: &str,
        phone_number: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Self> {
        let session = sqlx::query_as::<_, RegistrationSession>(
            r#"
            INSERT INTO registration_sessions
                (session_id, first_name, last_name, email, phone_number,
                 otp_verified, completed, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, FALSE, FALSE, $6, $7)
            RETURNING *
            "#,
        )
        .bind(session_id)
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(phone_number)
        .bind(created_at)
        .bind(expires_at)
        .fetch_one(pool)
        .await?;
        Ok(session)
    }

    pub async fn find_by_session_id(session_id: &str, pool: &PgPool) -> Result<Option<Self>> {
        let session = sqlx::query_as::<_, RegistrationSession>(
            "SELECT * FROM registration_sessions WHERE session_id = $1",
        )
        .bind(session_id)
        .fetch_optional(pool)
        .await?;
        Ok(session)
    }

    pub async fn set_otp_verified(session_id: &str, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE registration_sessions SET otp_verified = TRUE WHERE session_id = $1")
            .bind(session_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn set_completed(session_id: &str, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE registration_sessions SET completed = TRUE WHERE session_id = $1")
            .bind(session_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn delete_expired(now: DateTime<Utc>, pool: &PgPool) -> Result<u64> {
        let result = sqlx::query("DELETE FROM registration_sessions WHERE expires_at < $1")
            .bind(now)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Completed sessions carry no further state; they are purged eagerly
    /// on the next sweep rather than on the completion write path.
    pub async fn delete_completed(pool: &PgPool) -> Result<u64> {
        let result = sqlx::query("DELETE FROM registration_sessions WHERE completed = TRUE")
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn session_dies_only_after_its_deadline() {
        let created = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        let session = RegistrationSession {
            id: 1,
            session_id: "s-1".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone_number: "+15550000000".to_string(),
            otp_verified: false,
            completed: false,
            created_at: created,
            expires_at: created + Duration::minutes(120),
        };

        assert!(!session.is_expired(created + Duration::minutes(119)));
        assert!(!session.is_expired(created + Duration::minutes(120)));
        assert!(session.is_expired(created + Duration::minutes(121)));
    }
}
