use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

/// OtpCode - a one-time passcode issued for a phone number
///
/// History is retained until cleanup; the issuance protocol guarantees at
/// most one row per phone with `used = false` and a future `expires_at`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OtpCode {
    pub id: i64,
    pub phone_number: String,
    pub code: String,
    pub used: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Set once the primary-channel send succeeds.
    pub primary_sent_at: Option<DateTime<Utc>>,
    /// Set at most once, by the reminder sweep.
    pub reminder_sent_at: Option<DateTime<Utc>>,
}

impl OtpCode {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl OtpCode {
    /// Delete every unused code for a phone number (replacement semantics).
    /// Runs inside the issuance transaction so no stale code stays valid
    /// once the new one is inserted.
    pub async fn delete_unused_by_phone(phone_number: &str, conn: &mut PgConnection) -> Result<u64> {
        let result = sqlx::query("DELETE FROM otp_codes WHERE phone_number = $1 AND used = FALSE")
            .bind(phone_number)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Insert a freshly issued code.
    pub async fn insert(
        phone_number: &str,
        code: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let otp = sqlx::query_as::<_, OtpCode>(
            r#"
            INSERT INTO otp_codes (phone_number, code, used, created_at, expires_at)
            VALUES ($1, $2, FALSE, $3, $4)
            RETURNING *
            "#,
        )
        .bind(phone_number)
        .bind(code)
        .bind(created_at)
        .bind(expires_at)
        .fetch_one(conn)
        .await?;
        Ok(otp)
    }

    /// Most recently created unused, unexpired code for a phone number.
    /// Locks the row so concurrent verifications serialize on it.
    pub async fn find_valid_for_update(
        phone_number: &str,
        now: DateTime<Utc>,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        let otp = sqlx::query_as::<_, OtpCode>(
            r#"
            SELECT * FROM otp_codes
            WHERE phone_number = $1 AND used = FALSE AND expires_at > $2
            ORDER BY created_at DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(phone_number)
        .bind(now)
        .fetch_optional(conn)
        .await?;
        Ok(otp)
    }

    /// Flip `used` false -> true. Returns 0 if another writer got there first.
    pub async fn mark_used(id: i64, conn: &mut PgConnection) -> Result<u64> {
        let result = sqlx::query("UPDATE otp_codes SET used = TRUE WHERE id = $1 AND used = FALSE")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Record the successful primary-channel send.
    pub async fn set_primary_sent(id: i64, at: DateTime<Utc>, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE otp_codes SET primary_sent_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Record the fallback-channel escalation.
    pub async fn set_reminder_sent(id: i64, at: DateTime<Utc>, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE otp_codes SET reminder_sent_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Delete every code past expiry, used or not.
    pub async fn delete_expired(now: DateTime<Utc>, pool: &PgPool) -> Result<u64> {
        let result = sqlx::query("DELETE FROM otp_codes WHERE expires_at < $1")
            .bind(now)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Codes whose primary send is unacknowledged past the reminder delay.
    /// The `reminder_sent_at IS NULL` filter is the at-most-once dedup.
    pub async fn find_due_for_reminder(
        now: DateTime<Utc>,
        sent_before: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let otps = sqlx::query_as::<_, OtpCode>(
            r#"
            SELECT * FROM otp_codes
            WHERE used = FALSE
              AND expires_at > $1
              AND primary_sent_at IS NOT NULL
              AND primary_sent_at <= $2
              AND reminder_sent_at IS NULL
            ORDER BY created_at
            "#,
        )
        .bind(now)
        .bind(sent_before)
        .fetch_all(pool)
        .await?;
        Ok(otps)
    }

    /// All unused, unexpired codes for a phone number (newest first).
    pub async fn find_active_by_phone(
        phone_number: &str,
        now: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let otps = sqlx::query_as::<_, OtpCode>(
            r#"
            SELECT * FROM otp_codes
            WHERE phone_number = $1 AND used = FALSE AND expires_at > $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(phone_number)
        .bind(now)
        .fetch_all(pool)
        .await?;
        Ok(otps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn code_expiring_at(expires_at: DateTime<Utc>) -> OtpCode {
        OtpCode {
            id: 1,
            phone_number: "+15550000000".to_string(),
            code: "123456".to_string(),
            used: false,
            created_at: expires_at - chrono::Duration::minutes(5),
            expires_at,
            primary_sent_at: None,
            reminder_sent_at: None,
        }
    }

    #[test]
    fn not_expired_before_deadline() {
        let deadline = Utc.with_ymd_and_hms(2025, 6, 1, 12, 5, 0).unwrap();
        let otp = code_expiring_at(deadline);
        assert!(!otp.is_expired(deadline - chrono::Duration::seconds(1)));
    }

    #[test]
    fn not_expired_exactly_at_deadline() {
        let deadline = Utc.with_ymd_and_hms(2025, 6, 1, 12, 5, 0).unwrap();
        let otp = code_expiring_at(deadline);
        assert!(!otp.is_expired(deadline));
    }

    #[test]
    fn expired_after_deadline() {
        let deadline = Utc.with_ymd_and_hms(2025, 6, 1, 12, 5, 0).unwrap();
        let otp = code_expiring_at(deadline);
        assert!(otp.is_expired(deadline + chrono::Duration::seconds(1)));
    }
}
