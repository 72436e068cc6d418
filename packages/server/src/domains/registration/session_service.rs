//! Registration session state machine: Created -> OtpVerified -> Completed.

use std::sync::Arc;

use chrono::Duration;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::domains::registration::errors::RegistrationError;
use crate::domains::registration::models::RegistrationSession;
use crate::kernel::BaseClock;

#[derive(Clone)]
pub struct SessionService {
    pool: PgPool,
    clock: Arc<dyn BaseClock>,
    ttl_minutes: i64,
}

impl SessionService {
    pub fn new(pool: PgPool, clock: Arc<dyn BaseClock>, ttl_minutes: i64) -> Self {
        Self {
            pool,
            clock,
            ttl_minutes,
        }
    }

    pub async fn create(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        phone_number: &str,
    ) -> Result<RegistrationSession, RegistrationError> {
        let now = self.clock.now();
        let session_id = Uuid::new_v4().to_string();

        let session = RegistrationSession::insert(
            &session_id,
            first_name,
            last_name,
            email,
            phone_number,
            now,
            now + Duration::minutes(self.ttl_minutes),
            &self.pool,
        )
        .await?;

        info!("Registration session created: {}", session.session_id);
        Ok(session)
    }

    /// Fetch a session, enforcing expiry at read time. A session can die
    /// between requests without any explicit deletion; this check is the
    /// enforcement point every caller relies on.
    pub async fn get(&self, session_id: &str) -> Result<RegistrationSession, RegistrationError> {
        let session = RegistrationSession::find_by_session_id(session_id, &self.pool)
            .await?
            .ok_or(RegistrationError::SessionNotFound)?;

        if session.is_expired(self.clock.now()) {
            return Err(RegistrationError::SessionExpired);
        }

        Ok(session)
    }

    pub async fn mark_otp_verified(&self, session_id: &str) -> Result<(), RegistrationError> {
        let session = self.get(session_id).await?;
        RegistrationSession::set_otp_verified(&session.session_id, &self.pool).await?;
        info!("OTP marked verified for session: {}", session_id);
        Ok(())
    }

    pub async fn mark_completed(&self, session_id: &str) -> Result<(), RegistrationError> {
        let session = self.get(session_id).await?;
        RegistrationSession::set_completed(&session.session_id, &self.pool).await?;
        info!("Session marked completed: {}", session_id);
        Ok(())
    }

    /// Delete expired sessions and, separately, completed ones.
    /// Returns (expired, completed) deletion counts. Idempotent.
    pub async fn cleanup(&self) -> Result<(u64, u64), RegistrationError> {
        let expired = RegistrationSession::delete_expired(self.clock.now(), &self.pool).await?;
        let completed = RegistrationSession::delete_completed(&self.pool).await?;
        info!(
            "Session cleanup removed {} expired and {} completed sessions",
            expired, completed
        );
        Ok((expired, completed))
    }
}
