//! OTP issuance, verification and reconciliation.

use std::sync::Arc;

use chrono::Duration;
use rand::Rng;
use sqlx::PgPool;
use tracing::{error, info, warn};
use twilio::Channel;

use crate::domains::registration::errors::RegistrationError;
use crate::domains::registration::models::OtpCode;
use crate::kernel::{BaseClock, BaseMessagingService};

/// Tunables for the OTP engine, taken from `Config` at wiring time.
#[derive(Debug, Clone)]
pub struct OtpConfig {
    pub code_length: usize,
    pub ttl_minutes: i64,
    pub primary_channel: Channel,
    /// Escalation channel; `None` disables the reminder sweep entirely.
    pub reminder_channel: Option<Channel>,
    pub reminder_delay_minutes: i64,
}

#[derive(Clone)]
pub struct OtpService {
    pool: PgPool,
    messenger: Arc<dyn BaseMessagingService>,
    clock: Arc<dyn BaseClock>,
    config: OtpConfig,
}

impl OtpService {
    pub fn new(
        pool: PgPool,
        messenger: Arc<dyn BaseMessagingService>,
        clock: Arc<dyn BaseClock>,
        config: OtpConfig,
    ) -> Self {
        Self {
            pool,
            messenger,
            clock,
            config,
        }
    }

    /// Issue a fresh code for a phone number, replacing any unused one.
    ///
    /// The delete-and-insert runs in one transaction so no stale code stays
    /// valid once the replacement exists. The send happens after commit: on
    /// failure the stored code survives until expiry or replacement, but the
    /// caller sees `MessagingFailure` and re-issuing is the remediation.
    pub async fn issue(&self, phone_number: &str) -> Result<OtpCode, RegistrationError> {
        let now = self.clock.now();
        let code = generate_code(self.config.code_length);

        let mut tx = self.pool.begin().await?;
        OtpCode::delete_unused_by_phone(phone_number, &mut tx).await?;
        let mut otp = OtpCode::insert(
            phone_number,
            &code,
            now,
            now + Duration::minutes(self.config.ttl_minutes),
            &mut tx,
        )
        .await?;
        tx.commit().await?;

        let body = format!(
            "Your verification code is: {}. It expires in {} minutes.",
            code, self.config.ttl_minutes
        );

        if let Err(e) = self
            .messenger
            .send(self.config.primary_channel, phone_number, &body)
            .await
        {
            warn!("Primary OTP send failed for {}: {}", phone_number, e);
            return Err(RegistrationError::MessagingFailure(e));
        }

        let sent_at = self.clock.now();
        OtpCode::set_primary_sent(otp.id, sent_at, &self.pool).await?;
        otp.primary_sent_at = Some(sent_at);

        info!(
            "OTP issued for {} over {}",
            phone_number,
            self.config.primary_channel.as_str()
        );
        Ok(otp)
    }

    /// Verify a candidate code and consume it on success.
    ///
    /// The whole read-check-write runs in one transaction with the row
    /// locked, so two concurrent attempts against the same code cannot both
    /// succeed.
    pub async fn verify(
        &self,
        phone_number: &str,
        candidate: &str,
    ) -> Result<(), RegistrationError> {
        let now = self.clock.now();

        let mut tx = self.pool.begin().await?;
        let Some(otp) = OtpCode::find_valid_for_update(phone_number, now, &mut tx).await? else {
            // Stale codes are filtered by the lookup, so "expired" and
            // "never issued" are indistinguishable here on purpose.
            return Err(RegistrationError::InvalidOtp("Invalid or expired OTP code"));
        };

        if otp.code != candidate {
            return Err(RegistrationError::InvalidOtp("Incorrect OTP code"));
        }

        // The TTL boundary can be crossed between the lookup and this point.
        if otp.is_expired(self.clock.now()) {
            return Err(RegistrationError::ExpiredOtp);
        }

        let updated = OtpCode::mark_used(otp.id, &mut tx).await?;
        if updated == 0 {
            return Err(RegistrationError::InvalidOtp("Invalid or expired OTP code"));
        }
        tx.commit().await?;

        info!("OTP verified for {}", phone_number);
        Ok(())
    }

    /// Delete every code past expiry, used or not. Idempotent.
    pub async fn cleanup(&self) -> Result<u64, RegistrationError> {
        let deleted = OtpCode::delete_expired(self.clock.now(), &self.pool).await?;
        info!("Expired OTP cleanup removed {} codes", deleted);
        Ok(deleted)
    }

    /// Escalate delivery for codes unacknowledged past the reminder delay.
    ///
    /// Each record is escalated at most once; a failed send for one record
    /// is logged and the sweep moves on, leaving that record eligible for
    /// the next run.
    pub async fn reminder_sweep(&self) -> Result<usize, RegistrationError> {
        let Some(channel) = self.config.reminder_channel else {
            return Ok(0);
        };

        let now = self.clock.now();
        let sent_before = now - Duration::minutes(self.config.reminder_delay_minutes);
        let due = OtpCode::find_due_for_reminder(now, sent_before, &self.pool).await?;

        if due.is_empty() {
            return Ok(0);
        }

        info!("Reminder sweep found {} unacknowledged codes", due.len());

        let mut escalated = 0;
        for otp in due {
            let body = format!(
                "Check {}, your verification code was already sent. Code: {}",
                self.config.primary_channel.as_str(),
                otp.code
            );

            if let Err(e) = self.messenger.send(channel, &otp.phone_number, &body).await {
                error!("Reminder send failed for {}: {}", otp.phone_number, e);
                continue;
            }

            if let Err(e) =
                OtpCode::set_reminder_sent(otp.id, self.clock.now(), &self.pool).await
            {
                error!(
                    "Failed to record reminder for {}: {}",
                    otp.phone_number, e
                );
                continue;
            }

            escalated += 1;
            info!("Reminder sent for {} (OTP id {})", otp.phone_number, otp.id);
        }

        Ok(escalated)
    }
}

/// Fixed-length numeric code from the OS CSPRNG.
fn generate_code(length: usize) -> String {
    let mut rng = rand::rngs::OsRng;
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_has_requested_length() {
        assert_eq!(generate_code(6).len(), 6);
        assert_eq!(generate_code(8).len(), 8);
    }

    #[test]
    fn code_is_all_digits() {
        for _ in 0..100 {
            assert!(generate_code(6).chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn codes_vary() {
        let codes: std::collections::HashSet<String> =
            (0..50).map(|_| generate_code(6)).collect();
        assert!(codes.len() > 1, "50 draws should not all collide");
    }
}
