use anyhow::{anyhow, Context, Result};
use dotenvy::dotenv;
use std::env;
use twilio::Channel;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_sms_from: String,
    pub twilio_whatsapp_from: String,
    pub otp_length: usize,
    pub otp_ttl_minutes: i64,
    pub session_ttl_minutes: i64,
    /// Channel used for the initial OTP send.
    pub otp_primary_channel: Channel,
    /// Escalation channel for unacknowledged codes. `None` disables reminders.
    pub otp_reminder_channel: Option<Channel>,
    pub reminder_delay_minutes: i64,
    pub cleanup_interval_secs: u64,
    pub reminder_sweep_interval_secs: u64,
    pub keycloak_base_url: String,
    pub keycloak_realm: String,
    pub keycloak_client_id: String,
    pub keycloak_client_secret: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let primary = env::var("OTP_PRIMARY_CHANNEL").unwrap_or_else(|_| "whatsapp".to_string());
        let otp_primary_channel = Channel::parse(&primary)
            .ok_or_else(|| anyhow!("OTP_PRIMARY_CHANNEL must be 'sms' or 'whatsapp', got '{primary}'"))?;

        let reminder = env::var("OTP_REMINDER_CHANNEL").unwrap_or_else(|_| "sms".to_string());
        let otp_reminder_channel = match reminder.to_ascii_lowercase().as_str() {
            "" | "none" => None,
            other => Some(
                Channel::parse(other).ok_or_else(|| {
                    anyhow!("OTP_REMINDER_CHANNEL must be 'sms', 'whatsapp' or 'none', got '{other}'")
                })?,
            ),
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            twilio_account_sid: env::var("TWILIO_ACCOUNT_SID")
                .context("TWILIO_ACCOUNT_SID must be set")?,
            twilio_auth_token: env::var("TWILIO_AUTH_TOKEN")
                .context("TWILIO_AUTH_TOKEN must be set")?,
            twilio_sms_from: env::var("TWILIO_SMS_FROM")
                .context("TWILIO_SMS_FROM must be set")?,
            twilio_whatsapp_from: env::var("TWILIO_WHATSAPP_FROM")
                .context("TWILIO_WHATSAPP_FROM must be set")?,
            otp_length: env::var("OTP_LENGTH")
                .unwrap_or_else(|_| "6".to_string())
                .parse()
                .context("OTP_LENGTH must be a valid number")?,
            otp_ttl_minutes: env::var("OTP_TTL_MINUTES")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("OTP_TTL_MINUTES must be a valid number")?,
            session_ttl_minutes: env::var("SESSION_TTL_MINUTES")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .context("SESSION_TTL_MINUTES must be a valid number")?,
            otp_primary_channel,
            otp_reminder_channel,
            // Must stay below OTP_TTL_MINUTES or codes expire before the
            // sweep ever considers them.
            reminder_delay_minutes: env::var("REMINDER_DELAY_MINUTES")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .context("REMINDER_DELAY_MINUTES must be a valid number")?,
            cleanup_interval_secs: env::var("CLEANUP_INTERVAL_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .context("CLEANUP_INTERVAL_SECS must be a valid number")?,
            reminder_sweep_interval_secs: env::var("REMINDER_SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .context("REMINDER_SWEEP_INTERVAL_SECS must be a valid number")?,
            keycloak_base_url: env::var("KEYCLOAK_BASE_URL")
                .context("KEYCLOAK_BASE_URL must be set")?,
            keycloak_realm: env::var("KEYCLOAK_REALM")
                .context("KEYCLOAK_REALM must be set")?,
            keycloak_client_id: env::var("KEYCLOAK_CLIENT_ID")
                .context("KEYCLOAK_CLIENT_ID must be set")?,
            keycloak_client_secret: env::var("KEYCLOAK_CLIENT_SECRET")
                .context("KEYCLOAK_CLIENT_SECRET must be set")?,
        })
    }
}
