//! Service fixtures wired with mock collaborators and a manual clock.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use sqlx::PgPool;
use tokio::sync::Mutex;
use twilio::Channel;
use uuid::Uuid;

use server_core::domains::registration::{
    OtpConfig, OtpService, RegistrationService, SessionService,
};
use server_core::kernel::{
    BaseClock, ManualClock, MockMessenger, MockPasswordHasher, MockProvisioner,
};

pub const OTP_TTL_MINUTES: i64 = 5;
pub const SESSION_TTL_MINUTES: i64 = 120;
pub const REMINDER_DELAY_MINUTES: i64 = 2;

/// Cleanup and reminder sweeps scan the whole (shared) database, so tests
/// that run them hold this lock and pin their clocks to an epoch far in the
/// past. Rows from ordinary flow tests live decades later and are invisible
/// to a sweep running at the old epoch, and vice versa.
pub static GLOBAL_SWEEP_LOCK: Mutex<()> = Mutex::const_new(());

/// Everything a flow test needs: the services plus handles on the mocks.
pub struct TestServices {
    pub clock: ManualClock,
    pub messenger: MockMessenger,
    pub provisioner: MockProvisioner,
    pub otp: OtpService,
    pub sessions: SessionService,
    pub registration: RegistrationService,
}

impl TestServices {
    /// Current manual-clock time.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

/// Epoch for ordinary flow tests.
pub fn test_start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

/// Epoch for tests holding `GLOBAL_SWEEP_LOCK`.
pub fn sweep_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap()
}

pub fn build_test_services(pool: PgPool) -> TestServices {
    build_test_services_at(pool, test_start_time())
}

pub fn build_test_services_at(pool: PgPool, start: DateTime<Utc>) -> TestServices {
    let clock = ManualClock::new(start);
    let messenger = MockMessenger::new();
    let provisioner = MockProvisioner::new();

    let otp = OtpService::new(
        pool.clone(),
        Arc::new(messenger.clone()),
        Arc::new(clock.clone()),
        OtpConfig {
            code_length: 6,
            ttl_minutes: OTP_TTL_MINUTES,
            primary_channel: Channel::Whatsapp,
            reminder_channel: Some(Channel::Sms),
            reminder_delay_minutes: REMINDER_DELAY_MINUTES,
        },
    );

    let sessions = SessionService::new(pool.clone(), Arc::new(clock.clone()), SESSION_TTL_MINUTES);

    let registration = RegistrationService::new(
        pool.clone(),
        sessions.clone(),
        otp.clone(),
        Arc::new(provisioner.clone()),
        Arc::new(MockPasswordHasher),
        Arc::new(clock.clone()),
    );

    TestServices {
        clock,
        messenger,
        provisioner,
        otp,
        sessions,
        registration,
    }
}

/// Unique phone number per test so tests can share one database.
pub fn unique_phone() -> String {
    let n = Uuid::new_v4().as_u128() % 10_000_000;
    format!("+1555{:07}", n)
}

/// Unique email per test.
pub fn unique_email() -> String {
    format!("user-{}@example.com", Uuid::new_v4())
}
