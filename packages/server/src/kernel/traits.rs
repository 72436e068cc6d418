// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (like "issue an OTP") lives in domain services that use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseMessagingService)

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use twilio::Channel;

// =============================================================================
// Messaging Trait (Infrastructure - SMS/WhatsApp delivery)
// =============================================================================

#[async_trait]
pub trait BaseMessagingService: Send + Sync {
    /// Send a message over the given channel. The call outcome is the only
    /// delivery signal; there is no retry inside this seam.
    async fn send(&self, channel: Channel, to: &str, body: &str) -> Result<()>;
}

// =============================================================================
// Account Provisioning Trait (Infrastructure - external identity provider)
// =============================================================================

#[async_trait]
pub trait BaseAccountProvisioner: Send + Sync {
    /// Create the external identity and return its provider-side id.
    /// Called exactly once per completion attempt; retry safety is not assumed.
    async fn create_account(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        phone_number: &str,
        password: &str,
    ) -> Result<String>;
}

// =============================================================================
// Password Hashing Trait (Infrastructure)
// =============================================================================

pub trait BasePasswordHasher: Send + Sync {
    /// Hash a plaintext password into a storable digest.
    fn hash(&self, plaintext: &str) -> Result<String>;
}

// =============================================================================
// Clock Trait (Infrastructure - injected so temporal logic is testable)
// =============================================================================

pub trait BaseClock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock reading system time.
pub struct SystemClock;

impl BaseClock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
