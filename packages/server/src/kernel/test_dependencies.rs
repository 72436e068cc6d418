// Mock implementations for testing
//
// Provides mock collaborators that can be injected into the registration
// services in unit and integration tests.

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};
use twilio::Channel;
use uuid::Uuid;

use super::{BaseAccountProvisioner, BaseClock, BaseMessagingService, BasePasswordHasher};

// =============================================================================
// Mock Messenger
// =============================================================================

/// A message captured by the mock messenger
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub channel: Channel,
    pub to: String,
    pub body: String,
}

/// Records outbound messages; can be armed to fail the next N sends.
#[derive(Clone, Default)]
pub struct MockMessenger {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    fail_next: Arc<Mutex<u32>>,
}

impl MockMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages sent so far, in order.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Arm the messenger to fail the next `n` send calls.
    pub fn fail_next(&self, n: u32) {
        *self.fail_next.lock().unwrap() = n;
    }
}

#[async_trait]
impl BaseMessagingService for MockMessenger {
    async fn send(&self, channel: Channel, to: &str, body: &str) -> Result<()> {
        {
            let mut remaining = self.fail_next.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                bail!("simulated messaging outage");
            }
        }
        self.sent.lock().unwrap().push(SentMessage {
            channel,
            to: to.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

// =============================================================================
// Mock Provisioner
// =============================================================================

/// An account captured by the mock provisioner
#[derive(Debug, Clone)]
pub struct ProvisionedAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
}

/// Records provisioning calls and hands back fresh ids.
#[derive(Clone, Default)]
pub struct MockProvisioner {
    created: Arc<Mutex<Vec<ProvisionedAccount>>>,
    fail_next: Arc<Mutex<u32>>,
}

impl MockProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> Vec<ProvisionedAccount> {
        self.created.lock().unwrap().clone()
    }

    pub fn fail_next(&self, n: u32) {
        *self.fail_next.lock().unwrap() = n;
    }
}

#[async_trait]
impl BaseAccountProvisioner for MockProvisioner {
    async fn create_account(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        phone_number: &str,
        _password: &str,
    ) -> Result<String> {
        {
            let mut remaining = self.fail_next.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                bail!("simulated identity provider outage");
            }
        }
        self.created.lock().unwrap().push(ProvisionedAccount {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            phone_number: phone_number.to_string(),
        });
        Ok(Uuid::new_v4().to_string())
    }
}

// =============================================================================
// Mock Password Hasher
// =============================================================================

/// Marks the plaintext instead of hashing, so tests can assert on it cheaply.
pub struct MockPasswordHasher;

impl BasePasswordHasher for MockPasswordHasher {
    fn hash(&self, plaintext: &str) -> Result<String> {
        Ok(format!("$mock${}", plaintext))
    }
}

// =============================================================================
// Manual Clock
// =============================================================================

/// A clock the test drives by hand.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap() = to;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl BaseClock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
