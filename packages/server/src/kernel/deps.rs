//! Server dependencies for domain services (using traits for testability)
//!
//! This module provides the central dependency container used to wire the
//! registration services. All external collaborators use trait abstractions
//! so tests can swap in the mocks from `test_dependencies`.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use twilio::{Channel, TwilioService};

use super::{BaseAccountProvisioner, BaseClock, BaseMessagingService, BasePasswordHasher};

// =============================================================================
// TwilioService Adapter (implements BaseMessagingService trait)
// =============================================================================

/// Wrapper around TwilioService that implements the BaseMessagingService trait
pub struct TwilioAdapter(pub Arc<TwilioService>);

impl TwilioAdapter {
    pub fn new(service: Arc<TwilioService>) -> Self {
        Self(service)
    }
}

#[async_trait]
impl BaseMessagingService for TwilioAdapter {
    async fn send(&self, channel: Channel, to: &str, body: &str) -> Result<()> {
        self.0
            .send_message(channel, to, body)
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("{}", e))
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Server dependencies accessible to domain services
#[derive(Clone)]
pub struct ServerDeps {
    pub db_pool: PgPool,
    pub messenger: Arc<dyn BaseMessagingService>,
    pub provisioner: Arc<dyn BaseAccountProvisioner>,
    pub password_hasher: Arc<dyn BasePasswordHasher>,
    pub clock: Arc<dyn BaseClock>,
}

impl ServerDeps {
    pub fn new(
        db_pool: PgPool,
        messenger: Arc<dyn BaseMessagingService>,
        provisioner: Arc<dyn BaseAccountProvisioner>,
        password_hasher: Arc<dyn BasePasswordHasher>,
        clock: Arc<dyn BaseClock>,
    ) -> Self {
        Self {
            db_pool,
            messenger,
            provisioner,
            password_hasher,
            clock,
        }
    }
}
