//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod keycloak_client;
pub mod password;
pub mod scheduled_tasks;
pub mod test_dependencies;
pub mod traits;

pub use deps::{ServerDeps, TwilioAdapter};
pub use keycloak_client::{KeycloakClient, KeycloakOptions};
pub use password::Argon2PasswordHasher;
pub use scheduled_tasks::start_scheduler;
pub use test_dependencies::{
    ManualClock, MockMessenger, MockPasswordHasher, MockProvisioner, ProvisionedAccount,
    SentMessage,
};
pub use traits::*;
