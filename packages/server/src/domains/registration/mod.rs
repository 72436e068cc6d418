//! Registration domain: session state machine, OTP lifecycle, orchestration.

pub mod errors;
pub mod models;
pub mod otp_service;
pub mod registration_service;
pub mod session_service;

pub use errors::RegistrationError;
pub use otp_service::{OtpConfig, OtpService};
pub use registration_service::{NextStep, RegistrationOutcome, RegistrationService};
pub use session_service::SessionService;
