use thiserror::Error;

/// Error taxonomy for the registration flow
///
/// Every failure the engines or the orchestrator can produce is recovered
/// into one of these kinds; the HTTP layer maps each kind to a status code.
/// `MessagingFailure` and `ProvisioningError` keep their diagnostic cause as
/// a source but display only a generic description.
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("{0}")]
    AlreadyExists(String),

    #[error("Session not found")]
    SessionNotFound,

    #[error("Session expired")]
    SessionExpired,

    #[error("{0}")]
    InvalidOtp(&'static str),

    #[error("OTP code expired")]
    ExpiredOtp,

    #[error("Phone number must be verified before setting a password")]
    PreconditionFailed,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Failed to send the verification message")]
    MessagingFailure(#[source] anyhow::Error),

    #[error("Failed to create the account")]
    ProvisioningError(#[source] anyhow::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl RegistrationError {
    /// Whether the public message may carry the Display text verbatim.
    /// Database and internal faults must not leak detail to the caller.
    pub fn is_public(&self) -> bool {
        !matches!(
            self,
            RegistrationError::Database(_) | RegistrationError::Internal(_)
        )
    }
}
