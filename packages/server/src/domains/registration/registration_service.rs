//! Registration orchestrator: composes the session and OTP engines with the
//! external account provisioner into the three-step flow the HTTP boundary
//! calls.

use std::sync::Arc;

use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::domains::registration::errors::RegistrationError;
use crate::domains::registration::models::User;
use crate::domains::registration::otp_service::OtpService;
use crate::domains::registration::session_service::SessionService;
use crate::kernel::{BaseAccountProvisioner, BaseClock, BasePasswordHasher};

/// Step the client should take next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NextStep {
    VerifyOtp,
    SetPassword,
    Completed,
}

/// Outcome of one orchestrator step, surfaced to the HTTP boundary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOutcome {
    /// Absent once the session is spent (after completion).
    pub session_id: Option<String>,
    pub message: String,
    pub next_step: NextStep,
}

#[derive(Clone)]
pub struct RegistrationService {
    pool: PgPool,
    sessions: SessionService,
    otp: OtpService,
    provisioner: Arc<dyn BaseAccountProvisioner>,
    password_hasher: Arc<dyn BasePasswordHasher>,
    clock: Arc<dyn BaseClock>,
}

impl RegistrationService {
    pub fn new(
        pool: PgPool,
        sessions: SessionService,
        otp: OtpService,
        provisioner: Arc<dyn BaseAccountProvisioner>,
        password_hasher: Arc<dyn BasePasswordHasher>,
        clock: Arc<dyn BaseClock>,
    ) -> Self {
        Self {
            pool,
            sessions,
            otp,
            provisioner,
            password_hasher,
            clock,
        }
    }

    /// Step 1: capture identity, create a session, issue the OTP.
    ///
    /// Duplicates are checked against finalized accounts only; two in-flight
    /// sessions for the same phone are allowed. If the OTP send fails the
    /// step fails overall, but the session already exists and stays usable
    /// for a retry once the user obtains a code.
    pub async fn start_registration(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        phone_number: &str,
    ) -> Result<RegistrationOutcome, RegistrationError> {
        if User::exists_by_email(email, &self.pool).await? {
            return Err(RegistrationError::AlreadyExists(
                "An account with this email already exists".to_string(),
            ));
        }

        if User::exists_by_phone(phone_number, &self.pool).await? {
            return Err(RegistrationError::AlreadyExists(
                "An account with this phone number already exists".to_string(),
            ));
        }

        let session = self
            .sessions
            .create(first_name, last_name, email, phone_number)
            .await?;

        self.otp.issue(phone_number).await?;

        info!("Registration started for {}", email);

        Ok(RegistrationOutcome {
            session_id: Some(session.session_id),
            message: "OTP code sent".to_string(),
            next_step: NextStep::VerifyOtp,
        })
    }

    /// Step 2: verify the OTP against the session's phone number.
    pub async fn verify_otp(
        &self,
        session_id: &str,
        code: &str,
    ) -> Result<RegistrationOutcome, RegistrationError> {
        let session = self.sessions.get(session_id).await?;

        self.otp.verify(&session.phone_number, code).await?;
        self.sessions.mark_otp_verified(session_id).await?;

        info!("OTP verified for session: {}", session_id);

        Ok(RegistrationOutcome {
            session_id: Some(session.session_id),
            message: "Phone number verified".to_string(),
            next_step: NextStep::SetPassword,
        })
    }

    /// Step 3: validate the password pair, provision the external identity,
    /// persist the finalized account, close the session.
    ///
    /// Provisioning runs only after all local validation passes; it is the
    /// most expensive and least reversible step. If the local insert fails
    /// after provisioning succeeded, an orphaned external identity remains
    /// (known gap, no compensating delete here).
    pub async fn complete_registration(
        &self,
        session_id: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<RegistrationOutcome, RegistrationError> {
        let session = self.sessions.get(session_id).await?;

        if !session.otp_verified {
            return Err(RegistrationError::PreconditionFailed);
        }

        if password != confirm_password {
            return Err(RegistrationError::PasswordMismatch);
        }

        let keycloak_user_id = self
            .provisioner
            .create_account(
                &session.first_name,
                &session.last_name,
                &session.email,
                &session.phone_number,
                password,
            )
            .await
            .map_err(RegistrationError::ProvisioningError)?;

        let password_hash = self.password_hasher.hash(password)?;

        let user = User {
            id: Uuid::new_v4(),
            first_name: session.first_name.clone(),
            last_name: session.last_name.clone(),
            email: session.email.clone(),
            phone_number: session.phone_number.clone(),
            password_hash,
            phone_verified: true,
            active: true,
            keycloak_user_id,
            created_at: self.clock.now(),
        };
        user.insert(&self.pool).await?;

        self.sessions.mark_completed(session_id).await?;

        info!("Registration completed for {}", session.email);

        Ok(RegistrationOutcome {
            session_id: None,
            message: "Account created".to_string(),
            next_step: NextStep::Completed,
        })
    }
}
