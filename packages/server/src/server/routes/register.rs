//! Registration endpoints: start, verify-otp, complete.

use axum::{extract::Extension, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::domains::registration::{RegistrationError, RegistrationOutcome};
use crate::server::app::AxumAppState;

// =============================================================================
// Request / response shapes
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRegistrationRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpVerificationRequest {
    pub session_id: String,
    pub otp_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordSetupRequest {
    pub session_id: String,
    pub password: String,
    pub confirm_password: String,
}

/// Uniform JSON envelope for every registration response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

type RegistrationReply = (StatusCode, Json<ApiResponse<RegistrationOutcome>>);

// =============================================================================
// Handlers
// =============================================================================

pub async fn start_registration_handler(
    Extension(state): Extension<AxumAppState>,
    Json(req): Json<StartRegistrationRequest>,
) -> RegistrationReply {
    if let Err(message) = validate_start(&req) {
        return bad_request(message);
    }

    info!("Starting registration for {}", req.email);

    match state
        .registration
        .start_registration(&req.first_name, &req.last_name, &req.email, &req.phone_number)
        .await
    {
        Ok(outcome) => (
            StatusCode::OK,
            Json(ApiResponse::success("Registration started", outcome)),
        ),
        Err(e) => error_reply(e),
    }
}

pub async fn verify_otp_handler(
    Extension(state): Extension<AxumAppState>,
    Json(req): Json<OtpVerificationRequest>,
) -> RegistrationReply {
    if let Err(message) = validate_verify(&req) {
        return bad_request(message);
    }

    info!("Verifying OTP for session: {}", req.session_id);

    match state
        .registration
        .verify_otp(&req.session_id, &req.otp_code)
        .await
    {
        Ok(outcome) => (
            StatusCode::OK,
            Json(ApiResponse::success("OTP verified", outcome)),
        ),
        Err(e) => error_reply(e),
    }
}

pub async fn complete_registration_handler(
    Extension(state): Extension<AxumAppState>,
    Json(req): Json<PasswordSetupRequest>,
) -> RegistrationReply {
    if let Err(message) = validate_complete(&req) {
        return bad_request(message);
    }

    info!("Completing registration for session: {}", req.session_id);

    match state
        .registration
        .complete_registration(&req.session_id, &req.password, &req.confirm_password)
        .await
    {
        Ok(outcome) => (
            StatusCode::CREATED,
            Json(ApiResponse::success("Account created", outcome)),
        ),
        Err(e) => error_reply(e),
    }
}

// =============================================================================
// Validation
// =============================================================================

fn validate_start(req: &StartRegistrationRequest) -> Result<(), &'static str> {
    if req.first_name.trim().is_empty() {
        return Err("First name is required");
    }
    if req.last_name.trim().is_empty() {
        return Err("Last name is required");
    }
    if req.email.trim().is_empty() || !req.email.contains('@') {
        return Err("A valid email is required");
    }
    if req.phone_number.trim().is_empty() {
        return Err("Phone number is required");
    }
    Ok(())
}

fn validate_verify(req: &OtpVerificationRequest) -> Result<(), &'static str> {
    if req.session_id.trim().is_empty() {
        return Err("Session id is required");
    }
    if req.otp_code.is_empty() || !req.otp_code.chars().all(|c| c.is_ascii_digit()) {
        return Err("OTP code must be numeric");
    }
    Ok(())
}

fn validate_complete(req: &PasswordSetupRequest) -> Result<(), &'static str> {
    if req.session_id.trim().is_empty() {
        return Err("Session id is required");
    }
    if req.password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    if req.confirm_password.is_empty() {
        return Err("Password confirmation is required");
    }
    Ok(())
}

// =============================================================================
// Error mapping
// =============================================================================

fn bad_request(message: &str) -> RegistrationReply {
    (StatusCode::BAD_REQUEST, Json(ApiResponse::error(message)))
}

fn status_for(error: &RegistrationError) -> StatusCode {
    match error {
        RegistrationError::AlreadyExists(_) => StatusCode::CONFLICT,
        RegistrationError::SessionNotFound => StatusCode::NOT_FOUND,
        RegistrationError::SessionExpired => StatusCode::GONE,
        RegistrationError::InvalidOtp(_)
        | RegistrationError::ExpiredOtp
        | RegistrationError::PreconditionFailed
        | RegistrationError::PasswordMismatch => StatusCode::BAD_REQUEST,
        RegistrationError::MessagingFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
        RegistrationError::ProvisioningError(_)
        | RegistrationError::Database(_)
        | RegistrationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_reply(e: RegistrationError) -> RegistrationReply {
    let status = status_for(&e);

    if status.is_server_error() || status == StatusCode::SERVICE_UNAVAILABLE {
        error!("Registration request failed: {:?}", e);
    } else {
        warn!("Registration request rejected: {}", e);
    }

    let message = if e.is_public() {
        e.to_string()
    } else {
        "An unexpected error occurred".to_string()
    };

    (status, Json(ApiResponse::error(message)))
}
