//! Application setup and server configuration.

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::domains::registration::{
    OtpConfig, OtpService, RegistrationService, SessionService,
};
use crate::kernel::ServerDeps;
use crate::server::routes::{
    complete_registration_handler, health_handler, start_registration_handler,
    verify_otp_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AxumAppState {
    pub db_pool: PgPool,
    pub registration: RegistrationService,
}

/// Construct the domain services from the dependency container.
///
/// Returned separately from the router so `main` can hand the OTP and
/// session services to the scheduler as well.
pub fn build_services(
    deps: &ServerDeps,
    config: &Config,
) -> (OtpService, SessionService, RegistrationService) {
    let otp = OtpService::new(
        deps.db_pool.clone(),
        deps.messenger.clone(),
        deps.clock.clone(),
        OtpConfig {
            code_length: config.otp_length,
            ttl_minutes: config.otp_ttl_minutes,
            primary_channel: config.otp_primary_channel,
            reminder_channel: config.otp_reminder_channel,
            reminder_delay_minutes: config.reminder_delay_minutes,
        },
    );

    let sessions = SessionService::new(
        deps.db_pool.clone(),
        deps.clock.clone(),
        config.session_ttl_minutes,
    );

    let registration = RegistrationService::new(
        deps.db_pool.clone(),
        sessions.clone(),
        otp.clone(),
        deps.provisioner.clone(),
        deps.password_hasher.clone(),
        deps.clock.clone(),
    );

    (otp, sessions, registration)
}

/// Build the Axum application router
pub fn build_app(db_pool: PgPool, registration: RegistrationService) -> Router {
    let state = AxumAppState {
        db_pool,
        registration,
    };

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/auth/register/start", post(start_registration_handler))
        .route("/api/auth/register/verify-otp", post(verify_otp_handler))
        .route(
            "/api/auth/register/complete",
            post(complete_registration_handler),
        )
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
