// Main entry point for the registration service

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use server_core::kernel::{
    start_scheduler, Argon2PasswordHasher, KeycloakClient, KeycloakOptions, ServerDeps,
    SystemClock, TwilioAdapter,
};
use server_core::server::{build_app, build_services};
use server_core::Config;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use twilio::{TwilioOptions, TwilioService};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Phone-Verified Registration Service");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    // Wire external collaborators
    let twilio = Arc::new(TwilioService::new(TwilioOptions {
        account_sid: config.twilio_account_sid.clone(),
        auth_token: config.twilio_auth_token.clone(),
        sms_from: config.twilio_sms_from.clone(),
        whatsapp_from: config.twilio_whatsapp_from.clone(),
    }));
    let keycloak = KeycloakClient::new(KeycloakOptions {
        base_url: config.keycloak_base_url.clone(),
        realm: config.keycloak_realm.clone(),
        client_id: config.keycloak_client_id.clone(),
        client_secret: config.keycloak_client_secret.clone(),
    });

    let deps = ServerDeps::new(
        pool.clone(),
        Arc::new(TwilioAdapter::new(twilio)),
        Arc::new(keycloak),
        Arc::new(Argon2PasswordHasher),
        Arc::new(SystemClock),
    );

    // Build domain services and application
    let (otp_service, session_service, registration_service) = build_services(&deps, &config);
    let app = build_app(pool, registration_service);

    // Start background reconciliation jobs
    let _scheduler = start_scheduler(
        otp_service,
        session_service,
        Duration::from_secs(config.cleanup_interval_secs),
        Duration::from_secs(config.reminder_sweep_interval_secs),
    )
    .await
    .context("Failed to start scheduled tasks")?;

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app.into_make_service())
        .await
        .context("Server error")?;

    Ok(())
}
