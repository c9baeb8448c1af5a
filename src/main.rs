mod api;
mod app;
mod auth;
mod config;
mod db;
mod domain;
mod error;
mod logging;
mod routes;
mod services;
mod workflow;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use services::{EmailClient, SmsClient};
use workflow::{NotificationDispatcher, PgEntityStore, WorkflowEngine};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = config::Settings::from_env()?;

    // Initialize logging
    logging::init_logging(&settings.env);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        routed_brands = settings.supplier_routing.brands.len(),
        "Starting RepairHub backend"
    );

    // Create database pool and run migrations
    let pool = db::create_pool(&settings).await?;

    // Outbound channel clients
    let sms = SmsClient::new(
        &settings.sms_gateway_url,
        &settings.sms_gateway_token,
        &settings.sms_sender_id,
        settings.notification_timeout_seconds,
    )?;
    let email = EmailClient::new(
        &settings.email_api_url,
        &settings.email_api_token,
        &settings.email_from_address,
        settings.notification_timeout_seconds,
    )?;

    // Workflow engine: entity store + notification dispatcher
    let store = Arc::new(PgEntityStore::new(pool.clone()));
    let dispatcher = NotificationDispatcher::new(
        Arc::new(sms),
        Arc::new(email),
        settings.supplier_routing.clone(),
        Duration::from_secs(settings.notification_timeout_seconds),
    );
    let engine = Arc::new(WorkflowEngine::new(store.clone(), dispatcher));

    // Create application state
    let state = app::AppState::new(pool, settings.clone(), store, engine);

    // Build application
    let app = app::create_app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("Listening on {}", settings.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
