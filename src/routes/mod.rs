pub mod appliances;
pub mod clients;
pub mod health;
pub mod me;
pub mod partners;
pub mod parts;
pub mod services;
pub mod technicians;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Public routes
        .route("/health", get(health::health_check))
        // Protected routes
        .route("/me", get(me::get_me))
        // Clients
        .route("/clients", post(clients::create_client))
        .route("/clients", get(clients::list_clients))
        .route("/clients/:client_id", get(clients::get_client))
        .route("/clients/:client_id", put(clients::update_client))
        // Appliances (nested under clients)
        .route(
            "/clients/:client_id/appliances",
            post(appliances::create_appliance),
        )
        .route(
            "/clients/:client_id/appliances",
            get(appliances::list_appliances),
        )
        .route("/appliances/:appliance_id", get(appliances::get_appliance))
        .route("/appliances/:appliance_id", put(appliances::update_appliance))
        // Technicians
        .route("/technicians", post(technicians::create_technician))
        .route("/technicians", get(technicians::list_technicians))
        .route("/technicians/:technician_id", get(technicians::get_technician))
        .route("/technicians/:technician_id", put(technicians::update_technician))
        // Business partners
        .route("/partners", post(partners::create_partner))
        .route("/partners", get(partners::list_partners))
        .route("/partners/:partner_id", get(partners::get_partner))
        // Services
        .route("/services", post(services::create_service))
        .route("/services", get(services::list_services))
        .route("/services/:service_id", get(services::get_service))
        .route("/services/:service_id", put(services::update_service))
        .route("/services/:service_id", delete(services::delete_service))
        .route("/services/:service_id/status", put(services::change_status))
        // Spare part orders
        .route("/services/:service_id/parts", post(parts::create_part_order))
        .route("/services/:service_id/parts", get(parts::list_part_orders))
        .route("/parts/:part_id/status", put(parts::change_part_status))
}
