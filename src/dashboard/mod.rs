//! Dashboard - HTTP API and static frontend
//!
//! Provides:
//! - Session probing against the ERP
//! - Aggregated dashboard data (sales, products, category tree, tickets)
//! - Quote creation, payments, ticket updates
//! - Public quote lookup by code
//! - The built single-page frontend, with index.html as fallback

pub mod error;
pub mod fetch;
pub mod routes;
pub mod views;

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::cache::QuoteStore;
use crate::config::Config;
use crate::erp::ErpClient;

pub use error::ApiError;

/// State shared across handlers
pub struct AppState {
    pub config: Config,
    pub erp: ErpClient,
    /// `None` when the public quote lookup is disabled
    pub quotes: Option<Arc<dyn QuoteStore>>,
}

impl AppState {
    pub fn new(config: Config, erp: ErpClient, quotes: Option<Arc<dyn QuoteStore>>) -> Self {
        Self {
            config,
            erp,
            quotes,
        }
    }
}

pub type SharedState = Arc<AppState>;

/// Create the gateway router
pub fn create_router(state: SharedState) -> Router {
    let static_dir = state.config.server.static_dir.clone();
    let spa = ServeDir::new(&static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    Router::new()
        // Session
        .route("/api/connect", post(routes::api_connect))
        // Read API
        .route("/api/customers", post(routes::api_customers))
        .route("/api/dashboard-data", post(routes::api_dashboard_data))
        .route("/api/order-details", post(routes::api_order_details))
        .route("/api/customer-history", post(routes::api_customer_history))
        .route("/api/search", post(routes::api_search))
        // Write API
        .route("/api/create-quote", post(routes::api_create_quote))
        .route("/api/register-payment", post(routes::api_register_payment))
        .route("/api/update-ticket", post(routes::api_update_ticket))
        // Public
        .route("/api/quote/:code", get(routes::api_quote_lookup))
        // Health check
        .route("/health", get(routes::health))
        // Frontend
        .fallback_service(spa)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
