//! Rule Sync API Server
//!
//! Receives package policy lifecycle events from the host over HTTP and
//! drives rule reconciliation through the registered lifecycle hooks.

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

pub use config::AppConfig;
pub use error::ApiError;
pub use state::AppState;

use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Lifecycle events
        .route("/api/package-policies/created", post(handlers::package_policy_created))
        .route("/api/package-policies/upgraded", post(handlers::package_policy_upgraded))
        .route("/api/package-policies/deleted", post(handlers::package_policy_deleted))
        .route("/api/status", get(handlers::installation_status))
        // Rule templates
        .route("/api/rule-templates", post(handlers::create_rule_template).get(handlers::list_rule_templates))
        // Rules
        .route("/api/package-policies/:id/rules", get(handlers::list_policy_rules))
        .route("/api/rules/:id", patch(handlers::set_rule_enabled))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
