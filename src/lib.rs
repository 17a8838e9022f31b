pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod seed;
pub mod services;

use axum::{
    extract::State,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

// Common query parameters for list endpoints
#[derive(Debug, Deserialize, ToSchema)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    50
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        // Status and health endpoints
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        // Stock catalog and unit ledger
        .route(
            "/stock/items",
            get(handlers::stock::list_items).post(handlers::stock::create_item),
        )
        .route(
            "/stock/items/:id",
            get(handlers::stock::get_item).delete(handlers::stock::delete_item),
        )
        .route("/stock/items/:id/counts", get(handlers::stock::stock_counts))
        .route("/stock/items/:id/units", post(handlers::stock::add_units))
        .route("/stock/low", get(handlers::stock::low_stock))
        .route("/stock/expiring", get(handlers::stock::expiring_items))
        .route("/stock/units", get(handlers::stock::list_units))
        .route(
            "/stock/units/:id",
            get(handlers::stock::get_unit).delete(handlers::stock::delete_unit),
        )
        .route(
            "/stock/units/:id/status",
            put(handlers::stock::update_unit_status),
        )
        .route(
            "/stock/units/:id/sign-out",
            post(handlers::stock::sign_out_unit),
        )
        .route("/stock/units/:id/return", post(handlers::stock::return_unit))
        // Orders
        .route(
            "/orders",
            get(handlers::orders::list_orders).post(handlers::orders::create_order),
        )
        .route("/orders/buckets", get(handlers::orders::order_buckets))
        .route(
            "/orders/:id",
            get(handlers::orders::get_order)
                .put(handlers::orders::update_order)
                .delete(handlers::orders::delete_order),
        )
        .route(
            "/orders/:id/flags",
            put(handlers::orders::update_workflow_flags),
        )
        .route(
            "/orders/:id/units",
            get(handlers::orders::get_order_units).post(handlers::orders::assign_unit),
        )
        .route(
            "/orders/:id/units/:order_unit_id",
            delete(handlers::orders::unassign_unit),
        )
        .route("/orders/:id/assign", post(handlers::orders::assign_units))
        .route("/orders/:id/items", post(handlers::orders::add_order_item))
        // Promotional counters
        .route(
            "/promotional",
            get(handlers::promotional::list_items).post(handlers::promotional::create_item),
        )
        .route(
            "/promotional/:id",
            get(handlers::promotional::get_item).delete(handlers::promotional::delete_item),
        )
        .route(
            "/promotional/:id/sign-out",
            post(handlers::promotional::sign_out),
        )
        .route(
            "/promotional/:id/return",
            post(handlers::promotional::return_item),
        )
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let status_data = json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let db_status = match db::check_connection(&state.db).await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "database": db_status,
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}
