use crate::errors::ServiceError;
use crate::services::orders::{
    AddOrderItemRequest, CreateOrderRequest, WorkflowFlagsUpdate,
};
use crate::{AppState, ApiResponse, PaginatedResponse};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct OrderListQuery {
    pub provider: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignUnitsRequest {
    pub item_id: Uuid,
    pub quantity: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignUnitRequest {
    pub unit_id: Uuid,
}

/// Create an order
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.orders.create_order(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(order))))
}

/// List orders, optionally filtered by provider
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Orders returned"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(50);
    let (orders, total) = state
        .services
        .orders
        .list_orders(query.provider, page, limit)
        .await?;
    let total_pages = total.div_ceil(limit);

    Ok(Json(ApiResponse::success(PaginatedResponse {
        items: orders,
        total,
        page,
        limit,
        total_pages,
    })))
}

/// Dashboard view: orders split into pending/completed buckets per provider
#[utoipa::path(
    get,
    path = "/api/v1/orders/buckets",
    responses((status = 200, description = "Bucketed orders returned")),
    tag = "orders"
)]
pub async fn order_buckets(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let buckets = state.services.orders.order_buckets().await?;
    Ok(Json(ApiResponse::success(buckets)))
}

/// Get one order
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order returned"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state
        .services
        .orders
        .get_order(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;
    Ok(Json(ApiResponse::success(order)))
}

/// Update order metadata (never status or flags)
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order updated"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.orders.update_details(id, payload).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Update workflow flags; status and completion timestamp are re-derived
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/flags",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = WorkflowFlagsUpdate,
    responses(
        (status = 200, description = "Flags updated, status re-derived"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn update_workflow_flags(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<WorkflowFlagsUpdate>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state
        .services
        .orders
        .update_workflow_flags(id, payload)
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Delete an order, releasing its assigned units back to stock
#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.orders.delete_order(id).await?;
    Ok(Json(ApiResponse::success(json!({ "deleted": id }))))
}

/// Units currently assigned to the order
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/units",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Assigned units returned"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn get_order_units(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let units = state.services.orders.order_units(id).await?;
    Ok(Json(ApiResponse::success(units)))
}

/// Bulk-assign available units of an item to the order.
/// Fewer available than requested yields a partial outcome, not an error.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/assign",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = AssignUnitsRequest,
    responses(
        (status = 200, description = "Assignment outcome returned"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order or item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn assign_units(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignUnitsRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let outcome = state
        .services
        .orders
        .assign_units(id, payload.item_id, payload.quantity)
        .await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// Assign one specific unit (by id) to the order
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/units",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = AssignUnitRequest,
    responses(
        (status = 201, description = "Unit assigned"),
        (status = 404, description = "Order or unit not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Unit not available", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn assign_unit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignUnitRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let order_unit = state
        .services
        .stock_units
        .assign_to_order(payload.unit_id, id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(order_unit))))
}

/// Release one assignment back to stock
#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}/units/{order_unit_id}",
    params(
        ("id" = Uuid, Path, description = "Order ID"),
        ("order_unit_id" = Uuid, Path, description = "Assignment record ID")
    ),
    responses(
        (status = 200, description = "Unit released"),
        (status = 404, description = "Assignment not found on this order", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn unassign_unit(
    State(state): State<AppState>,
    Path((id, order_unit_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .stock_units
        .unassign(order_unit_id, id)
        .await?;
    Ok(Json(ApiResponse::success(json!({ "released": order_unit_id }))))
}

/// Add a line item (SKU + quantity) to the order
#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/items",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = AddOrderItemRequest,
    responses(
        (status = 201, description = "Line item added"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn add_order_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddOrderItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state.services.orders.add_order_item(id, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(item))))
}
