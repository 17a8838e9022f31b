use crate::entities::stock_unit::UnitStatus;
use crate::errors::ServiceError;
use crate::services::stock_items::CreateStockItemRequest;
use crate::services::stock_units::NewUnit;
use crate::{AppState, ApiResponse, PaginatedResponse};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct StockListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct UnitListQuery {
    pub item_id: Option<Uuid>,
    pub status: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddUnitsRequest {
    pub units: Vec<NewUnit>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUnitStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UnitSignOutRequest {
    pub signed_out_by: String,
    pub notes: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UnitReturnRequest {
    pub returned_by: String,
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddUnitsResponse {
    pub added: usize,
}

/// Create a stock item definition
#[utoipa::path(
    post,
    path = "/api/v1/stock/items",
    request_body = CreateStockItemRequest,
    responses(
        (status = 201, description = "Stock item created"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn create_item(
    State(state): State<AppState>,
    Json(payload): Json<CreateStockItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state.services.stock_items.create_item(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(item))))
}

/// List stock items with pagination
#[utoipa::path(
    get,
    path = "/api/v1/stock/items",
    params(StockListQuery),
    responses(
        (status = 200, description = "Stock items returned"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<StockListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(50);
    let (items, total) = state.services.stock_items.list_items(page, limit).await?;
    let total_pages = total.div_ceil(limit);

    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages,
    })))
}

/// Get one stock item
#[utoipa::path(
    get,
    path = "/api/v1/stock/items/{id}",
    params(("id" = Uuid, Path, description = "Stock item ID")),
    responses(
        (status = 200, description = "Stock item returned"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state
        .services
        .stock_items
        .get_item(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Stock item {} not found", id)))?;
    Ok(Json(ApiResponse::success(item)))
}

/// Delete a stock item and its unassigned units
#[utoipa::path(
    delete,
    path = "/api/v1/stock/items/{id}",
    params(("id" = Uuid, Path, description = "Stock item ID")),
    responses(
        (status = 200, description = "Stock item deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Units assigned to orders", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.stock_items.delete_item(id).await?;
    Ok(Json(ApiResponse::success(json!({ "deleted": id }))))
}

/// Ledger-derived unit counts for one item
#[utoipa::path(
    get,
    path = "/api/v1/stock/items/{id}/counts",
    params(("id" = Uuid, Path, description = "Stock item ID")),
    responses(
        (status = 200, description = "Counts returned"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn stock_counts(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let counts = state.services.stock_items.stock_counts(id).await?;
    Ok(Json(ApiResponse::success(counts)))
}

/// Items at or below the configured low-stock threshold
#[utoipa::path(
    get,
    path = "/api/v1/stock/low",
    responses((status = 200, description = "Low stock items returned")),
    tag = "stock"
)]
pub async fn low_stock(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let threshold = state.config.low_stock_threshold;
    let items = state.services.stock_items.low_stock(threshold).await?;
    Ok(Json(ApiResponse::success(items)))
}

/// Items expiring within the configured horizon
#[utoipa::path(
    get,
    path = "/api/v1/stock/expiring",
    responses((status = 200, description = "Expiring items returned")),
    tag = "stock"
)]
pub async fn expiring_items(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let horizon = state.config.expiry_horizon_days;
    let items = state.services.stock_items.expiring_items(horizon).await?;
    Ok(Json(ApiResponse::success(items)))
}

/// Receive a batch of serialized units into stock
#[utoipa::path(
    post,
    path = "/api/v1/stock/items/{id}/units",
    params(("id" = Uuid, Path, description = "Stock item ID")),
    request_body = AddUnitsRequest,
    responses(
        (status = 201, description = "Units received", body = AddUnitsResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Duplicate barcode", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn add_units(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddUnitsRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let added = state
        .services
        .stock_units
        .add_units(id, payload.units)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(AddUnitsResponse { added })),
    ))
}

/// List units, filterable by item and status
#[utoipa::path(
    get,
    path = "/api/v1/stock/units",
    params(UnitListQuery),
    responses(
        (status = 200, description = "Units returned"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn list_units(
    State(state): State<AppState>,
    Query(query): Query<UnitListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let status = match query.status.as_deref() {
        None => None,
        Some(s) => Some(UnitStatus::parse(s).ok_or_else(|| {
            ServiceError::ValidationError(format!("Unknown unit status '{}'", s))
        })?),
    };

    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(50);
    let (units, total) = state
        .services
        .stock_units
        .list_units(query.item_id, status, page, limit)
        .await?;
    let total_pages = total.div_ceil(limit);

    Ok(Json(ApiResponse::success(PaginatedResponse {
        items: units,
        total,
        page,
        limit,
        total_pages,
    })))
}

/// Get one unit
#[utoipa::path(
    get,
    path = "/api/v1/stock/units/{id}",
    params(("id" = Uuid, Path, description = "Stock unit ID")),
    responses(
        (status = 200, description = "Unit returned"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn get_unit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let unit = state
        .services
        .stock_units
        .get_unit(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Stock unit {} not found", id)))?;
    Ok(Json(ApiResponse::success(unit)))
}

/// Delete a unit (refused while assigned to an order)
#[utoipa::path(
    delete,
    path = "/api/v1/stock/units/{id}",
    params(("id" = Uuid, Path, description = "Stock unit ID")),
    responses(
        (status = 200, description = "Unit deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Unit assigned to an order", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn delete_unit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.stock_units.delete_unit(id).await?;
    Ok(Json(ApiResponse::success(json!({ "deleted": id }))))
}

/// Update a unit's status through the external path
#[utoipa::path(
    put,
    path = "/api/v1/stock/units/{id}/status",
    params(("id" = Uuid, Path, description = "Stock unit ID")),
    request_body = UpdateUnitStatusRequest,
    responses(
        (status = 200, description = "Status updated"),
        (status = 400, description = "Invalid status", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Status changed concurrently", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn update_unit_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUnitStatusRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let status = UnitStatus::parse(&payload.status).ok_or_else(|| {
        ServiceError::ValidationError(format!("Unknown unit status '{}'", payload.status))
    })?;
    let unit = state
        .services
        .stock_units
        .update_status(id, status)
        .await?;
    Ok(Json(ApiResponse::success(unit)))
}

/// Sign a unit out for promotional use
#[utoipa::path(
    post,
    path = "/api/v1/stock/units/{id}/sign-out",
    params(("id" = Uuid, Path, description = "Stock unit ID")),
    request_body = UnitSignOutRequest,
    responses(
        (status = 200, description = "Unit signed out"),
        (status = 400, description = "Missing signer or note", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Unit not in stock", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn sign_out_unit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UnitSignOutRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let unit = state
        .services
        .stock_units
        .sign_out_promotional(id, &payload.signed_out_by, &payload.notes)
        .await?;
    Ok(Json(ApiResponse::success(unit)))
}

/// Return a promotionally signed-out unit to stock
#[utoipa::path(
    post,
    path = "/api/v1/stock/units/{id}/return",
    params(("id" = Uuid, Path, description = "Stock unit ID")),
    request_body = UnitReturnRequest,
    responses(
        (status = 200, description = "Unit returned to stock"),
        (status = 400, description = "Missing returner or reason", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Unit not signed out", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn return_unit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UnitReturnRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let unit = state
        .services
        .stock_units
        .return_promotional(id, &payload.returned_by, &payload.reason)
        .await?;
    Ok(Json(ApiResponse::success(unit)))
}
