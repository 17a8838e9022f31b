use crate::errors::ServiceError;
use crate::services::promotional_items::{
    CreatePromotionalItemRequest, ReturnRequest, SignOutRequest,
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
pub struct PromotionalListQuery {
    pub category: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Create a promotional item with its full quantity available
#[utoipa::path(
    post,
    path = "/api/v1/promotional",
    request_body = CreatePromotionalItemRequest,
    responses(
        (status = 201, description = "Promotional item created"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "promotional"
)]
pub async fn create_item(
    State(state): State<AppState>,
    Json(payload): Json<CreatePromotionalItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state.services.promotional_items.create_item(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(item))))
}

/// List promotional items, optionally by category
#[utoipa::path(
    get,
    path = "/api/v1/promotional",
    params(PromotionalListQuery),
    responses(
        (status = 200, description = "Promotional items returned"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "promotional"
)]
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<PromotionalListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(50);
    let (items, total) = state
        .services
        .promotional_items
        .list_items(query.category, page, limit)
        .await?;
    let total_pages = total.div_ceil(limit);

    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages,
    })))
}

/// Get one promotional item
#[utoipa::path(
    get,
    path = "/api/v1/promotional/{id}",
    params(("id" = Uuid, Path, description = "Promotional item ID")),
    responses(
        (status = 200, description = "Promotional item returned"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "promotional"
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state
        .services
        .promotional_items
        .get_item(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Promotional item {} not found", id)))?;
    Ok(Json(ApiResponse::success(item)))
}

/// Delete a promotional item (refused while units are signed out)
#[utoipa::path(
    delete,
    path = "/api/v1/promotional/{id}",
    params(("id" = Uuid, Path, description = "Promotional item ID")),
    responses(
        (status = 200, description = "Promotional item deleted"),
        (status = 400, description = "Units signed out", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "promotional"
)]
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.promotional_items.delete_item(id).await?;
    Ok(Json(ApiResponse::success(json!({ "deleted": id }))))
}

/// Sign out a quantity of a promotional item
#[utoipa::path(
    post,
    path = "/api/v1/promotional/{id}/sign-out",
    params(("id" = Uuid, Path, description = "Promotional item ID")),
    request_body = SignOutRequest,
    responses(
        (status = 200, description = "Signed out, updated counters returned"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Not enough available", body = crate::errors::ErrorResponse)
    ),
    tag = "promotional"
)]
pub async fn sign_out(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SignOutRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state
        .services
        .promotional_items
        .sign_out(id, payload)
        .await?;
    Ok(Json(ApiResponse::success(item)))
}

/// Return a quantity of a promotional item
#[utoipa::path(
    post,
    path = "/api/v1/promotional/{id}/return",
    params(("id" = Uuid, Path, description = "Promotional item ID")),
    request_body = ReturnRequest,
    responses(
        (status = 200, description = "Returned, updated counters returned"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "promotional"
)]
pub async fn return_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReturnRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state
        .services
        .promotional_items
        .return_item(id, payload)
        .await?;
    Ok(Json(ApiResponse::success(item)))
}
