use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "OpsDesk API",
        description = r#"
# OpsDesk Operations API

Back-office API for a small distribution operation: a catalog of stock items,
a per-unit ledger of serialized, barcode-identified inventory, order
fulfillment with unit assignment, and quantity-counter tracking for reusable
promotional assets.

## Unit lifecycle

Every serialized unit is in exactly one state: `In Stock`, `Assigned`,
`Promotional Use`, or `Used`. State changes are atomic conditional updates,
so two concurrent requests can never claim the same unit.

## Error handling

Errors use a consistent JSON envelope:

```json
{
  "error": "Conflict",
  "message": "Unit ABC123 is not available (status: Assigned)",
  "timestamp": "2026-01-01T00:00:00Z"
}
```
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    paths(
        crate::handlers::stock::create_item,
        crate::handlers::stock::list_items,
        crate::handlers::stock::get_item,
        crate::handlers::stock::delete_item,
        crate::handlers::stock::stock_counts,
        crate::handlers::stock::low_stock,
        crate::handlers::stock::expiring_items,
        crate::handlers::stock::add_units,
        crate::handlers::stock::list_units,
        crate::handlers::stock::get_unit,
        crate::handlers::stock::delete_unit,
        crate::handlers::stock::update_unit_status,
        crate::handlers::stock::sign_out_unit,
        crate::handlers::stock::return_unit,
        crate::handlers::orders::create_order,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::order_buckets,
        crate::handlers::orders::get_order,
        crate::handlers::orders::update_order,
        crate::handlers::orders::update_workflow_flags,
        crate::handlers::orders::delete_order,
        crate::handlers::orders::get_order_units,
        crate::handlers::orders::assign_units,
        crate::handlers::orders::assign_unit,
        crate::handlers::orders::unassign_unit,
        crate::handlers::orders::add_order_item,
        crate::handlers::promotional::create_item,
        crate::handlers::promotional::list_items,
        crate::handlers::promotional::get_item,
        crate::handlers::promotional::delete_item,
        crate::handlers::promotional::sign_out,
        crate::handlers::promotional::return_item,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::services::stock_items::CreateStockItemRequest,
        crate::services::stock_items::StockItemResponse,
        crate::services::stock_items::StockCounts,
        crate::services::stock_items::LowStockItem,
        crate::services::stock_units::NewUnit,
        crate::services::stock_units::UnitResponse,
        crate::services::stock_units::OrderUnitResponse,
        crate::services::orders::CreateOrderRequest,
        crate::services::orders::WorkflowFlagsUpdate,
        crate::services::orders::OrderResponse,
        crate::services::orders::AddOrderItemRequest,
        crate::services::orders::OrderItemResponse,
        crate::services::orders::AssignedUnit,
        crate::services::orders::AssignmentOutcome,
        crate::services::orders::ProviderOrders,
        crate::services::orders::OrderBuckets,
        crate::services::promotional_items::CreatePromotionalItemRequest,
        crate::services::promotional_items::SignOutRequest,
        crate::services::promotional_items::ReturnRequest,
        crate::services::promotional_items::PromotionalItemResponse,
    )),
    tags(
        (name = "stock", description = "Stock catalog and serialized unit ledger"),
        (name = "orders", description = "Order lifecycle and unit assignment"),
        (name = "promotional", description = "Reusable promotional asset counters")
    )
)]
pub struct ApiDoc;

/// Swagger UI router, mounted alongside the API.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
