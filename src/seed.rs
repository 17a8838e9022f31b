use crate::errors::ServiceError;
use crate::handlers::AppServices;
use crate::services::orders::CreateOrderRequest;
use crate::services::promotional_items::CreatePromotionalItemRequest;
use crate::services::stock_items::CreateStockItemRequest;
use crate::services::stock_units::NewUnit;
use chrono::{Duration, Utc};
use tracing::info;

/// Loads a small set of demo fixtures for local development.
///
/// Idempotent: a non-empty stock catalog means fixtures (or real data)
/// already exist and nothing is written.
pub async fn seed_demo_data(services: &AppServices) -> Result<(), ServiceError> {
    let (existing, _) = services.stock_items.list_items(1, 1).await?;
    if !existing.is_empty() {
        info!("Stock catalog not empty; skipping demo fixtures");
        return Ok(());
    }

    info!("Seeding demo fixtures");

    let today = Utc::now().date_naive();

    let kit = services
        .stock_items
        .create_item(CreateStockItemRequest {
            name: "Standard Test Kit".to_string(),
            provider: Some("Acme Diagnostics".to_string()),
            code_type: Some("Kit".to_string()),
            received_date: Some(today),
            expiry_date: Some(today + Duration::days(180)),
        })
        .await?;

    let units: Vec<NewUnit> = (1..=5)
        .map(|n| NewUnit {
            barcode: format!("DEMO-{:04}", n),
            batch_number: Some("BATCH-001".to_string()),
        })
        .collect();
    services.stock_units.add_units(kit.id, units).await?;

    let order = services
        .orders
        .create_order(CreateOrderRequest {
            provider: Some("Acme Diagnostics".to_string()),
            name: Some("Demo".to_string()),
            surname: Some("Customer".to_string()),
            practitioner_name: Some("Dr. Example".to_string()),
            notes: Some("Demo fixture order".to_string()),
            ..Default::default()
        })
        .await?;
    services.orders.assign_units(order.id, kit.id, 2).await?;

    services
        .promotional_items
        .create_item(CreatePromotionalItemRequest {
            name: "Branded Gazebo".to_string(),
            category: Some("Event Equipment".to_string()),
            description: Some("3x3m pop-up gazebo for market stalls".to_string()),
            quantity: 2,
            location: Some("Warehouse shelf B3".to_string()),
            condition: Some("Good".to_string()),
        })
        .await?;

    info!("Demo fixtures loaded");
    Ok(())
}
