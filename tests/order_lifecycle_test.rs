mod common;

use assert_matches::assert_matches;
use common::TestApp;
use opsdesk_api::entities::stock_unit::UnitStatus;
use opsdesk_api::errors::ServiceError;
use opsdesk_api::services::orders::{CreateOrderRequest, WorkflowFlagsUpdate};

fn all_flags(value: bool) -> WorkflowFlagsUpdate {
    WorkflowFlagsUpdate {
        sent_out: Some(value),
        received_back: Some(value),
        kit_registered: Some(value),
        results_sent: Some(value),
        paid: Some(value),
        invoiced: Some(value),
    }
}

#[tokio::test]
async fn setting_all_flags_completes_the_order() {
    let app = TestApp::new().await;
    let order_id = app.seed_order("Provider A").await;

    // Five of six flags: still pending.
    let order = app
        .services
        .orders
        .update_workflow_flags(
            order_id,
            WorkflowFlagsUpdate {
                sent_out: Some(true),
                received_back: Some(true),
                kit_registered: Some(true),
                results_sent: Some(true),
                paid: Some(true),
                invoiced: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(order.status, "Pending");
    assert!(order.completed_at.is_none());

    // The sixth flag flips it to Completed and stamps the timestamp.
    let order = app
        .services
        .orders
        .update_workflow_flags(
            order_id,
            WorkflowFlagsUpdate {
                invoiced: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(order.status, "Completed");
    let stamp = order.completed_at.expect("completed_at must be set");

    // A no-op flag update keeps the original stamp.
    let order = app
        .services
        .orders
        .update_workflow_flags(
            order_id,
            WorkflowFlagsUpdate {
                paid: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(order.completed_at, Some(stamp));
}

#[tokio::test]
async fn clearing_a_flag_reverts_completion() {
    let app = TestApp::new().await;
    let order_id = app.seed_order("Provider A").await;

    app.services
        .orders
        .update_workflow_flags(order_id, all_flags(true))
        .await
        .unwrap();

    let order = app
        .services
        .orders
        .update_workflow_flags(
            order_id,
            WorkflowFlagsUpdate {
                paid: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(order.status, "Pending");
    assert!(order.completed_at.is_none());
}

#[tokio::test]
async fn empty_flag_update_is_rejected() {
    let app = TestApp::new().await;
    let order_id = app.seed_order("Provider A").await;

    let err = app
        .services
        .orders
        .update_workflow_flags(order_id, WorkflowFlagsUpdate::default())
        .await
        .expect_err("empty update must be rejected");
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn partial_fulfillment_assigns_what_is_available() {
    let app = TestApp::new().await;
    let item_id = app.seed_item_with_units("Scarce Kit", 3).await;
    let order_id = app.seed_order("Provider A").await;

    let outcome = app
        .services
        .orders
        .assign_units(order_id, item_id, 5)
        .await
        .expect("partial fulfillment is an outcome, not an error");

    assert_eq!(outcome.requested, 5);
    assert_eq!(outcome.assigned, 3);
    assert!(outcome.partial);
    assert_eq!(outcome.order_unit_ids.len(), 3);

    let counts = app.services.stock_items.stock_counts(item_id).await.unwrap();
    assert_eq!(counts.in_stock, 0);
    assert_eq!(counts.assigned, 3);

    let item = app.services.stock_items.get_item(item_id).await.unwrap().unwrap();
    assert_eq!(item.current_stock, 0);

    // Nothing left: a further request assigns zero.
    let outcome = app
        .services
        .orders
        .assign_units(order_id, item_id, 2)
        .await
        .unwrap();
    assert_eq!(outcome.assigned, 0);
    assert!(outcome.partial);
}

#[tokio::test]
async fn full_fulfillment_is_not_partial() {
    let app = TestApp::new().await;
    let item_id = app.seed_item_with_units("Ample Kit", 4).await;
    let order_id = app.seed_order("Provider A").await;

    let outcome = app
        .services
        .orders
        .assign_units(order_id, item_id, 2)
        .await
        .unwrap();
    assert_eq!(outcome.assigned, 2);
    assert!(!outcome.partial);
}

#[tokio::test]
async fn deleting_an_order_releases_its_units() {
    let app = TestApp::new().await;
    let item_id = app.seed_item_with_units("Recycled Kit", 2).await;
    let order_id = app.seed_order("Provider A").await;

    app.services
        .orders
        .assign_units(order_id, item_id, 2)
        .await
        .unwrap();
    let counts = app.services.stock_items.stock_counts(item_id).await.unwrap();
    assert_eq!(counts.in_stock, 0);

    app.services.orders.delete_order(order_id).await.unwrap();

    assert!(app
        .services
        .orders
        .get_order(order_id)
        .await
        .unwrap()
        .is_none());

    let counts = app.services.stock_items.stock_counts(item_id).await.unwrap();
    assert_eq!(counts.in_stock, 2);
    assert_eq!(counts.assigned, 0);

    let item = app.services.stock_items.get_item(item_id).await.unwrap().unwrap();
    assert_eq!(item.current_stock, 2);

    // Every unit is back in stock.
    let (units, _) = app
        .services
        .stock_units
        .list_units(Some(item_id), Some(UnitStatus::InStock), 1, 10)
        .await
        .unwrap();
    assert_eq!(units.len(), 2);
}

#[tokio::test]
async fn buckets_split_orders_by_completion_and_provider() {
    let app = TestApp::new().await;

    let pending_a = app.seed_order("Provider A").await;
    let done_a = app.seed_order("Provider A").await;
    let pending_b = app.seed_order("Provider B").await;
    let no_provider = app
        .services
        .orders
        .create_order(CreateOrderRequest::default())
        .await
        .unwrap()
        .id;

    app.services
        .orders
        .update_workflow_flags(done_a, all_flags(true))
        .await
        .unwrap();

    let buckets = app.services.orders.order_buckets().await.unwrap();

    let completed_ids: Vec<_> = buckets
        .completed
        .iter()
        .flat_map(|g| g.orders.iter().map(|o| o.id))
        .collect();
    assert_eq!(completed_ids, vec![done_a]);

    let pending_groups: Vec<_> = buckets
        .pending
        .iter()
        .map(|g| g.provider.clone())
        .collect();
    assert_eq!(
        pending_groups,
        vec![
            "Provider A".to_string(),
            "Provider B".to_string(),
            "Unassigned".to_string()
        ]
    );

    let pending_ids: Vec<_> = buckets
        .pending
        .iter()
        .flat_map(|g| g.orders.iter().map(|o| o.id))
        .collect();
    assert!(pending_ids.contains(&pending_a));
    assert!(pending_ids.contains(&pending_b));
    assert!(pending_ids.contains(&no_provider));
}

#[tokio::test]
async fn opt_in_pending_literal_is_normalized_on_create_and_update() {
    let app = TestApp::new().await;

    let order = app
        .services
        .orders
        .create_order(CreateOrderRequest {
            opt_in_status: Some("Pending".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(order.opt_in_status.is_none());

    let order = app
        .services
        .orders
        .update_details(
            order.id,
            CreateOrderRequest {
                opt_in_status: Some("Opted In".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(order.opt_in_status.as_deref(), Some("Opted In"));

    let order = app
        .services
        .orders
        .update_details(
            order.id,
            CreateOrderRequest {
                opt_in_status: Some("  pending ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(order.opt_in_status.is_none());
}

#[tokio::test]
async fn line_items_require_positive_quantity() {
    let app = TestApp::new().await;
    let order_id = app.seed_order("Provider A").await;

    let err = app
        .services
        .orders
        .add_order_item(
            order_id,
            opsdesk_api::services::orders::AddOrderItemRequest {
                sku: "KIT-STD".into(),
                qty: 0,
            },
        )
        .await
        .expect_err("zero quantity must be rejected");
    assert_matches!(err, ServiceError::ValidationError(_));

    let item = app
        .services
        .orders
        .add_order_item(
            order_id,
            opsdesk_api::services::orders::AddOrderItemRequest {
                sku: "KIT-STD".into(),
                qty: 3,
            },
        )
        .await
        .unwrap();
    assert_eq!(item.sku, "KIT-STD");
    assert_eq!(item.qty, 3);
}

#[tokio::test]
async fn invalid_customer_email_is_rejected() {
    let app = TestApp::new().await;

    let err = app
        .services
        .orders
        .create_order(CreateOrderRequest {
            customer_email: Some("not-an-email".to_string()),
            ..Default::default()
        })
        .await
        .expect_err("bad email must be rejected");
    assert_matches!(err, ServiceError::ValidationError(_));
}
