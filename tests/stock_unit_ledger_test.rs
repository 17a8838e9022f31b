mod common;

use assert_matches::assert_matches;
use common::TestApp;
use opsdesk_api::entities::stock_unit::UnitStatus;
use opsdesk_api::errors::ServiceError;
use opsdesk_api::services::stock_units::NewUnit;

async fn first_unit_id(app: &TestApp, item_id: uuid::Uuid) -> uuid::Uuid {
    let (units, _) = app
        .services
        .stock_units
        .list_units(Some(item_id), None, 1, 10)
        .await
        .expect("list units");
    units.first().expect("at least one unit").id
}

#[tokio::test]
async fn assign_and_unassign_round_trip_restores_stock() {
    let app = TestApp::new().await;
    let item_id = app.seed_item_with_units("Round Trip Kit", 3).await;
    let order_id = app.seed_order("Provider A").await;
    let unit_id = first_unit_id(&app, item_id).await;

    let order_unit = app
        .services
        .stock_units
        .assign_to_order(unit_id, order_id)
        .await
        .expect("assign");

    let unit = app
        .services
        .stock_units
        .get_unit(unit_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unit.status, UnitStatus::Assigned.as_str());

    let counts = app.services.stock_items.stock_counts(item_id).await.unwrap();
    assert_eq!(counts.in_stock, 2);
    assert_eq!(counts.assigned, 1);

    let item = app.services.stock_items.get_item(item_id).await.unwrap().unwrap();
    assert_eq!(item.current_stock, 2);

    app.services
        .stock_units
        .unassign(order_unit.id, order_id)
        .await
        .expect("unassign");

    let unit = app
        .services
        .stock_units
        .get_unit(unit_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unit.status, UnitStatus::InStock.as_str());

    let counts = app.services.stock_items.stock_counts(item_id).await.unwrap();
    assert_eq!(counts.in_stock, 3);
    assert_eq!(counts.assigned, 0);

    let item = app.services.stock_items.get_item(item_id).await.unwrap().unwrap();
    assert_eq!(item.current_stock, 3);
}

#[tokio::test]
async fn second_assignment_of_same_unit_is_rejected() {
    let app = TestApp::new().await;
    let item_id = app.seed_item_with_units("Contested Kit", 1).await;
    let order_a = app.seed_order("Provider A").await;
    let order_b = app.seed_order("Provider B").await;
    let unit_id = first_unit_id(&app, item_id).await;

    app.services
        .stock_units
        .assign_to_order(unit_id, order_a)
        .await
        .expect("first assignment");

    let err = app
        .services
        .stock_units
        .assign_to_order(unit_id, order_b)
        .await
        .expect_err("second assignment must fail");
    assert_matches!(err, ServiceError::UnitNotAvailable(_));

    // Only one assignment record exists.
    let assigned = app.services.orders.order_units(order_a).await.unwrap();
    assert_eq!(assigned.len(), 1);
    let assigned_b = app.services.orders.order_units(order_b).await.unwrap();
    assert!(assigned_b.is_empty());
}

// Requires real concurrent access to one SQLite file; run explicitly with:
// cargo test -- --ignored concurrent_claims
#[tokio::test]
#[ignore]
async fn concurrent_claims_on_one_unit_yield_exactly_one_winner() {
    let app = TestApp::new().await;
    let item_id = app.seed_item_with_units("Race Kit", 1).await;
    let unit_id = first_unit_id(&app, item_id).await;

    let mut orders = Vec::new();
    for n in 0..10 {
        orders.push(app.seed_order(&format!("Provider {}", n)).await);
    }

    let mut tasks = Vec::new();
    for order_id in orders {
        let svc = app.services.stock_units.as_ref().clone();
        tasks.push(tokio::spawn(async move {
            svc.assign_to_order(unit_id, order_id).await.is_ok()
        }));
    }

    let mut successes = 0;
    for task in tasks {
        if task.await.unwrap() {
            successes += 1;
        }
    }
    assert_eq!(successes, 1);
}

#[tokio::test]
async fn assigned_unit_cannot_be_deleted_or_retyped() {
    let app = TestApp::new().await;
    let item_id = app.seed_item_with_units("Guarded Kit", 1).await;
    let order_id = app.seed_order("Provider A").await;
    let unit_id = first_unit_id(&app, item_id).await;

    app.services
        .stock_units
        .assign_to_order(unit_id, order_id)
        .await
        .unwrap();

    let err = app
        .services
        .stock_units
        .delete_unit(unit_id)
        .await
        .expect_err("delete of assigned unit must fail");
    assert_matches!(err, ServiceError::UnitInUse(_));

    let err = app
        .services
        .stock_units
        .update_status(unit_id, UnitStatus::Used)
        .await
        .expect_err("status change of assigned unit must fail");
    assert_matches!(err, ServiceError::InvalidOperation(_));

    // The item itself is also protected while its units are assigned.
    let err = app
        .services
        .stock_items
        .delete_item(item_id)
        .await
        .expect_err("delete of item with assigned units must fail");
    assert_matches!(err, ServiceError::UnitInUse(_));
}

#[tokio::test]
async fn deleting_an_in_stock_unit_decrements_the_counter() {
    let app = TestApp::new().await;
    let item_id = app.seed_item_with_units("Shrinking Kit", 2).await;
    let unit_id = first_unit_id(&app, item_id).await;

    app.services.stock_units.delete_unit(unit_id).await.unwrap();

    let item = app.services.stock_items.get_item(item_id).await.unwrap().unwrap();
    assert_eq!(item.current_stock, 1);
    let counts = app.services.stock_items.stock_counts(item_id).await.unwrap();
    assert_eq!(counts.total, 1);
}

#[tokio::test]
async fn used_units_are_out_of_circulation() {
    let app = TestApp::new().await;
    let item_id = app.seed_item_with_units("One Shot Kit", 1).await;
    let order_id = app.seed_order("Provider A").await;
    let unit_id = first_unit_id(&app, item_id).await;

    app.services
        .stock_units
        .update_status(unit_id, UnitStatus::Used)
        .await
        .unwrap();

    let item = app.services.stock_items.get_item(item_id).await.unwrap().unwrap();
    assert_eq!(item.current_stock, 0);

    let err = app
        .services
        .stock_units
        .assign_to_order(unit_id, order_id)
        .await
        .expect_err("used unit must not be assignable");
    assert_matches!(err, ServiceError::UnitNotAvailable(_));
}

#[tokio::test]
async fn promotional_sign_out_requires_signer_and_note() {
    let app = TestApp::new().await;
    let item_id = app.seed_item_with_units("Promo Kit", 1).await;
    let unit_id = first_unit_id(&app, item_id).await;

    let err = app
        .services
        .stock_units
        .sign_out_promotional(unit_id, "   ", "demo at conference")
        .await
        .expect_err("blank signer must be rejected");
    assert_matches!(err, ServiceError::ValidationError(_));

    let err = app
        .services
        .stock_units
        .sign_out_promotional(unit_id, "Alex", "")
        .await
        .expect_err("blank note must be rejected");
    assert_matches!(err, ServiceError::ValidationError(_));

    // The unit is untouched by the failed attempts.
    let unit = app
        .services
        .stock_units
        .get_unit(unit_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unit.status, UnitStatus::InStock.as_str());
    assert!(unit.signed_out_by.is_none());
}

#[tokio::test]
async fn promotional_sign_out_and_return_track_metadata() {
    let app = TestApp::new().await;
    let item_id = app.seed_item_with_units("Promo Kit", 2).await;
    let unit_id = first_unit_id(&app, item_id).await;

    let unit = app
        .services
        .stock_units
        .sign_out_promotional(unit_id, "Alex", "demo at conference")
        .await
        .unwrap();
    assert_eq!(unit.status, UnitStatus::PromotionalUse.as_str());
    assert_eq!(unit.signed_out_by.as_deref(), Some("Alex"));
    assert_eq!(unit.promotional_notes.as_deref(), Some("demo at conference"));
    assert!(unit.signed_out_date.is_some());
    assert!(unit.returned_by.is_none());

    let item = app.services.stock_items.get_item(item_id).await.unwrap().unwrap();
    assert_eq!(item.current_stock, 1);

    // Signing out a unit that is already out fails.
    let err = app
        .services
        .stock_units
        .sign_out_promotional(unit_id, "Sam", "another event")
        .await
        .expect_err("double sign-out must fail");
    assert_matches!(err, ServiceError::UnitNotAvailable(_));

    let unit = app
        .services
        .stock_units
        .return_promotional(unit_id, "Sam", "returned in good condition")
        .await
        .unwrap();
    assert_eq!(unit.status, UnitStatus::InStock.as_str());
    assert_eq!(unit.returned_by.as_deref(), Some("Sam"));
    assert_eq!(
        unit.return_reason.as_deref(),
        Some("returned in good condition")
    );
    // Sign-out history survives the return.
    assert_eq!(unit.signed_out_by.as_deref(), Some("Alex"));

    let item = app.services.stock_items.get_item(item_id).await.unwrap().unwrap();
    assert_eq!(item.current_stock, 2);
}

#[tokio::test]
async fn duplicate_barcodes_are_allowed_by_default() {
    let app = TestApp::new().await;
    let item_id = app.seed_item_with_units("Lenient Kit", 0).await;

    for _ in 0..2 {
        app.services
            .stock_units
            .add_unit(item_id, "SAME-BARCODE", None)
            .await
            .expect("duplicate barcode accepted by default");
    }

    let counts = app.services.stock_items.stock_counts(item_id).await.unwrap();
    assert_eq!(counts.total, 2);
}

#[tokio::test]
async fn strict_mode_rejects_duplicate_barcodes() {
    let app = TestApp::with_config(|cfg| cfg.strict_barcode_uniqueness = true).await;
    let item_id = app.seed_item_with_units("Strict Kit", 0).await;

    app.services
        .stock_units
        .add_unit(item_id, "UNIQ-1", None)
        .await
        .unwrap();

    let err = app
        .services
        .stock_units
        .add_unit(item_id, "UNIQ-1", None)
        .await
        .expect_err("duplicate must be rejected in strict mode");
    assert_matches!(err, ServiceError::DuplicateBarcode(_));

    // Batch intake checks both within the batch and against existing rows.
    let err = app
        .services
        .stock_units
        .add_units(
            item_id,
            vec![
                NewUnit {
                    barcode: "UNIQ-2".into(),
                    batch_number: None,
                },
                NewUnit {
                    barcode: "UNIQ-2".into(),
                    batch_number: None,
                },
            ],
        )
        .await
        .expect_err("in-batch duplicate must be rejected");
    assert_matches!(err, ServiceError::DuplicateBarcode(_));
}

#[tokio::test]
async fn batch_intake_spans_multiple_chunks() {
    let app = TestApp::with_config(|cfg| cfg.unit_intake_batch_size = 10).await;
    let item_id = app.seed_item_with_units("Bulk Kit", 0).await;

    let units = (0..25)
        .map(|n| NewUnit {
            barcode: format!("BULK-{:04}", n),
            batch_number: Some("B1".into()),
        })
        .collect();
    let added = app.services.stock_units.add_units(item_id, units).await.unwrap();
    assert_eq!(added, 25);

    let counts = app.services.stock_items.stock_counts(item_id).await.unwrap();
    assert_eq!(counts.total, 25);
    assert_eq!(counts.in_stock, 25);

    let item = app.services.stock_items.get_item(item_id).await.unwrap().unwrap();
    assert_eq!(item.current_stock, 25);
}

#[tokio::test]
async fn unassign_through_the_wrong_order_is_not_found() {
    let app = TestApp::new().await;
    let item_id = app.seed_item_with_units("Tamper Kit", 1).await;
    let order_a = app.seed_order("Provider A").await;
    let order_b = app.seed_order("Provider B").await;
    let unit_id = first_unit_id(&app, item_id).await;

    let order_unit = app
        .services
        .stock_units
        .assign_to_order(unit_id, order_a)
        .await
        .unwrap();

    let err = app
        .services
        .stock_units
        .unassign(order_unit.id, order_b)
        .await
        .expect_err("cross-order unassign must fail");
    assert_matches!(err, ServiceError::NotFound(_));

    // The assignment is untouched.
    let assigned = app.services.orders.order_units(order_a).await.unwrap();
    assert_eq!(assigned.len(), 1);
}

#[tokio::test]
async fn low_stock_counts_in_stock_units_per_item() {
    let app = TestApp::with_config(|cfg| cfg.low_stock_threshold = 2).await;
    let empty_id = app.seed_item_with_units("Empty Kit", 0).await;
    let low_id = app.seed_item_with_units("Low Kit", 2).await;
    let full_id = app.seed_item_with_units("Full Kit", 5).await;
    let order_id = app.seed_order("Provider A").await;

    // Assigned units do not count toward availability.
    let unit_id = first_unit_id(&app, low_id).await;
    app.services
        .stock_units
        .assign_to_order(unit_id, order_id)
        .await
        .unwrap();

    let low = app
        .services
        .stock_items
        .low_stock(app.config.low_stock_threshold)
        .await
        .unwrap();

    let ids: Vec<_> = low.iter().map(|l| l.item.id).collect();
    assert!(ids.contains(&empty_id));
    assert!(ids.contains(&low_id));
    assert!(!ids.contains(&full_id));

    let empty = low.iter().find(|l| l.item.id == empty_id).unwrap();
    assert_eq!(empty.in_stock, 0);
    let low_item = low.iter().find(|l| l.item.id == low_id).unwrap();
    assert_eq!(low_item.in_stock, 1);
}
