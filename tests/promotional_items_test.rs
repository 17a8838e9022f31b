mod common;

use assert_matches::assert_matches;
use common::TestApp;
use opsdesk_api::errors::ServiceError;
use opsdesk_api::services::promotional_items::{
    CreatePromotionalItemRequest, ReturnRequest, SignOutRequest,
};
use uuid::Uuid;

async fn seed_item(app: &TestApp, name: &str, quantity: i32) -> Uuid {
    app.services
        .promotional_items
        .create_item(CreatePromotionalItemRequest {
            name: name.to_string(),
            category: Some("Event Equipment".to_string()),
            description: None,
            quantity,
            location: None,
            condition: Some("Good".to_string()),
        })
        .await
        .expect("create promotional item")
        .id
}

fn sign_out(by: &str, quantity: i32) -> SignOutRequest {
    SignOutRequest {
        signed_out_by: by.to_string(),
        quantity,
        expected_return_date: None,
        notes: "market stall".to_string(),
    }
}

fn ret(by: &str, quantity: i32) -> ReturnRequest {
    ReturnRequest {
        returned_by: by.to_string(),
        quantity,
        notes: "back from the market".to_string(),
        condition: None,
    }
}

#[tokio::test]
async fn new_item_starts_fully_available() {
    let app = TestApp::new().await;
    let id = seed_item(&app, "Gazebo", 3).await;

    let item = app
        .services
        .promotional_items
        .get_item(id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item.quantity, 3);
    assert_eq!(item.available_quantity, 3);
    assert!(!item.signed_out);
}

#[tokio::test]
async fn sign_out_decrements_and_tracks_signer() {
    let app = TestApp::new().await;
    let id = seed_item(&app, "Banner", 5).await;

    let item = app
        .services
        .promotional_items
        .sign_out(id, sign_out("Alex", 2))
        .await
        .unwrap();
    assert_eq!(item.available_quantity, 3);
    assert!(item.signed_out);
    assert_eq!(item.signed_out_by.as_deref(), Some("Alex"));
    assert_eq!(item.sign_out_notes.as_deref(), Some("market stall"));
}

#[tokio::test]
async fn over_sign_out_fails_with_availability_context() {
    let app = TestApp::new().await;
    let id = seed_item(&app, "Table", 2).await;

    app.services
        .promotional_items
        .sign_out(id, sign_out("Alex", 1))
        .await
        .unwrap();

    let err = app
        .services
        .promotional_items
        .sign_out(id, sign_out("Sam", 2))
        .await
        .expect_err("over-sign-out must fail");
    assert_matches!(
        err,
        ServiceError::NoAvailableUnits {
            requested: 2,
            available: 1
        }
    );

    // The counter is untouched by the failed attempt.
    let item = app
        .services
        .promotional_items
        .get_item(id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item.available_quantity, 1);
}

#[tokio::test]
async fn return_restores_availability_and_clears_sign_out() {
    let app = TestApp::new().await;
    let id = seed_item(&app, "Flag", 4).await;

    app.services
        .promotional_items
        .sign_out(id, sign_out("Alex", 3))
        .await
        .unwrap();

    let item = app
        .services
        .promotional_items
        .return_item(id, ret("Sam", 2))
        .await
        .unwrap();
    assert_eq!(item.available_quantity, 3);
    assert!(item.signed_out); // one still out
    assert_eq!(item.last_returned_by.as_deref(), Some("Sam"));
    // The open sign-out keeps its record until everything is back.
    assert_eq!(item.signed_out_by.as_deref(), Some("Alex"));
    assert_eq!(item.sign_out_notes.as_deref(), Some("market stall"));

    let item = app
        .services
        .promotional_items
        .return_item(id, ret("Sam", 1))
        .await
        .unwrap();
    assert_eq!(item.available_quantity, 4);
    assert!(!item.signed_out);
    assert_eq!(item.signed_out_by, None);
    assert_eq!(item.sign_out_notes, None);
    assert_eq!(item.expected_return_date, None);
    assert_eq!(item.last_returned_by.as_deref(), Some("Sam"));
}

#[tokio::test]
async fn over_return_is_clamped_to_total() {
    let app = TestApp::new().await;
    let id = seed_item(&app, "Gazebo", 2).await;

    app.services
        .promotional_items
        .sign_out(id, sign_out("Alex", 1))
        .await
        .unwrap();

    let item = app
        .services
        .promotional_items
        .return_item(id, ret("Sam", 5))
        .await
        .unwrap();
    assert_eq!(item.available_quantity, 2);
    assert!(!item.signed_out);
}

#[tokio::test]
async fn sign_out_requires_signer_and_positive_quantity() {
    let app = TestApp::new().await;
    let id = seed_item(&app, "Banner", 2).await;

    let err = app
        .services
        .promotional_items
        .sign_out(id, sign_out("   ", 1))
        .await
        .expect_err("blank signer must be rejected");
    assert_matches!(err, ServiceError::ValidationError(_));

    let err = app
        .services
        .promotional_items
        .sign_out(id, sign_out("Alex", 0))
        .await
        .expect_err("zero quantity must be rejected");
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn sign_out_and_return_require_notes() {
    let app = TestApp::new().await;
    let id = seed_item(&app, "Banner", 2).await;

    let err = app
        .services
        .promotional_items
        .sign_out(
            id,
            SignOutRequest {
                signed_out_by: "Alex".to_string(),
                quantity: 1,
                expected_return_date: None,
                notes: "   ".to_string(),
            },
        )
        .await
        .expect_err("blank sign-out note must be rejected");
    assert_matches!(err, ServiceError::ValidationError(_));

    app.services
        .promotional_items
        .sign_out(id, sign_out("Alex", 1))
        .await
        .unwrap();

    let err = app
        .services
        .promotional_items
        .return_item(
            id,
            ReturnRequest {
                returned_by: "Alex".to_string(),
                quantity: 1,
                notes: String::new(),
                condition: None,
            },
        )
        .await
        .expect_err("blank return note must be rejected");
    assert_matches!(err, ServiceError::ValidationError(_));

    // Neither failed call touched the counter.
    let item = app
        .services
        .promotional_items
        .get_item(id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item.available_quantity, 1);
}

#[tokio::test]
async fn delete_is_refused_while_units_are_out() {
    let app = TestApp::new().await;
    let id = seed_item(&app, "Tent", 2).await;

    app.services
        .promotional_items
        .sign_out(id, sign_out("Alex", 1))
        .await
        .unwrap();

    let err = app
        .services
        .promotional_items
        .delete_item(id)
        .await
        .expect_err("delete with signed-out units must fail");
    assert_matches!(err, ServiceError::InvalidOperation(_));

    app.services
        .promotional_items
        .return_item(id, ret("Alex", 1))
        .await
        .unwrap();
    app.services
        .promotional_items
        .delete_item(id)
        .await
        .expect("delete after full return");

    assert!(app
        .services
        .promotional_items
        .get_item(id)
        .await
        .unwrap()
        .is_none());
}
