use std::sync::Arc;

use opsdesk_api::{
    config::AppConfig,
    db,
    events::{self, EventSender},
    handlers::AppServices,
    services::stock_units::NewUnit,
};
use tempfile::TempDir;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Test harness: a fresh SQLite file database per test, migrated, with the
/// full service stack and a running event consumer.
///
/// A file-backed database (not `sqlite::memory:`) is required because the
/// pool opens multiple connections and each in-memory connection would see
/// its own empty database.
pub struct TestApp {
    pub services: AppServices,
    pub config: AppConfig,
    pub db: Arc<db::DbPool>,
    pub event_sender: EventSender,
    _event_task: tokio::task::JoinHandle<()>,
    _tempdir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Construct a test application, letting the caller tweak the config
    /// before services are built.
    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let tempdir = TempDir::new().expect("failed to create temp dir");
        let db_path = tempdir.path().join("opsdesk_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 2;
        cfg.db_min_connections = 1;
        adjust(&mut cfg);

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool).await.expect("migrations failed");

        let db_arc = Arc::new(pool);
        let (tx, rx) = mpsc::channel(cfg.event_channel_capacity);
        let event_sender = EventSender::new(tx);
        let event_task = tokio::spawn(events::process_events(rx));

        let services = AppServices::new(db_arc.clone(), event_sender.clone(), &cfg);

        Self {
            services,
            config: cfg,
            db: db_arc,
            event_sender,
            _event_task: event_task,
            _tempdir: tempdir,
        }
    }

    /// Creates a stock item with `count` in-stock units and returns its id.
    pub async fn seed_item_with_units(&self, name: &str, count: usize) -> Uuid {
        let item = self
            .services
            .stock_items
            .create_item(opsdesk_api::services::stock_items::CreateStockItemRequest {
                name: name.to_string(),
                provider: Some("Test Provider".to_string()),
                code_type: None,
                received_date: None,
                expiry_date: None,
            })
            .await
            .expect("failed to create stock item");

        if count > 0 {
            let units = (0..count)
                .map(|n| NewUnit {
                    barcode: format!("{}-{:04}", name.to_uppercase().replace(' ', "-"), n),
                    batch_number: None,
                })
                .collect();
            self.services
                .stock_units
                .add_units(item.id, units)
                .await
                .expect("failed to add units");
        }

        item.id
    }

    /// Creates a bare pending order and returns its id.
    pub async fn seed_order(&self, provider: &str) -> Uuid {
        let order = self
            .services
            .orders
            .create_order(opsdesk_api::services::orders::CreateOrderRequest {
                provider: Some(provider.to_string()),
                name: Some("Test".to_string()),
                surname: Some("Customer".to_string()),
                ..Default::default()
            })
            .await
            .expect("failed to create order");
        order.id
    }
}
