pub mod orders;
pub mod promotional;
pub mod stock;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    orders::OrderService, promotional_items::PromotionalItemService,
    stock_items::StockItemService, stock_units::{LedgerPolicy, StockUnitService},
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub stock_items: Arc<StockItemService>,
    pub stock_units: Arc<StockUnitService>,
    pub orders: Arc<OrderService>,
    pub promotional_items: Arc<PromotionalItemService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender, config: &AppConfig) -> Self {
        Self {
            stock_items: Arc::new(StockItemService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            stock_units: Arc::new(StockUnitService::new(
                db_pool.clone(),
                event_sender.clone(),
                LedgerPolicy::from(config),
            )),
            orders: Arc::new(OrderService::new(db_pool.clone(), event_sender.clone())),
            promotional_items: Arc::new(PromotionalItemService::new(db_pool, event_sender)),
        }
    }
}
