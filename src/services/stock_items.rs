use crate::{
    entities::stock_item::{
        self, ActiveModel as StockItemActiveModel, Entity as StockItemEntity,
    },
    entities::stock_unit::{self, Entity as StockUnitEntity, UnitStatus},
    entities::order_unit::{self, Entity as OrderUnitEntity},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{Duration, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateStockItemRequest {
    #[validate(length(min = 1, max = 120, message = "Item name is required"))]
    pub name: String,
    pub provider: Option<String>,
    pub code_type: Option<String>,
    pub received_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StockItemResponse {
    pub id: Uuid,
    pub name: String,
    pub provider: Option<String>,
    pub code_type: String,
    pub received_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub current_stock: i32,
}

impl From<stock_item::Model> for StockItemResponse {
    fn from(model: stock_item::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            provider: model.provider,
            code_type: model.code_type,
            received_date: model.received_date,
            expiry_date: model.expiry_date,
            current_stock: model.current_stock,
        }
    }
}

/// Aggregate unit counts for one item, always derived from the unit ledger
/// rather than the denormalized `current_stock` column.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StockCounts {
    pub total: i64,
    pub in_stock: i64,
    pub assigned: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LowStockItem {
    pub item: StockItemResponse,
    pub in_stock: i64,
}

/// Service owning stock item definitions and catalog-level queries.
#[derive(Clone)]
pub struct StockItemService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl StockItemService {
    pub fn new(db_pool: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a stock item definition with zero units.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_item(
        &self,
        request: CreateStockItemRequest,
    ) -> Result<StockItemResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let now = Utc::now();
        let item_id = Uuid::new_v4();

        let active = StockItemActiveModel {
            id: Set(item_id),
            name: Set(request.name.trim().to_string()),
            provider: Set(request.provider),
            code_type: Set(request.code_type.unwrap_or_else(|| "Kit".to_string())),
            received_date: Set(request.received_date),
            expiry_date: Set(request.expiry_date),
            current_stock: Set(0),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        };

        let model = active.insert(db).await.map_err(|e| {
            error!(error = %e, "Failed to create stock item");
            ServiceError::DatabaseError(e)
        })?;

        info!(item_id = %item_id, "Stock item created");

        if let Err(e) = self
            .event_sender
            .send(Event::StockItemCreated(item_id))
            .await
        {
            warn!(error = %e, item_id = %item_id, "Failed to send stock item created event");
        }

        Ok(model.into())
    }

    #[instrument(skip(self))]
    pub async fn get_item(&self, item_id: Uuid) -> Result<Option<StockItemResponse>, ServiceError> {
        let db = &*self.db_pool;

        let item = StockItemEntity::find_by_id(item_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(item.map(StockItemResponse::from))
    }

    /// Lists items with pagination, newest first.
    #[instrument(skip(self))]
    pub async fn list_items(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<StockItemResponse>, u64), ServiceError> {
        if page == 0 {
            return Err(ServiceError::ValidationError(
                "Page number must be greater than 0".to_string(),
            ));
        }
        if limit == 0 || limit > 1000 {
            return Err(ServiceError::ValidationError(
                "Limit must be between 1 and 1000".to_string(),
            ));
        }

        let db = &*self.db_pool;

        let paginator = StockItemEntity::find()
            .order_by_desc(stock_item::Column::CreatedAt)
            .paginate(db, limit);

        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::DatabaseError)?;
        let items = paginator
            .fetch_page(page - 1)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok((items.into_iter().map(StockItemResponse::from).collect(), total))
    }

    /// Deletes an item and its units. Refused while any unit of the item is
    /// referenced by an order assignment.
    #[instrument(skip(self))]
    pub async fn delete_item(&self, item_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let item = StockItemEntity::find_by_id(item_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock item {} not found", item_id)))?;

        let unit_ids: Vec<Uuid> = StockUnitEntity::find()
            .filter(stock_unit::Column::ItemId.eq(item_id))
            .select_only()
            .column(stock_unit::Column::Id)
            .into_tuple()
            .all(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if !unit_ids.is_empty() {
            let referenced = OrderUnitEntity::find()
                .filter(order_unit::Column::UnitId.is_in(unit_ids.clone()))
                .count(&txn)
                .await
                .map_err(ServiceError::DatabaseError)?;

            if referenced > 0 {
                return Err(ServiceError::UnitInUse(format!(
                    "Stock item '{}' has {} unit(s) assigned to orders; unassign them first",
                    item.name, referenced
                )));
            }

            StockUnitEntity::delete_many()
                .filter(stock_unit::Column::ItemId.eq(item_id))
                .exec(&txn)
                .await
                .map_err(ServiceError::DatabaseError)?;
        }

        StockItemEntity::delete_by_id(item_id)
            .exec(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(item_id = %item_id, "Stock item deleted");
        Ok(())
    }

    /// Counts units by status for one item, straight from the ledger.
    #[instrument(skip(self))]
    pub async fn stock_counts(&self, item_id: Uuid) -> Result<StockCounts, ServiceError> {
        let db = &*self.db_pool;

        StockItemEntity::find_by_id(item_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock item {} not found", item_id)))?;

        let total = StockUnitEntity::find()
            .filter(stock_unit::Column::ItemId.eq(item_id))
            .count(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let in_stock = StockUnitEntity::find()
            .filter(stock_unit::Column::ItemId.eq(item_id))
            .filter(stock_unit::Column::Status.eq(UnitStatus::InStock.as_str()))
            .count(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let assigned = StockUnitEntity::find()
            .filter(stock_unit::Column::ItemId.eq(item_id))
            .filter(stock_unit::Column::Status.eq(UnitStatus::Assigned.as_str()))
            .count(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(StockCounts {
            total: total as i64,
            in_stock: in_stock as i64,
            assigned: assigned as i64,
        })
    }

    /// Items whose in-stock unit count is at or below the threshold.
    #[instrument(skip(self))]
    pub async fn low_stock(&self, threshold: i64) -> Result<Vec<LowStockItem>, ServiceError> {
        let db = &*self.db_pool;

        let items = StockItemEntity::find()
            .order_by_asc(stock_item::Column::Name)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        // One grouped count over the ledger covers every item; items with no
        // units simply have no row.
        let counts: Vec<(Uuid, i64)> = StockUnitEntity::find()
            .select_only()
            .column(stock_unit::Column::ItemId)
            .column_as(stock_unit::Column::Id.count(), "in_stock")
            .filter(stock_unit::Column::Status.eq(UnitStatus::InStock.as_str()))
            .group_by(stock_unit::Column::ItemId)
            .into_tuple()
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;
        let in_stock_by_item: HashMap<Uuid, i64> = counts.into_iter().collect();

        let mut low = Vec::new();
        for item in items {
            let in_stock = in_stock_by_item.get(&item.id).copied().unwrap_or(0);
            if in_stock <= threshold {
                low.push(LowStockItem {
                    item: item.into(),
                    in_stock,
                });
            }
        }

        Ok(low)
    }

    /// Items whose expiry date falls within the horizon (inclusive).
    #[instrument(skip(self))]
    pub async fn expiring_items(
        &self,
        horizon_days: i64,
    ) -> Result<Vec<StockItemResponse>, ServiceError> {
        if horizon_days < 0 {
            return Err(ServiceError::ValidationError(
                "Horizon must be non-negative".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let cutoff = Utc::now().date_naive() + Duration::days(horizon_days);

        let items = StockItemEntity::find()
            .filter(stock_item::Column::ExpiryDate.is_not_null())
            .filter(stock_item::Column::ExpiryDate.lte(cutoff))
            .order_by_asc(stock_item::Column::ExpiryDate)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(items.into_iter().map(StockItemResponse::from).collect())
    }
}
