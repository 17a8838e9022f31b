use crate::{
    config::AppConfig,
    entities::order::Entity as OrderEntity,
    entities::order_unit::{
        self, ActiveModel as OrderUnitActiveModel, Entity as OrderUnitEntity,
    },
    entities::stock_item::{self, Entity as StockItemEntity},
    entities::stock_unit::{
        self, ActiveModel as StockUnitActiveModel, Entity as StockUnitEntity, UnitStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Ledger behavior toggles derived from application configuration.
#[derive(Debug, Clone)]
pub struct LedgerPolicy {
    /// Reject duplicate barcodes on intake. Off by default: the canonical
    /// schema permits duplicates.
    pub strict_barcode_uniqueness: bool,
    /// Rows per transaction for batch intake.
    pub intake_batch_size: usize,
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        Self {
            strict_barcode_uniqueness: false,
            intake_batch_size: 100,
        }
    }
}

impl From<&AppConfig> for LedgerPolicy {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            strict_barcode_uniqueness: cfg.strict_barcode_uniqueness,
            intake_batch_size: cfg.unit_intake_batch_size.max(1),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewUnit {
    pub barcode: String,
    pub batch_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UnitResponse {
    pub id: Uuid,
    pub item_id: Uuid,
    pub barcode: String,
    pub batch_number: Option<String>,
    pub status: String,
    pub last_update: DateTime<Utc>,
    pub signed_out_by: Option<String>,
    pub signed_out_date: Option<DateTime<Utc>>,
    pub promotional_notes: Option<String>,
    pub returned_by: Option<String>,
    pub returned_date: Option<DateTime<Utc>>,
    pub return_reason: Option<String>,
}

impl From<stock_unit::Model> for UnitResponse {
    fn from(model: stock_unit::Model) -> Self {
        Self {
            id: model.id,
            item_id: model.item_id,
            barcode: model.barcode,
            batch_number: model.batch_number,
            status: model.status,
            last_update: model.last_update,
            signed_out_by: model.signed_out_by,
            signed_out_date: model.signed_out_date,
            promotional_notes: model.promotional_notes,
            returned_by: model.returned_by,
            returned_date: model.returned_date,
            return_reason: model.return_reason,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderUnitResponse {
    pub id: Uuid,
    pub order_id: Uuid,
    pub unit_id: Uuid,
    pub assigned_at: DateTime<Utc>,
}

impl From<order_unit::Model> for OrderUnitResponse {
    fn from(model: order_unit::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            unit_id: model.unit_id,
            assigned_at: model.assigned_at,
        }
    }
}

/// Adjusts the denormalized in-stock counter on the owning item.
/// Always called inside the same transaction as the unit mutation.
pub(crate) async fn adjust_current_stock<C: ConnectionTrait>(
    conn: &C,
    item_id: Uuid,
    delta: i32,
) -> Result<(), ServiceError> {
    if delta == 0 {
        return Ok(());
    }

    StockItemEntity::update_many()
        .col_expr(
            stock_item::Column::CurrentStock,
            Expr::col(stock_item::Column::CurrentStock).add(delta),
        )
        .col_expr(stock_item::Column::UpdatedAt, Expr::value(Some(Utc::now())))
        .filter(stock_item::Column::Id.eq(item_id))
        .exec(conn)
        .await
        .map_err(ServiceError::DatabaseError)?;

    Ok(())
}

/// The authoritative per-unit state machine.
///
/// All mutations claim or release state through atomic conditional updates
/// (UPDATE ... WHERE id = ? AND status = ?), so two concurrent requests can
/// never both claim the same unit.
#[derive(Clone)]
pub struct StockUnitService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
    policy: LedgerPolicy,
}

impl StockUnitService {
    pub fn new(
        db_pool: Arc<DatabaseConnection>,
        event_sender: EventSender,
        policy: LedgerPolicy,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            policy,
        }
    }

    /// Creates one unit with status `In Stock` and bumps the item counter.
    #[instrument(skip(self), fields(item_id = %item_id, barcode = %barcode))]
    pub async fn add_unit(
        &self,
        item_id: Uuid,
        barcode: &str,
        batch_number: Option<String>,
    ) -> Result<UnitResponse, ServiceError> {
        let barcode = barcode.trim();
        if barcode.is_empty() {
            return Err(ServiceError::ValidationError(
                "Barcode is required".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        StockItemEntity::find_by_id(item_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock item {} not found", item_id)))?;

        if self.policy.strict_barcode_uniqueness {
            let existing = StockUnitEntity::find()
                .filter(stock_unit::Column::Barcode.eq(barcode))
                .count(&txn)
                .await
                .map_err(ServiceError::DatabaseError)?;
            if existing > 0 {
                return Err(ServiceError::DuplicateBarcode(barcode.to_string()));
            }
        }

        let now = Utc::now();
        let active = StockUnitActiveModel {
            id: Set(Uuid::new_v4()),
            item_id: Set(item_id),
            barcode: Set(barcode.to_string()),
            batch_number: Set(batch_number),
            status: Set(UnitStatus::InStock.as_str().to_string()),
            last_update: Set(now),
            signed_out_by: Set(None),
            signed_out_date: Set(None),
            promotional_notes: Set(None),
            returned_by: Set(None),
            returned_date: Set(None),
            return_reason: Set(None),
        };

        let model = active
            .insert(&txn)
            .await
            .map_err(|e| ServiceError::from_db(e, barcode))?;

        adjust_current_stock(&txn, item_id, 1).await?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        Ok(model.into())
    }

    /// Batch intake: inserts units in bounded chunks, each chunk in its own
    /// transaction, so a large delivery does not hold one long transaction.
    #[instrument(skip(self, units), fields(item_id = %item_id, count = units.len()))]
    pub async fn add_units(
        &self,
        item_id: Uuid,
        units: Vec<NewUnit>,
    ) -> Result<usize, ServiceError> {
        if units.is_empty() {
            return Err(ServiceError::ValidationError(
                "At least one unit is required".to_string(),
            ));
        }
        if units.iter().any(|u| u.barcode.trim().is_empty()) {
            return Err(ServiceError::ValidationError(
                "Every unit needs a barcode".to_string(),
            ));
        }

        if self.policy.strict_barcode_uniqueness {
            let mut seen = HashSet::new();
            for unit in &units {
                if !seen.insert(unit.barcode.trim().to_string()) {
                    return Err(ServiceError::DuplicateBarcode(unit.barcode.trim().into()));
                }
            }
        }

        let db = &*self.db_pool;

        StockItemEntity::find_by_id(item_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock item {} not found", item_id)))?;

        let mut added = 0usize;
        for chunk in units.chunks(self.policy.intake_batch_size) {
            let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

            if self.policy.strict_barcode_uniqueness {
                let barcodes: Vec<String> =
                    chunk.iter().map(|u| u.barcode.trim().to_string()).collect();
                let existing = StockUnitEntity::find()
                    .filter(stock_unit::Column::Barcode.is_in(barcodes.clone()))
                    .count(&txn)
                    .await
                    .map_err(ServiceError::DatabaseError)?;
                if existing > 0 {
                    return Err(ServiceError::DuplicateBarcode(format!(
                        "{} barcode(s) in this batch already exist",
                        existing
                    )));
                }
            }

            let now = Utc::now();
            let models: Vec<StockUnitActiveModel> = chunk
                .iter()
                .map(|u| StockUnitActiveModel {
                    id: Set(Uuid::new_v4()),
                    item_id: Set(item_id),
                    barcode: Set(u.barcode.trim().to_string()),
                    batch_number: Set(u.batch_number.clone()),
                    status: Set(UnitStatus::InStock.as_str().to_string()),
                    last_update: Set(now),
                    signed_out_by: Set(None),
                    signed_out_date: Set(None),
                    promotional_notes: Set(None),
                    returned_by: Set(None),
                    returned_date: Set(None),
                    return_reason: Set(None),
                })
                .collect();

            let chunk_len = models.len();
            StockUnitEntity::insert_many(models)
                .exec(&txn)
                .await
                .map_err(ServiceError::DatabaseError)?;

            adjust_current_stock(&txn, item_id, chunk_len as i32).await?;

            txn.commit().await.map_err(ServiceError::DatabaseError)?;
            added += chunk_len;
        }

        info!(item_id = %item_id, added = added, "Units received into stock");

        if let Err(e) = self
            .event_sender
            .send(Event::UnitsReceived {
                item_id,
                count: added,
            })
            .await
        {
            warn!(error = %e, item_id = %item_id, "Failed to send units received event");
        }

        Ok(added)
    }

    #[instrument(skip(self))]
    pub async fn get_unit(&self, unit_id: Uuid) -> Result<Option<UnitResponse>, ServiceError> {
        let db = &*self.db_pool;

        let unit = StockUnitEntity::find_by_id(unit_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(unit.map(UnitResponse::from))
    }

    /// Lists units, optionally filtered by item and status.
    #[instrument(skip(self))]
    pub async fn list_units(
        &self,
        item_id: Option<Uuid>,
        status: Option<UnitStatus>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<UnitResponse>, u64), ServiceError> {
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

        let mut query = StockUnitEntity::find();
        if let Some(item_id) = item_id {
            query = query.filter(stock_unit::Column::ItemId.eq(item_id));
        }
        if let Some(status) = status {
            query = query.filter(stock_unit::Column::Status.eq(status.as_str()));
        }
        query = query.order_by_asc(stock_unit::Column::LastUpdate);

        let paginator = query.paginate(db, limit);
        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::DatabaseError)?;
        let units = paginator
            .fetch_page(page - 1)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok((units.into_iter().map(UnitResponse::from).collect(), total))
    }

    /// Deletes a unit. Refused while an order assignment references it.
    #[instrument(skip(self))]
    pub async fn delete_unit(&self, unit_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let unit = StockUnitEntity::find_by_id(unit_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock unit {} not found", unit_id)))?;

        let referenced = OrderUnitEntity::find()
            .filter(order_unit::Column::UnitId.eq(unit_id))
            .count(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if referenced > 0 {
            return Err(ServiceError::UnitInUse(format!(
                "Unit {} is assigned to an order; unassign it first",
                unit.barcode
            )));
        }

        let was_in_stock = unit.unit_status() == Some(UnitStatus::InStock);

        StockUnitEntity::delete_by_id(unit_id)
            .exec(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if was_in_stock {
            adjust_current_stock(&txn, unit.item_id, -1).await?;
        }

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(unit_id = %unit_id, "Stock unit deleted");
        Ok(())
    }

    /// External status-update path; the only way a unit reaches `Used`.
    ///
    /// Assignment state cannot be entered or left here: that belongs to the
    /// order association and its atomic claim/release.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        unit_id: Uuid,
        new_status: UnitStatus,
    ) -> Result<UnitResponse, ServiceError> {
        if new_status == UnitStatus::Assigned {
            return Err(ServiceError::InvalidOperation(
                "Units become Assigned through order assignment, not direct status updates"
                    .to_string(),
            ));
        }

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let unit = StockUnitEntity::find_by_id(unit_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock unit {} not found", unit_id)))?;

        let old_status = unit.unit_status().ok_or_else(|| {
            ServiceError::InternalError(format!("Unit {} has unknown status", unit_id))
        })?;

        if old_status == UnitStatus::Assigned {
            return Err(ServiceError::InvalidOperation(
                "Unit is assigned to an order; unassign it before changing status".to_string(),
            ));
        }

        let now = Utc::now();
        let updated = StockUnitEntity::update_many()
            .col_expr(stock_unit::Column::Status, Expr::value(new_status.as_str()))
            .col_expr(stock_unit::Column::LastUpdate, Expr::value(now))
            .filter(stock_unit::Column::Id.eq(unit_id))
            .filter(stock_unit::Column::Status.eq(old_status.as_str()))
            .exec(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if updated.rows_affected == 0 {
            return Err(ServiceError::UnitNotAvailable(format!(
                "Unit {} changed state concurrently",
                unit.barcode
            )));
        }

        let delta = i32::from(new_status == UnitStatus::InStock)
            - i32::from(old_status == UnitStatus::InStock);
        adjust_current_stock(&txn, unit.item_id, delta).await?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        let mut model = unit;
        model.status = new_status.as_str().to_string();
        model.last_update = now;
        Ok(model.into())
    }

    /// Claims an `In Stock` unit for an order.
    ///
    /// The claim is a single conditional UPDATE keyed on the current status,
    /// so of two concurrent claims on the last unit exactly one succeeds; the
    /// other sees zero rows affected and fails with `UnitNotAvailable`.
    #[instrument(skip(self), fields(unit_id = %unit_id, order_id = %order_id))]
    pub async fn assign_to_order(
        &self,
        unit_id: Uuid,
        order_id: Uuid,
    ) -> Result<OrderUnitResponse, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let unit = StockUnitEntity::find_by_id(unit_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock unit {} not found", unit_id)))?;

        let now = Utc::now();
        let claimed = StockUnitEntity::update_many()
            .col_expr(
                stock_unit::Column::Status,
                Expr::value(UnitStatus::Assigned.as_str()),
            )
            .col_expr(stock_unit::Column::LastUpdate, Expr::value(now))
            .filter(stock_unit::Column::Id.eq(unit_id))
            .filter(stock_unit::Column::Status.eq(UnitStatus::InStock.as_str()))
            .exec(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if claimed.rows_affected == 0 {
            return Err(ServiceError::UnitNotAvailable(format!(
                "Unit {} is not available (status: {})",
                unit.barcode, unit.status
            )));
        }

        let order_unit = OrderUnitActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            unit_id: Set(unit_id),
            assigned_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::DatabaseError)?;

        adjust_current_stock(&txn, unit.item_id, -1).await?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        if let Err(e) = self
            .event_sender
            .send(Event::UnitAssigned { unit_id, order_id })
            .await
        {
            warn!(error = %e, unit_id = %unit_id, "Failed to send unit assigned event");
        }

        Ok(order_unit.into())
    }

    /// Releases an assignment, flipping the unit back to `In Stock`.
    ///
    /// `expected_order_id` guards against cross-order tampering: an
    /// assignment can only be released through the order that owns it.
    #[instrument(skip(self))]
    pub async fn unassign(
        &self,
        order_unit_id: Uuid,
        expected_order_id: Uuid,
    ) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let order_unit = OrderUnitEntity::find_by_id(order_unit_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order unit {} not found", order_unit_id))
            })?;

        if order_unit.order_id != expected_order_id {
            return Err(ServiceError::NotFound(format!(
                "Order unit {} not found on order {}",
                order_unit_id, expected_order_id
            )));
        }

        let unit = StockUnitEntity::find_by_id(order_unit.unit_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "Order unit {} references missing unit {}",
                    order_unit_id, order_unit.unit_id
                ))
            })?;

        OrderUnitEntity::delete_by_id(order_unit_id)
            .exec(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let released = StockUnitEntity::update_many()
            .col_expr(
                stock_unit::Column::Status,
                Expr::value(UnitStatus::InStock.as_str()),
            )
            .col_expr(stock_unit::Column::LastUpdate, Expr::value(Utc::now()))
            .filter(stock_unit::Column::Id.eq(order_unit.unit_id))
            .filter(stock_unit::Column::Status.eq(UnitStatus::Assigned.as_str()))
            .exec(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if released.rows_affected == 0 {
            return Err(ServiceError::InternalError(format!(
                "Unit {} was assigned to order {} but its status was not Assigned",
                unit.barcode, expected_order_id
            )));
        }

        adjust_current_stock(&txn, unit.item_id, 1).await?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        if let Err(e) = self
            .event_sender
            .send(Event::UnitUnassigned {
                unit_id: order_unit.unit_id,
                order_id: expected_order_id,
            })
            .await
        {
            warn!(error = %e, "Failed to send unit unassigned event");
        }

        Ok(())
    }

    /// Signs an in-stock unit out for promotional use.
    /// Requires a signer name and a purpose note.
    #[instrument(skip(self, note), fields(unit_id = %unit_id))]
    pub async fn sign_out_promotional(
        &self,
        unit_id: Uuid,
        signer: &str,
        note: &str,
    ) -> Result<UnitResponse, ServiceError> {
        let signer = signer.trim();
        let note = note.trim();
        if signer.is_empty() {
            return Err(ServiceError::ValidationError(
                "Signer name is required for promotional sign-out".to_string(),
            ));
        }
        if note.is_empty() {
            return Err(ServiceError::ValidationError(
                "Purpose note is required for promotional sign-out".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let unit = StockUnitEntity::find_by_id(unit_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock unit {} not found", unit_id)))?;

        let now = Utc::now();
        let updated = StockUnitEntity::update_many()
            .col_expr(
                stock_unit::Column::Status,
                Expr::value(UnitStatus::PromotionalUse.as_str()),
            )
            .col_expr(stock_unit::Column::LastUpdate, Expr::value(now))
            .col_expr(
                stock_unit::Column::SignedOutBy,
                Expr::value(Some(signer.to_string())),
            )
            .col_expr(stock_unit::Column::SignedOutDate, Expr::value(Some(now)))
            .col_expr(
                stock_unit::Column::PromotionalNotes,
                Expr::value(Some(note.to_string())),
            )
            .col_expr(
                stock_unit::Column::ReturnedBy,
                Expr::value(Option::<String>::None),
            )
            .col_expr(
                stock_unit::Column::ReturnedDate,
                Expr::value(Option::<DateTime<Utc>>::None),
            )
            .col_expr(
                stock_unit::Column::ReturnReason,
                Expr::value(Option::<String>::None),
            )
            .filter(stock_unit::Column::Id.eq(unit_id))
            .filter(stock_unit::Column::Status.eq(UnitStatus::InStock.as_str()))
            .exec(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if updated.rows_affected == 0 {
            return Err(ServiceError::UnitNotAvailable(format!(
                "Unit {} is not in stock (status: {})",
                unit.barcode, unit.status
            )));
        }

        adjust_current_stock(&txn, unit.item_id, -1).await?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        if let Err(e) = self
            .event_sender
            .send(Event::UnitSignedOut {
                unit_id,
                signed_out_by: signer.to_string(),
            })
            .await
        {
            warn!(error = %e, "Failed to send unit signed out event");
        }

        self.get_unit(unit_id).await?.ok_or_else(|| {
            ServiceError::InternalError(format!("Unit {} vanished after sign-out", unit_id))
        })
    }

    /// Returns a promotionally signed-out unit to stock.
    /// Requires a returner name and a condition/reason note.
    #[instrument(skip(self, note), fields(unit_id = %unit_id))]
    pub async fn return_promotional(
        &self,
        unit_id: Uuid,
        returner: &str,
        note: &str,
    ) -> Result<UnitResponse, ServiceError> {
        let returner = returner.trim();
        let note = note.trim();
        if returner.is_empty() {
            return Err(ServiceError::ValidationError(
                "Returner name is required for promotional return".to_string(),
            ));
        }
        if note.is_empty() {
            return Err(ServiceError::ValidationError(
                "Condition note is required for promotional return".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let unit = StockUnitEntity::find_by_id(unit_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock unit {} not found", unit_id)))?;

        let now = Utc::now();
        let updated = StockUnitEntity::update_many()
            .col_expr(
                stock_unit::Column::Status,
                Expr::value(UnitStatus::InStock.as_str()),
            )
            .col_expr(stock_unit::Column::LastUpdate, Expr::value(now))
            .col_expr(
                stock_unit::Column::ReturnedBy,
                Expr::value(Some(returner.to_string())),
            )
            .col_expr(stock_unit::Column::ReturnedDate, Expr::value(Some(now)))
            .col_expr(
                stock_unit::Column::ReturnReason,
                Expr::value(Some(note.to_string())),
            )
            .filter(stock_unit::Column::Id.eq(unit_id))
            .filter(stock_unit::Column::Status.eq(UnitStatus::PromotionalUse.as_str()))
            .exec(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if updated.rows_affected == 0 {
            return Err(ServiceError::UnitNotAvailable(format!(
                "Unit {} is not signed out for promotional use (status: {})",
                unit.barcode, unit.status
            )));
        }

        adjust_current_stock(&txn, unit.item_id, 1).await?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        if let Err(e) = self
            .event_sender
            .send(Event::UnitReturned {
                unit_id,
                returned_by: returner.to_string(),
            })
            .await
        {
            warn!(error = %e, "Failed to send unit returned event");
        }

        self.get_unit(unit_id).await?.ok_or_else(|| {
            ServiceError::InternalError(format!("Unit {} vanished after return", unit_id))
        })
    }
}
