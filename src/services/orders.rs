use crate::{
    entities::order::{self, ActiveModel as OrderActiveModel, Entity as OrderEntity},
    entities::order_item::{
        self, ActiveModel as OrderItemActiveModel, Entity as OrderItemEntity,
    },
    entities::order_unit::{
        self, ActiveModel as OrderUnitActiveModel, Entity as OrderUnitEntity,
    },
    entities::stock_item::Entity as StockItemEntity,
    entities::stock_unit::{self, Entity as StockUnitEntity, UnitStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    services::stock_units::adjust_current_stock,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait, Unchanged,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const STATUS_PENDING: &str = "Pending";
pub const STATUS_COMPLETED: &str = "Completed";

/// True when the status string counts as completed.
///
/// Matches case-insensitively on the prefix so historical variants like
/// "completed (manual)" keep counting.
pub fn is_completed_status(status: &str) -> bool {
    status
        .trim()
        .get(..STATUS_COMPLETED.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(STATUS_COMPLETED))
}

/// Canonical status/timestamp derivation after a workflow-flag change.
///
/// All six flags set forces the status to "Completed" and stamps
/// `completed_at` (preserving an earlier stamp). Clearing any flag on a
/// completed order reverts it to "Pending" and clears the stamp; an order
/// that was never completed keeps its current status.
pub fn resolve_completion(
    current_status: &str,
    all_flags_set: bool,
    completed_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> (String, Option<DateTime<Utc>>) {
    if all_flags_set {
        let status = if is_completed_status(current_status) {
            current_status.to_string()
        } else {
            STATUS_COMPLETED.to_string()
        };
        (status, completed_at.or(Some(now)))
    } else if is_completed_status(current_status) {
        (STATUS_PENDING.to_string(), None)
    } else {
        (current_status.to_string(), None)
    }
}

/// Normalizes the tri-state consent field: empty strings and the literal
/// "Pending" (a legacy data bug) collapse to NULL.
pub fn normalize_opt_in(value: Option<String>) -> Option<String> {
    let value = value?;
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("pending") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema, Default)]
pub struct CreateOrderRequest {
    pub provider: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub practitioner_name: Option<String>,
    pub opt_in_status: Option<String>,
    pub notes: Option<String>,
    pub ordered_at: Option<DateTime<Utc>>,
    pub woocommerce_id: Option<i64>,
    pub fillout_submission_id: Option<String>,
    pub raw_api_data: Option<String>,
    #[validate(email(message = "Invalid customer email"))]
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
}

/// Partial update of the six workflow flags. Only the flags present in the
/// request change; unknown fields are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct WorkflowFlagsUpdate {
    pub sent_out: Option<bool>,
    pub received_back: Option<bool>,
    pub kit_registered: Option<bool>,
    pub results_sent: Option<bool>,
    pub paid: Option<bool>,
    pub invoiced: Option<bool>,
}

impl WorkflowFlagsUpdate {
    pub fn is_empty(&self) -> bool {
        self.sent_out.is_none()
            && self.received_back.is_none()
            && self.kit_registered.is_none()
            && self.results_sent.is_none()
            && self.paid.is_none()
            && self.invoiced.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub provider: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub practitioner_name: Option<String>,
    pub status: String,
    pub opt_in_status: Option<String>,
    pub notes: Option<String>,
    pub sent_out: bool,
    pub received_back: bool,
    pub kit_registered: bool,
    pub results_sent: bool,
    pub paid: bool,
    pub invoiced: bool,
    pub ordered_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub woocommerce_id: Option<i64>,
    pub fillout_submission_id: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub payment_received: bool,
    pub awaiting_payment: bool,
    pub payment_notes: Option<String>,
    pub payment_date: Option<DateTime<Utc>>,
}

impl From<order::Model> for OrderResponse {
    fn from(model: order::Model) -> Self {
        Self {
            id: model.id,
            provider: model.provider,
            name: model.name,
            surname: model.surname,
            practitioner_name: model.practitioner_name,
            status: model.status,
            opt_in_status: model.opt_in_status,
            notes: model.notes,
            sent_out: model.sent_out,
            received_back: model.received_back,
            kit_registered: model.kit_registered,
            results_sent: model.results_sent,
            paid: model.paid,
            invoiced: model.invoiced,
            ordered_at: model.ordered_at,
            created_at: model.created_at,
            completed_at: model.completed_at,
            woocommerce_id: model.woocommerce_id,
            fillout_submission_id: model.fillout_submission_id,
            customer_email: model.customer_email,
            customer_phone: model.customer_phone,
            payment_received: model.payment_received,
            awaiting_payment: model.awaiting_payment,
            payment_notes: model.payment_notes,
            payment_date: model.payment_date,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct AddOrderItemRequest {
    #[validate(length(min = 1, max = 120, message = "SKU is required"))]
    pub sku: String,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub qty: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub order_id: Uuid,
    pub sku: String,
    pub qty: i32,
}

impl From<order_item::Model> for OrderItemResponse {
    fn from(model: order_item::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            sku: model.sku,
            qty: model.qty,
        }
    }
}

/// A unit assignment as seen from the order side.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignedUnit {
    pub order_unit_id: Uuid,
    pub unit_id: Uuid,
    pub barcode: String,
    pub status: String,
    pub assigned_at: DateTime<Utc>,
}

/// Result of a bulk assignment request. Partial fulfillment is an outcome,
/// not an error: callers get however many units were available.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignmentOutcome {
    pub requested: i64,
    pub assigned: i64,
    pub partial: bool,
    pub order_unit_ids: Vec<Uuid>,
}

/// Two-bucket view of the order book: an order is "completed" when all six
/// flags are set or its stored status is exactly "Completed"; everything
/// else is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum OrderBucket {
    Pending,
    Completed,
}

pub fn bucket_of(order: &order::Model) -> OrderBucket {
    if order.all_flags_set() || order.status == STATUS_COMPLETED {
        OrderBucket::Completed
    } else {
        OrderBucket::Pending
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProviderOrders {
    pub provider: String,
    pub orders: Vec<OrderResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderBuckets {
    pub pending: Vec<ProviderOrders>,
    pub completed: Vec<ProviderOrders>,
}

#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl OrderService {
    pub fn new(db_pool: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates an order in "Pending" with all workflow flags clear.
    #[instrument(skip(self, request))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let now = Utc::now();
        let order_id = Uuid::new_v4();

        let active = OrderActiveModel {
            id: Set(order_id),
            provider: Set(request.provider),
            name: Set(request.name),
            surname: Set(request.surname),
            practitioner_name: Set(request.practitioner_name),
            status: Set(STATUS_PENDING.to_string()),
            opt_in_status: Set(normalize_opt_in(request.opt_in_status)),
            notes: Set(request.notes),
            sent_out: Set(false),
            received_back: Set(false),
            kit_registered: Set(false),
            results_sent: Set(false),
            paid: Set(false),
            invoiced: Set(false),
            ordered_at: Set(request.ordered_at.unwrap_or(now)),
            created_at: Set(now),
            completed_at: Set(None),
            woocommerce_id: Set(request.woocommerce_id),
            fillout_submission_id: Set(request.fillout_submission_id),
            raw_api_data: Set(request.raw_api_data),
            customer_email: Set(request.customer_email),
            customer_phone: Set(request.customer_phone),
            payment_received: Set(false),
            awaiting_payment: Set(false),
            payment_notes: Set(None),
            payment_date: Set(None),
        };

        let model = active
            .insert(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        info!(order_id = %order_id, "Order created");

        if let Err(e) = self.event_sender.send(Event::OrderCreated(order_id)).await {
            warn!(error = %e, order_id = %order_id, "Failed to send order created event");
        }

        Ok(model.into())
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<Option<OrderResponse>, ServiceError> {
        let db = &*self.db_pool;

        let order = OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(order.map(OrderResponse::from))
    }

    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        provider: Option<String>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<OrderResponse>, u64), ServiceError> {
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

        let mut query = OrderEntity::find();
        if let Some(provider) = provider {
            query = query.filter(order::Column::Provider.eq(provider));
        }
        query = query.order_by_desc(order::Column::OrderedAt);

        let paginator = query.paginate(db, limit);
        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::DatabaseError)?;
        let orders = paginator
            .fetch_page(page - 1)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok((orders.into_iter().map(OrderResponse::from).collect(), total))
    }

    /// Applies a partial flag update and re-derives status and completion
    /// timestamp in the same transaction.
    #[instrument(skip(self, update), fields(order_id = %order_id))]
    pub async fn update_workflow_flags(
        &self,
        order_id: Uuid,
        update: WorkflowFlagsUpdate,
    ) -> Result<OrderResponse, ServiceError> {
        if update.is_empty() {
            return Err(ServiceError::ValidationError(
                "At least one workflow flag must be provided".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let order = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let old_status = order.status.clone();

        let mut flags = order.clone();
        if let Some(v) = update.sent_out {
            flags.sent_out = v;
        }
        if let Some(v) = update.received_back {
            flags.received_back = v;
        }
        if let Some(v) = update.kit_registered {
            flags.kit_registered = v;
        }
        if let Some(v) = update.results_sent {
            flags.results_sent = v;
        }
        if let Some(v) = update.paid {
            flags.paid = v;
        }
        if let Some(v) = update.invoiced {
            flags.invoiced = v;
        }

        let now = Utc::now();
        let (new_status, completed_at) = resolve_completion(
            &order.status,
            flags.all_flags_set(),
            order.completed_at,
            now,
        );

        let active = OrderActiveModel {
            id: Unchanged(order_id),
            sent_out: Set(flags.sent_out),
            received_back: Set(flags.received_back),
            kit_registered: Set(flags.kit_registered),
            results_sent: Set(flags.results_sent),
            paid: Set(flags.paid),
            invoiced: Set(flags.invoiced),
            status: Set(new_status.clone()),
            completed_at: Set(completed_at),
            ..Default::default()
        };

        let updated = active
            .update(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        if new_status != old_status {
            if let Err(e) = self
                .event_sender
                .send(Event::OrderStatusChanged {
                    order_id,
                    old_status: old_status.clone(),
                    new_status: new_status.clone(),
                })
                .await
            {
                warn!(error = %e, order_id = %order_id, "Failed to send status change event");
            }

            if is_completed_status(&new_status) && !is_completed_status(&old_status) {
                if let Err(e) = self.event_sender.send(Event::OrderCompleted(order_id)).await {
                    warn!(error = %e, order_id = %order_id, "Failed to send order completed event");
                }
            }
        }

        Ok(updated.into())
    }

    /// Updates editable order metadata. Status and flags are never touched
    /// here; they change only through the workflow-flag path.
    #[instrument(skip(self, request), fields(order_id = %order_id))]
    pub async fn update_details(
        &self,
        order_id: Uuid,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;

        OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let active = OrderActiveModel {
            id: Unchanged(order_id),
            provider: Set(request.provider),
            name: Set(request.name),
            surname: Set(request.surname),
            practitioner_name: Set(request.practitioner_name),
            opt_in_status: Set(normalize_opt_in(request.opt_in_status)),
            notes: Set(request.notes),
            customer_email: Set(request.customer_email),
            customer_phone: Set(request.customer_phone),
            ..Default::default()
        };

        let updated = active.update(db).await.map_err(ServiceError::DatabaseError)?;

        Ok(updated.into())
    }

    /// Claims up to `quantity` in-stock units of the item for this order.
    ///
    /// Available units are claimed oldest first through the same conditional
    /// update as single assignment, so concurrent requests never share a
    /// unit. Fewer available than requested is reported as a partial
    /// outcome, never an error.
    #[instrument(skip(self), fields(order_id = %order_id, item_id = %item_id, quantity = quantity))]
    pub async fn assign_units(
        &self,
        order_id: Uuid,
        item_id: Uuid,
        quantity: i64,
    ) -> Result<AssignmentOutcome, ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::ValidationError(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        StockItemEntity::find_by_id(item_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock item {} not found", item_id)))?;

        let candidates: Vec<Uuid> = StockUnitEntity::find()
            .filter(stock_unit::Column::ItemId.eq(item_id))
            .filter(stock_unit::Column::Status.eq(UnitStatus::InStock.as_str()))
            .order_by_asc(stock_unit::Column::LastUpdate)
            .limit(quantity as u64)
            .select_only()
            .column(stock_unit::Column::Id)
            .into_tuple()
            .all(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let now = Utc::now();
        let mut order_unit_ids = Vec::with_capacity(candidates.len());

        for unit_id in candidates {
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

            // Lost the race to a concurrent claim; skip this unit.
            if claimed.rows_affected == 0 {
                continue;
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

            order_unit_ids.push(order_unit.id);
        }

        let assigned = order_unit_ids.len() as i64;
        adjust_current_stock(&txn, item_id, -(assigned as i32)).await?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        let partial = assigned < quantity;
        if partial {
            warn!(
                order_id = %order_id,
                item_id = %item_id,
                requested = quantity,
                assigned = assigned,
                "Partial fulfillment"
            );
            if let Err(e) = self
                .event_sender
                .send(Event::PartialAssignmentWarning {
                    order_id,
                    item_id,
                    requested: quantity,
                    assigned,
                })
                .await
            {
                warn!(error = %e, "Failed to send partial assignment event");
            }
        }

        Ok(AssignmentOutcome {
            requested: quantity,
            assigned,
            partial,
            order_unit_ids,
        })
    }

    /// Units currently assigned to the order, with their barcodes.
    #[instrument(skip(self))]
    pub async fn order_units(&self, order_id: Uuid) -> Result<Vec<AssignedUnit>, ServiceError> {
        let db = &*self.db_pool;

        OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let pairs = OrderUnitEntity::find()
            .filter(order_unit::Column::OrderId.eq(order_id))
            .find_also_related(StockUnitEntity)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let mut out = Vec::with_capacity(pairs.len());
        for (ou, unit) in pairs {
            let unit = unit.ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "Order unit {} references missing unit {}",
                    ou.id, ou.unit_id
                ))
            })?;
            out.push(AssignedUnit {
                order_unit_id: ou.id,
                unit_id: unit.id,
                barcode: unit.barcode,
                status: unit.status,
                assigned_at: ou.assigned_at,
            });
        }

        out.sort_by_key(|u| u.assigned_at);
        Ok(out)
    }

    /// Adds a line item (SKU + quantity) to the order.
    #[instrument(skip(self, request), fields(order_id = %order_id))]
    pub async fn add_order_item(
        &self,
        order_id: Uuid,
        request: AddOrderItemRequest,
    ) -> Result<OrderItemResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;

        OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let model = OrderItemActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            sku: Set(request.sku.trim().to_string()),
            qty: Set(request.qty),
        }
        .insert(db)
        .await
        .map_err(ServiceError::DatabaseError)?;

        Ok(model.into())
    }

    /// Deletes an order, releasing every assigned unit back to stock and
    /// removing its assignment and line-item records, all in one transaction.
    #[instrument(skip(self))]
    pub async fn delete_order(&self, order_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let unit_ids: Vec<Uuid> = OrderUnitEntity::find()
            .filter(order_unit::Column::OrderId.eq(order_id))
            .select_only()
            .column(order_unit::Column::UnitId)
            .into_tuple()
            .all(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if !unit_ids.is_empty() {
            let units = StockUnitEntity::find()
                .filter(stock_unit::Column::Id.is_in(unit_ids.clone()))
                .all(&txn)
                .await
                .map_err(ServiceError::DatabaseError)?;

            StockUnitEntity::update_many()
                .col_expr(
                    stock_unit::Column::Status,
                    Expr::value(UnitStatus::InStock.as_str()),
                )
                .col_expr(stock_unit::Column::LastUpdate, Expr::value(Utc::now()))
                .filter(stock_unit::Column::Id.is_in(unit_ids))
                .filter(stock_unit::Column::Status.eq(UnitStatus::Assigned.as_str()))
                .exec(&txn)
                .await
                .map_err(ServiceError::DatabaseError)?;

            let mut released_per_item: BTreeMap<Uuid, i32> = BTreeMap::new();
            for unit in &units {
                if unit.unit_status() == Some(UnitStatus::Assigned) {
                    *released_per_item.entry(unit.item_id).or_insert(0) += 1;
                }
            }
            for (item_id, count) in released_per_item {
                adjust_current_stock(&txn, item_id, count).await?;
            }
        }

        OrderUnitEntity::delete_many()
            .filter(order_unit::Column::OrderId.eq(order_id))
            .exec(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        OrderItemEntity::delete_many()
            .filter(order_item::Column::OrderId.eq(order_id))
            .exec(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        OrderEntity::delete_by_id(order_id)
            .exec(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(order_id = %order_id, "Order deleted, assigned units released");

        if let Err(e) = self.event_sender.send(Event::OrderDeleted(order_id)).await {
            warn!(error = %e, order_id = %order_id, "Failed to send order deleted event");
        }

        Ok(())
    }

    /// The dashboard view: all orders split into pending/completed buckets
    /// and grouped by provider within each bucket.
    #[instrument(skip(self))]
    pub async fn order_buckets(&self) -> Result<OrderBuckets, ServiceError> {
        let db = &*self.db_pool;

        let orders = OrderEntity::find()
            .order_by_desc(order::Column::OrderedAt)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let mut pending: BTreeMap<String, Vec<OrderResponse>> = BTreeMap::new();
        let mut completed: BTreeMap<String, Vec<OrderResponse>> = BTreeMap::new();

        for order in orders {
            let provider = order
                .provider
                .clone()
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| "Unassigned".to_string());
            let bucket = bucket_of(&order);
            let target = match bucket {
                OrderBucket::Pending => &mut pending,
                OrderBucket::Completed => &mut completed,
            };
            target.entry(provider).or_default().push(order.into());
        }

        let collect = |map: BTreeMap<String, Vec<OrderResponse>>| {
            map.into_iter()
                .map(|(provider, orders)| ProviderOrders { provider, orders })
                .collect()
        };

        Ok(OrderBuckets {
            pending: collect(pending),
            completed: collect(completed),
        })
    }
}
