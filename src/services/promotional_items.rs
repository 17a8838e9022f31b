use crate::{
    entities::promotional_item::{
        self, ActiveModel as PromotionalItemActiveModel, Entity as PromotionalItemEntity,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait, Unchanged,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePromotionalItemRequest {
    #[validate(length(min = 1, max = 200, message = "Item name is required"))]
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i32,
    pub location: Option<String>,
    pub condition: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct SignOutRequest {
    #[validate(length(min = 1, message = "Signer name is required"))]
    pub signed_out_by: String,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    pub expected_return_date: Option<NaiveDate>,
    #[validate(length(min = 1, message = "Sign-out note is required"))]
    pub notes: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReturnRequest {
    #[validate(length(min = 1, message = "Returner name is required"))]
    pub returned_by: String,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    #[validate(length(min = 1, message = "Return note is required"))]
    pub notes: String,
    pub condition: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PromotionalItemResponse {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub available_quantity: i32,
    pub location: Option<String>,
    pub condition: Option<String>,
    pub signed_out: bool,
    pub signed_out_by: Option<String>,
    pub expected_return_date: Option<NaiveDate>,
    pub sign_out_notes: Option<String>,
    pub last_returned_by: Option<String>,
    pub return_notes: Option<String>,
}

impl From<promotional_item::Model> for PromotionalItemResponse {
    fn from(model: promotional_item::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            category: model.category,
            description: model.description,
            quantity: model.quantity,
            available_quantity: model.available_quantity,
            location: model.location,
            condition: model.condition,
            signed_out: model.signed_out,
            signed_out_by: model.signed_out_by,
            expected_return_date: model.expected_return_date,
            sign_out_notes: model.sign_out_notes,
            last_returned_by: model.last_returned_by,
            return_notes: model.return_notes,
        }
    }
}

/// Clamped counter arithmetic for sign-outs and returns.
///
/// Returns are clamped so `available` never exceeds `total`; extra returned
/// quantity is silently absorbed (over-returns are a data-entry reality, not
/// an error).
pub fn apply_return(total: i32, available: i32, returned: i32) -> i32 {
    (available + returned).min(total).max(0)
}

/// Quantity-counter inventory for reusable promotional assets.
#[derive(Clone)]
pub struct PromotionalItemService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl PromotionalItemService {
    pub fn new(db_pool: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_item(
        &self,
        request: CreatePromotionalItemRequest,
    ) -> Result<PromotionalItemResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let now = Utc::now();

        let active = PromotionalItemActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            category: Set(request.category.unwrap_or_else(|| "General".to_string())),
            description: Set(request.description),
            quantity: Set(request.quantity),
            available_quantity: Set(request.quantity),
            location: Set(request.location),
            condition: Set(request.condition),
            signed_out: Set(false),
            signed_out_by: Set(None),
            signed_out_date: Set(None),
            expected_return_date: Set(None),
            sign_out_notes: Set(None),
            last_returned_date: Set(None),
            last_returned_by: Set(None),
            return_notes: Set(None),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        };

        let model = active
            .insert(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        info!(item_id = %model.id, "Promotional item created");
        Ok(model.into())
    }

    #[instrument(skip(self))]
    pub async fn get_item(
        &self,
        item_id: Uuid,
    ) -> Result<Option<PromotionalItemResponse>, ServiceError> {
        let db = &*self.db_pool;

        let item = PromotionalItemEntity::find_by_id(item_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(item.map(PromotionalItemResponse::from))
    }

    #[instrument(skip(self))]
    pub async fn list_items(
        &self,
        category: Option<String>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<PromotionalItemResponse>, u64), ServiceError> {
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

        let mut query = PromotionalItemEntity::find();
        if let Some(category) = category {
            query = query.filter(promotional_item::Column::Category.eq(category));
        }
        query = query.order_by_asc(promotional_item::Column::Name);

        let paginator = query.paginate(db, limit);
        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::DatabaseError)?;
        let items = paginator
            .fetch_page(page - 1)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok((
            items.into_iter().map(PromotionalItemResponse::from).collect(),
            total,
        ))
    }

    #[instrument(skip(self))]
    pub async fn delete_item(&self, item_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let item = PromotionalItemEntity::find_by_id(item_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Promotional item {} not found", item_id))
            })?;

        if item.available_quantity < item.quantity {
            return Err(ServiceError::InvalidOperation(format!(
                "Promotional item '{}' has {} unit(s) signed out; return them first",
                item.name,
                item.quantity - item.available_quantity
            )));
        }

        PromotionalItemEntity::delete_by_id(item_id)
            .exec(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        info!(item_id = %item_id, "Promotional item deleted");
        Ok(())
    }

    /// Signs out `quantity` units. The decrement is conditional on enough
    /// availability, so concurrent sign-outs cannot drive the counter
    /// negative.
    #[instrument(skip(self, request), fields(item_id = %item_id))]
    pub async fn sign_out(
        &self,
        item_id: Uuid,
        request: SignOutRequest,
    ) -> Result<PromotionalItemResponse, ServiceError> {
        request.validate()?;

        let signer = request.signed_out_by.trim();
        if signer.is_empty() {
            return Err(ServiceError::ValidationError(
                "Signer name is required".to_string(),
            ));
        }
        let note = request.notes.trim();
        if note.is_empty() {
            return Err(ServiceError::ValidationError(
                "Sign-out note is required".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let item = PromotionalItemEntity::find_by_id(item_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Promotional item {} not found", item_id))
            })?;

        let now = Utc::now();

        let updated = PromotionalItemEntity::update_many()
            .col_expr(
                promotional_item::Column::AvailableQuantity,
                Expr::col(promotional_item::Column::AvailableQuantity).sub(request.quantity),
            )
            .col_expr(promotional_item::Column::SignedOut, Expr::value(true))
            .col_expr(
                promotional_item::Column::SignedOutBy,
                Expr::value(Some(signer.to_string())),
            )
            .col_expr(
                promotional_item::Column::SignedOutDate,
                Expr::value(Some(now)),
            )
            .col_expr(
                promotional_item::Column::ExpectedReturnDate,
                Expr::value(request.expected_return_date),
            )
            .col_expr(
                promotional_item::Column::SignOutNotes,
                Expr::value(Some(note.to_string())),
            )
            .col_expr(promotional_item::Column::UpdatedAt, Expr::value(Some(now)))
            .filter(promotional_item::Column::Id.eq(item_id))
            .filter(promotional_item::Column::AvailableQuantity.gte(request.quantity))
            .exec(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if updated.rows_affected == 0 {
            return Err(ServiceError::NoAvailableUnits {
                requested: request.quantity as i64,
                available: item.available_quantity as i64,
            });
        }

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        if let Err(e) = self
            .event_sender
            .send(Event::PromotionalItemSignedOut(item_id))
            .await
        {
            warn!(error = %e, item_id = %item_id, "Failed to send promotional sign-out event");
        }

        self.get_item(item_id).await?.ok_or_else(|| {
            ServiceError::InternalError(format!("Promotional item {} vanished", item_id))
        })
    }

    /// Returns `quantity` units. Availability is clamped to the total so
    /// over-returns cannot break the counter invariant.
    #[instrument(skip(self, request), fields(item_id = %item_id))]
    pub async fn return_item(
        &self,
        item_id: Uuid,
        request: ReturnRequest,
    ) -> Result<PromotionalItemResponse, ServiceError> {
        request.validate()?;

        let returner = request.returned_by.trim();
        if returner.is_empty() {
            return Err(ServiceError::ValidationError(
                "Returner name is required".to_string(),
            ));
        }
        let note = request.notes.trim();
        if note.is_empty() {
            return Err(ServiceError::ValidationError(
                "Return note is required".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let item = PromotionalItemEntity::find_by_id(item_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Promotional item {} not found", item_id))
            })?;

        let now = Utc::now();
        let new_available =
            apply_return(item.quantity, item.available_quantity, request.quantity);
        let fully_returned = new_available >= item.quantity;

        // A full return closes out the sign-out entirely; a partial return
        // keeps the sign-out record for the units still in the field.
        let active = PromotionalItemActiveModel {
            id: Unchanged(item_id),
            available_quantity: Set(new_available),
            signed_out: Set(!fully_returned),
            last_returned_date: Set(Some(now)),
            last_returned_by: Set(Some(returner.to_string())),
            return_notes: Set(Some(note.to_string())),
            condition: Set(request.condition.clone().or(item.condition.clone())),
            signed_out_by: Set(if fully_returned {
                None
            } else {
                item.signed_out_by.clone()
            }),
            signed_out_date: Set(if fully_returned {
                None
            } else {
                item.signed_out_date
            }),
            sign_out_notes: Set(if fully_returned {
                None
            } else {
                item.sign_out_notes.clone()
            }),
            expected_return_date: Set(if fully_returned {
                None
            } else {
                item.expected_return_date
            }),
            updated_at: Set(Some(now)),
            ..Default::default()
        };

        let updated = active
            .update(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        if let Err(e) = self
            .event_sender
            .send(Event::PromotionalItemReturned(item_id))
            .await
        {
            warn!(error = %e, item_id = %item_id, "Failed to send promotional return event");
        }

        Ok(updated.into())
    }
}
