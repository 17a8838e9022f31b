use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A customer/practitioner request.
///
/// `status` is a cached derivation of the six workflow flags: it is forced to
/// "Completed" exactly when all six flags are true and reverts to "Pending"
/// when any flag is cleared. It is never accepted as free-form external input.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub provider: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub practitioner_name: Option<String>,
    pub status: String,
    /// Tri-state consent: "Opted In", "Opted Out", or NULL for pending.
    /// The literal string "Pending" is a data bug normalized to NULL on write.
    pub opt_in_status: Option<String>,
    pub notes: Option<String>,

    // Workflow flags
    pub sent_out: bool,
    pub received_back: bool,
    pub kit_registered: bool,
    pub results_sent: bool,
    pub paid: bool,
    pub invoiced: bool,

    pub ordered_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,

    // External-ingest fields (e-commerce / form submissions)
    pub woocommerce_id: Option<i64>,
    pub fillout_submission_id: Option<String>,
    pub raw_api_data: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,

    // Payment tracking
    pub payment_received: bool,
    pub awaiting_payment: bool,
    pub payment_notes: Option<String>,
    pub payment_date: Option<DateTime<Utc>>,
}

impl Model {
    /// True when every workflow flag is set.
    pub fn all_flags_set(&self) -> bool {
        self.sent_out
            && self.received_back
            && self.kit_registered
            && self.results_sent
            && self.paid
            && self.invoiced
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_unit::Entity")]
    OrderUnits,
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::order_unit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderUnits.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
