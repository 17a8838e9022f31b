use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A reusable, non-serialized promotional asset (gift, banner, gazebo)
/// tracked by quantity counters rather than per-unit state.
///
/// Invariant: 0 <= available_quantity <= quantity after every operation.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "promotional_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[validate(length(min = 1, max = 200, message = "Item name must be 1-200 characters"))]
    pub name: String,

    pub category: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub available_quantity: i32,
    pub location: Option<String>,
    pub condition: Option<String>,

    // Sign-out tracking
    pub signed_out: bool,
    pub signed_out_by: Option<String>,
    pub signed_out_date: Option<DateTime<Utc>>,
    pub expected_return_date: Option<NaiveDate>,
    pub sign_out_notes: Option<String>,

    // Return tracking
    pub last_returned_date: Option<DateTime<Utc>>,
    pub last_returned_by: Option<String>,
    pub return_notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
