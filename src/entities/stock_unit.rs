use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a serialized unit.
///
/// `Used` is a de-facto terminal state: it is only reachable through the
/// external status-update path and the ledger defines no transition out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitStatus {
    InStock,
    Assigned,
    PromotionalUse,
    Used,
}

impl UnitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitStatus::InStock => "In Stock",
            UnitStatus::Assigned => "Assigned",
            UnitStatus::PromotionalUse => "Promotional Use",
            UnitStatus::Used => "Used",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "In Stock" => Some(UnitStatus::InStock),
            "Assigned" => Some(UnitStatus::Assigned),
            "Promotional Use" => Some(UnitStatus::PromotionalUse),
            "Used" => Some(UnitStatus::Used),
            _ => None,
        }
    }
}

/// One physical, barcode-identified inventory unit.
///
/// Barcodes are deliberately NOT unique at the schema level; duplicates are a
/// permitted data shape. Deployments that need uniqueness enable the
/// `strict_barcode_uniqueness` config flag, enforced by the ledger service.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_units")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub item_id: Uuid,
    pub barcode: String,
    pub batch_number: Option<String>,
    pub status: String, // stored as string, converted through UnitStatus
    pub last_update: DateTime<Utc>,

    // Promotional sign-out sub-record
    pub signed_out_by: Option<String>,
    pub signed_out_date: Option<DateTime<Utc>>,
    pub promotional_notes: Option<String>,

    // Return sub-record
    pub returned_by: Option<String>,
    pub returned_date: Option<DateTime<Utc>>,
    pub return_reason: Option<String>,
}

impl Model {
    pub fn unit_status(&self) -> Option<UnitStatus> {
        UnitStatus::parse(&self.status)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::stock_item::Entity",
        from = "Column::ItemId",
        to = "super::stock_item::Column::Id"
    )]
    StockItem,
    #[sea_orm(has_many = "super::order_unit::Entity")]
    OrderUnits,
}

impl Related<super::stock_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockItem.def()
    }
}

impl Related<super::order_unit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderUnits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            UnitStatus::InStock,
            UnitStatus::Assigned,
            UnitStatus::PromotionalUse,
            UnitStatus::Used,
        ] {
            assert_eq!(UnitStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn unknown_status_string_is_rejected() {
        assert_eq!(UnitStatus::parse("Misplaced"), None);
        assert_eq!(UnitStatus::parse("in stock"), None);
    }
}
