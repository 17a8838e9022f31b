pub mod orders;
pub mod promotional_items;
pub mod stock_items;
pub mod stock_units;
