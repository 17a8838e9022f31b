pub mod order;
pub mod order_item;
pub mod order_unit;
pub mod promotional_item;
pub mod stock_item;
pub mod stock_unit;
