//! The item store: stocked products with a cost price, sell price, and
//! quantity on hand.
//!
//! Item stock is owned by the transaction processor during transaction
//! application; the functions here cover creation, lookup, and the listing
//! and stock-capital queries the reporting layer consumes.

mod core;

pub use core::{
    Item, ItemBuilder, create_item, create_item_table, get_item, list_items, map_item_row,
    stock_capital,
};

pub(crate) use core::set_item_stock;
