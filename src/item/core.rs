//! Defines the core data model and database queries for items.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::ItemId};

// ============================================================================
// MODELS
// ============================================================================

/// A stocked product with cost/sell price and current quantity on hand.
///
/// To create a new `Item`, use [Item::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// The ID of the item.
    pub id: ItemId,
    /// The display name of the item.
    pub name: String,
    /// What one unit costs to purchase, in the smallest currency unit.
    pub cost_price: i64,
    /// What one unit sells for, in the smallest currency unit.
    pub sell_price: i64,
    /// The quantity currently on hand. Never negative.
    pub stock: i64,
}

impl Item {
    /// Create a new item.
    ///
    /// Shortcut for [ItemBuilder] for discoverability.
    pub fn build(name: &str) -> ItemBuilder {
        ItemBuilder {
            name: name.to_owned(),
            cost_price: 0,
            sell_price: 0,
            stock: 0,
        }
    }
}

/// A builder for creating [Item] instances.
///
/// Prices and the opening stock count default to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemBuilder {
    /// The display name of the item.
    pub name: String,
    /// What one unit costs to purchase.
    pub cost_price: i64,
    /// What one unit sells for.
    pub sell_price: i64,
    /// The opening stock count.
    pub stock: i64,
}

impl ItemBuilder {
    /// Set the cost price for the item.
    pub fn cost_price(mut self, cost_price: i64) -> Self {
        self.cost_price = cost_price;
        self
    }

    /// Set the sell price for the item.
    pub fn sell_price(mut self, sell_price: i64) -> Self {
        self.sell_price = sell_price;
        self
    }

    /// Set the opening stock count for the item.
    pub fn stock(mut self, stock: i64) -> Self {
        self.stock = stock;
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new item in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::NegativeItemValue] if either price or the opening stock is
///   negative,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_item(builder: ItemBuilder, connection: &Connection) -> Result<Item, Error> {
    if builder.cost_price < 0 || builder.sell_price < 0 || builder.stock < 0 {
        return Err(Error::NegativeItemValue);
    }

    let item = connection
        .prepare(
            "INSERT INTO item (name, cost_price, sell_price, stock)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING id, name, cost_price, sell_price, stock",
        )?
        .query_row(
            (
                builder.name,
                builder.cost_price,
                builder.sell_price,
                builder.stock,
            ),
            map_item_row,
        )?;

    Ok(item)
}

/// Retrieve an item from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid item,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_item(id: ItemId, connection: &Connection) -> Result<Item, Error> {
    let item = connection
        .prepare("SELECT id, name, cost_price, sell_price, stock FROM item WHERE id = :id")?
        .query_row(&[(":id", &id)], map_item_row)?;

    Ok(item)
}

/// List items sorted by name, optionally filtered by a case-insensitive
/// substring match on the name.
///
/// `page` is one-based; `limit` is the page size. Pass the values through
/// [crate::PaginationConfig] clamping first when they come from a request.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn list_items(
    name_query: Option<&str>,
    page: u64,
    limit: u64,
    connection: &Connection,
) -> Result<Vec<Item>, Error> {
    let offset = (page.saturating_sub(1)) * limit;

    connection
        .prepare(
            "SELECT id, name, cost_price, sell_price, stock FROM item \
            WHERE (?1 IS NULL OR name LIKE '%' || ?1 || '%') \
            ORDER BY name ASC, id ASC \
            LIMIT ?2 OFFSET ?3",
        )?
        .query_map((name_query, limit as i64, offset as i64), map_item_row)?
        .map(|maybe_item| maybe_item.map_err(Error::SqlError))
        .collect()
}

/// Get the capital currently tied up in stock: the sum over all items of
/// `stock x cost_price`.
///
/// This is a point-in-time snapshot; it is deliberately not date-filtered.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn stock_capital(connection: &Connection) -> Result<i64, Error> {
    let total = connection
        .prepare("SELECT COALESCE(SUM(stock * cost_price), 0) FROM item")?
        .query_row([], |row| row.get(0))?;

    Ok(total)
}

/// Overwrite an item's stock count.
///
/// Only the transaction processor may call this, from inside its SQL
/// transaction; the new value has already been checked to be non-negative.
pub(crate) fn set_item_stock(
    id: ItemId,
    stock: i64,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected =
        connection.execute("UPDATE item SET stock = ?1 WHERE id = ?2", (stock, id))?;

    if rows_affected == 0 {
        return Err(Error::ItemNotFound(id));
    }

    Ok(())
}

/// Map a database row to an [Item].
pub fn map_item_row(row: &Row) -> Result<Item, rusqlite::Error> {
    let id = row.get(0)?;
    let name = row.get(1)?;
    let cost_price = row.get(2)?;
    let sell_price = row.get(3)?;
    let stock = row.get(4)?;

    Ok(Item {
        id,
        name,
        cost_price,
        sell_price,
        stock,
    })
}

/// Create the item table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_item_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS item (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                cost_price INTEGER NOT NULL,
                sell_price INTEGER NOT NULL,
                stock INTEGER NOT NULL
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_item_name ON item(name);",
        (),
    )?;

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
