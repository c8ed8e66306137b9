//! Orders, order lines, status lookups and the append-only status history.

use chrono::NaiveDateTime;
use menuhub_types::{
    Address, Id, MenuItem, NewOrder, NewOrderMenuItem, Order, OrderMenuItem, OrderStatus,
    OrderStatusRelation, Price, Restaurant, StatusCatalog, StatusLabel, User,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::location::get_address;
use crate::menu::{get_restaurant, qualified, MENU_ITEM_COLUMNS};
use crate::user::get_user;
use crate::{expect_one, now, StoreError};

const ORDER_COLUMNS: &str = "id, order_date, estimated_delivery_time, actual_delivery_time, \
     status_id, price, address_id, user_id, restaurant_id";
const LINE_COLUMNS: &str = "id, order_id, menu_item_id, quantity";
const EVENT_COLUMNS: &str = "id, order_id, status_catalog_id, created_at";

fn map_order(row: &Row<'_>) -> rusqlite::Result<Order> {
    Ok(Order {
        id: row.get(0)?,
        order_date: row.get(1)?,
        estimated_delivery_time: row.get(2)?,
        actual_delivery_time: row.get(3)?,
        status_id: row.get(4)?,
        price: Price::from_minor_units(row.get(5)?),
        address_id: row.get(6)?,
        user_id: row.get(7)?,
        restaurant_id: row.get(8)?,
    })
}

fn map_line(row: &Row<'_>) -> rusqlite::Result<OrderMenuItem> {
    Ok(OrderMenuItem {
        id: row.get(0)?,
        order_id: row.get(1)?,
        menu_item_id: row.get(2)?,
        quantity: row.get(3)?,
    })
}

fn map_event(row: &Row<'_>) -> rusqlite::Result<OrderStatusRelation> {
    Ok(OrderStatusRelation {
        id: row.get(0)?,
        order_id: row.get(1)?,
        status_catalog_id: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// An order line together with the menu item it orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub line: OrderMenuItem,
    pub menu_item: MenuItem,
}

impl OrderLine {
    /// Unit price times quantity, `None` on overflow.
    pub fn total(&self) -> Option<Price> {
        self.line.line_total(self.menu_item.price)
    }
}

/// One entry of an order's status history with its catalog label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEvent {
    pub event: OrderStatusRelation,
    pub status: StatusCatalog,
}

/// An order with every association eager-loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDetails {
    pub order: Order,
    pub user: User,
    pub address: Address,
    pub restaurant: Restaurant,
    pub status: OrderStatus,
    pub lines: Vec<OrderLine>,
    /// Oldest first.
    pub history: Vec<StatusEvent>,
}

impl OrderDetails {
    /// Sum of the line totals at current menu prices.
    pub fn total(&self) -> Result<Price, StoreError> {
        let line_totals = self
            .lines
            .iter()
            .map(OrderLine::total)
            .collect::<Option<Vec<_>>>()
            .ok_or(StoreError::PriceOverflow)?;
        Price::checked_sum(line_totals).ok_or(StoreError::PriceOverflow)
    }

    /// The most recent status event, if any was recorded.
    pub fn latest_event(&self) -> Option<&StatusEvent> {
        self.history.last()
    }
}

// --- Status lookups ---

pub fn insert_order_status(conn: &Connection, status: &str) -> Result<OrderStatus, StoreError> {
    let row = conn.query_row(
        "INSERT INTO order_status (status) VALUES (?1) RETURNING id, status",
        [status],
        |row| {
            Ok(OrderStatus {
                id: row.get(0)?,
                status: row.get(1)?,
            })
        },
    )?;
    Ok(row)
}

pub fn get_order_status(conn: &Connection, id: Id) -> Result<Option<OrderStatus>, StoreError> {
    let row = conn
        .query_row(
            "SELECT id, status FROM order_status WHERE id = ?1",
            [id],
            |row| {
                Ok(OrderStatus {
                    id: row.get(0)?,
                    status: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

/// Looks up the seeded `order_status` row for a label.
pub fn order_status_by_label(
    conn: &Connection,
    label: StatusLabel,
) -> Result<Option<OrderStatus>, StoreError> {
    let row = conn
        .query_row(
            "SELECT id, status FROM order_status WHERE status = ?1 ORDER BY id LIMIT 1",
            [label.as_str()],
            |row| {
                Ok(OrderStatus {
                    id: row.get(0)?,
                    status: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

/// Deletes an `order_status` row. Fails with a foreign-key violation while
/// orders point at it.
pub fn delete_order_status(conn: &Connection, id: Id) -> Result<(), StoreError> {
    let changed = conn.execute("DELETE FROM order_status WHERE id = ?1", [id])?;
    expect_one(changed, "order_status", id)
}

fn map_catalog(row: &Row<'_>) -> rusqlite::Result<StatusCatalog> {
    Ok(StatusCatalog {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

pub fn insert_status_catalog(conn: &Connection, name: &str) -> Result<StatusCatalog, StoreError> {
    let row = conn.query_row(
        "INSERT INTO status_catalog (name) VALUES (?1) RETURNING id, name",
        [name],
        map_catalog,
    )?;
    Ok(row)
}

pub fn get_status_catalog(
    conn: &Connection,
    id: Id,
) -> Result<Option<StatusCatalog>, StoreError> {
    let row = conn
        .query_row(
            "SELECT id, name FROM status_catalog WHERE id = ?1",
            [id],
            map_catalog,
        )
        .optional()?;
    Ok(row)
}

/// Looks up the seeded `status_catalog` row for a label.
pub fn status_catalog_by_label(
    conn: &Connection,
    label: StatusLabel,
) -> Result<Option<StatusCatalog>, StoreError> {
    let row = conn
        .query_row(
            "SELECT id, name FROM status_catalog WHERE name = ?1 ORDER BY id LIMIT 1",
            [label.as_str()],
            map_catalog,
        )
        .optional()?;
    Ok(row)
}

/// Deletes a `status_catalog` row. Fails with a foreign-key violation while
/// any status event refers to it.
pub fn delete_status_catalog(conn: &Connection, id: Id) -> Result<(), StoreError> {
    let changed = conn.execute("DELETE FROM status_catalog WHERE id = ?1", [id])?;
    expect_one(changed, "status_catalog", id)
}

// --- Orders ---

pub fn insert_order(conn: &Connection, new: &NewOrder) -> Result<Order, StoreError> {
    let order = conn.query_row(
        &format!(
            "INSERT INTO orders (
                 order_date, estimated_delivery_time, status_id, price,
                 address_id, user_id, restaurant_id
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING {ORDER_COLUMNS}"
        ),
        params![
            new.order_date,
            new.estimated_delivery_time,
            new.status_id,
            new.price.minor_units(),
            new.address_id,
            new.user_id,
            new.restaurant_id
        ],
        map_order,
    )?;
    tracing::debug!(order_id = order.id, user_id = order.user_id, "order created");
    Ok(order)
}

pub fn get_order(conn: &Connection, id: Id) -> Result<Option<Order>, StoreError> {
    let order = conn
        .query_row(
            &format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"),
            [id],
            map_order,
        )
        .optional()?;
    Ok(order)
}

fn update_order(
    conn: &Connection,
    id: Id,
    assignment: &str,
    value: &dyn rusqlite::ToSql,
) -> Result<Order, StoreError> {
    let order = conn
        .query_row(
            &format!(
                "UPDATE orders SET {assignment} = ?2 WHERE id = ?1 RETURNING {ORDER_COLUMNS}"
            ),
            params![id, value],
            map_order,
        )
        .optional()?;
    order.ok_or(StoreError::NotFound { entity: "orders", id })
}

/// Points an order at a different `order_status` row.
pub fn set_order_status(
    conn: &Connection,
    order_id: Id,
    status_id: Id,
) -> Result<Order, StoreError> {
    update_order(conn, order_id, "status_id", &status_id)
}

pub fn record_delivery(
    conn: &Connection,
    order_id: Id,
    delivered_at: NaiveDateTime,
) -> Result<Order, StoreError> {
    update_order(conn, order_id, "actual_delivery_time", &delivered_at)
}

pub fn delete_order(conn: &Connection, id: Id) -> Result<(), StoreError> {
    let changed = conn.execute("DELETE FROM orders WHERE id = ?1", [id])?;
    expect_one(changed, "orders", id)
}

/// A user's orders, newest first.
pub fn orders_for_user(conn: &Connection, user_id: Id) -> Result<Vec<Order>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ?1 ORDER BY order_date DESC, id DESC"
    ))?;
    let orders = stmt
        .query_map([user_id], map_order)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(orders)
}

// --- Order lines ---

pub fn add_order_line(
    conn: &Connection,
    new: &NewOrderMenuItem,
) -> Result<OrderMenuItem, StoreError> {
    let line = conn.query_row(
        &format!(
            "INSERT INTO order_menu_items (order_id, menu_item_id, quantity)
             VALUES (?1, ?2, ?3)
             RETURNING {LINE_COLUMNS}"
        ),
        params![new.order_id, new.menu_item_id, new.quantity],
        map_line,
    )?;
    Ok(line)
}

pub fn get_order_line(conn: &Connection, id: Id) -> Result<Option<OrderMenuItem>, StoreError> {
    let line = conn
        .query_row(
            &format!("SELECT {LINE_COLUMNS} FROM order_menu_items WHERE id = ?1"),
            [id],
            map_line,
        )
        .optional()?;
    Ok(line)
}

pub fn delete_order_line(conn: &Connection, id: Id) -> Result<(), StoreError> {
    let changed = conn.execute("DELETE FROM order_menu_items WHERE id = ?1", [id])?;
    expect_one(changed, "order_menu_items", id)
}

/// The lines of an order joined to their menu items, in insertion order.
pub fn order_lines(conn: &Connection, order_id: Id) -> Result<Vec<OrderLine>, StoreError> {
    let line_columns = qualified("l", LINE_COLUMNS);
    let item_columns = qualified("m", MENU_ITEM_COLUMNS);
    let mut stmt = conn.prepare(&format!(
        "SELECT {line_columns}, {item_columns} FROM order_menu_items l
         JOIN menu_item m ON m.id = l.menu_item_id
         WHERE l.order_id = ?1
         ORDER BY l.id"
    ))?;
    let lines = stmt
        .query_map([order_id], |row| {
            let line = map_line(row)?;
            let menu_item = MenuItem {
                id: row.get(4)?,
                restaurant_id: row.get(5)?,
                category_id: row.get(6)?,
                name: row.get(7)?,
                ingredients: row.get(8)?,
                price: Price::from_minor_units(row.get(9)?),
                updated_at: row.get(10)?,
                created_at: row.get(11)?,
            };
            Ok(OrderLine { line, menu_item })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lines)
}

// --- Status history ---

/// Appends an event to an order's status history. This is the only write
/// path for `order_status_relation`.
pub fn append_status_event(
    conn: &Connection,
    order_id: Id,
    status_catalog_id: Id,
) -> Result<OrderStatusRelation, StoreError> {
    let event = conn.query_row(
        &format!(
            "INSERT INTO order_status_relation (order_id, status_catalog_id, created_at)
             VALUES (?1, ?2, ?3)
             RETURNING {EVENT_COLUMNS}"
        ),
        params![order_id, status_catalog_id, now()],
        map_event,
    )?;
    tracing::debug!(order_id, status_catalog_id, event_id = event.id, "status event appended");
    Ok(event)
}

pub fn get_status_event(
    conn: &Connection,
    id: Id,
) -> Result<Option<OrderStatusRelation>, StoreError> {
    let event = conn
        .query_row(
            &format!("SELECT {EVENT_COLUMNS} FROM order_status_relation WHERE id = ?1"),
            [id],
            map_event,
        )
        .optional()?;
    Ok(event)
}

/// An order's status history, oldest first.
pub fn status_history(conn: &Connection, order_id: Id) -> Result<Vec<StatusEvent>, StoreError> {
    let event_columns = qualified("e", EVENT_COLUMNS);
    let mut stmt = conn.prepare(&format!(
        "SELECT {event_columns}, s.id, s.name FROM order_status_relation e
         JOIN status_catalog s ON s.id = e.status_catalog_id
         WHERE e.order_id = ?1
         ORDER BY e.created_at, e.id"
    ))?;
    let history = stmt
        .query_map([order_id], |row| {
            Ok(StatusEvent {
                event: map_event(row)?,
                status: StatusCatalog {
                    id: row.get(4)?,
                    name: row.get(5)?,
                },
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(history)
}

// --- Eager load ---

/// Loads an order with its user, address, restaurant, status, lines and
/// status history.
pub fn order_details(conn: &Connection, order_id: Id) -> Result<OrderDetails, StoreError> {
    let order = get_order(conn, order_id)?.ok_or(StoreError::NotFound {
        entity: "orders",
        id: order_id,
    })?;
    let user = get_user(conn, order.user_id)?.ok_or(StoreError::NotFound {
        entity: "user",
        id: order.user_id,
    })?;
    let address = get_address(conn, order.address_id)?.ok_or(StoreError::NotFound {
        entity: "address",
        id: order.address_id,
    })?;
    let restaurant = get_restaurant(conn, order.restaurant_id)?.ok_or(StoreError::NotFound {
        entity: "restaurant",
        id: order.restaurant_id,
    })?;
    let status = get_order_status(conn, order.status_id)?.ok_or(StoreError::NotFound {
        entity: "order_status",
        id: order.status_id,
    })?;
    let lines = order_lines(conn, order_id)?;
    let history = status_history(conn, order_id)?;

    Ok(OrderDetails {
        order,
        user,
        address,
        restaurant,
        status,
        lines,
        history,
    })
}
