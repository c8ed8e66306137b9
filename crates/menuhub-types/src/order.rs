//! Orders, their line items, and order-status lookups and history.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{Id, Price};

/// A row of the `order_status` lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatus {
    pub id: Id,
    pub status: String,
}

/// A row of the `orders` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: Id,
    pub order_date: NaiveDateTime,
    pub estimated_delivery_time: NaiveDateTime,
    /// Unset until the order is delivered.
    pub actual_delivery_time: Option<NaiveDateTime>,
    pub status_id: Id,
    pub price: Price,
    pub address_id: Id,
    pub user_id: Id,
    pub restaurant_id: Id,
}

/// Insert payload for [`Order`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_date: NaiveDateTime,
    pub estimated_delivery_time: NaiveDateTime,
    pub status_id: Id,
    pub price: Price,
    pub address_id: Id,
    pub user_id: Id,
    pub restaurant_id: Id,
}

/// A row of the `order_menu_items` join table: one line of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderMenuItem {
    pub id: Id,
    pub order_id: Id,
    pub menu_item_id: Id,
    pub quantity: i64,
}

/// Insert payload for [`OrderMenuItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderMenuItem {
    pub order_id: Id,
    pub menu_item_id: Id,
    pub quantity: i64,
}

/// A row of the `status_catalog` lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCatalog {
    pub id: Id,
    pub name: String,
}

/// A row of the append-only `order_status_relation` history table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusRelation {
    pub id: Id,
    pub order_id: Id,
    pub status_catalog_id: Id,
    pub created_at: NaiveDateTime,
}

impl OrderMenuItem {
    /// Line total for this item at `unit_price`, or `None` on overflow.
    pub fn line_total(&self, unit_price: Price) -> Option<Price> {
        unit_price.checked_mul(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_total_multiplies_unit_price_by_quantity() {
        let line = OrderMenuItem {
            id: 1,
            order_id: 1,
            menu_item_id: 1,
            quantity: 4,
        };
        assert_eq!(
            line.line_total(Price::from_minor_units(1250)),
            Some(Price::from_minor_units(5000))
        );
    }
}
