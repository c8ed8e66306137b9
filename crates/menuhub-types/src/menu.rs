//! Restaurants, their menus, and comments on menu items.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{Id, Price};

/// A row of the `restaurant` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: Id,
    pub name: String,
    pub street_address: String,
    pub address_id: Id,
    pub city_id: Id,
    pub updated_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

/// Insert payload for [`Restaurant`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRestaurant {
    pub name: String,
    pub street_address: String,
    pub address_id: Id,
    pub city_id: Id,
}

/// A row of the `category` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Id,
    pub name: String,
}

/// A row of the `menu_item` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: Id,
    pub restaurant_id: Id,
    pub category_id: Id,
    pub name: String,
    /// Free-form ingredient list; unbounded text.
    pub ingredients: String,
    pub price: Price,
    pub updated_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

/// Insert payload for [`MenuItem`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMenuItem {
    pub restaurant_id: Id,
    pub category_id: Id,
    pub name: String,
    pub ingredients: String,
    pub price: Price,
}

/// A row of the `comment` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Id,
    pub body: String,
    pub user_id: Id,
    pub menu_item_id: Id,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Insert payload for [`Comment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    pub body: String,
    pub user_id: Id,
    pub menu_item_id: Id,
}
