//! The menuhub table declarations.
//!
//! Tables are listed parents-first so that creating them in order never
//! references a table that does not exist yet.

use crate::ColumnType::{Integer, Text, Timestamp, Varchar};
use crate::{Column, Relation, Table};

const SHORT: crate::ColumnType = Varchar(255);

const STATE: Table = Table {
    name: "state",
    columns: &[
        Column::serial("id"),
        Column::new("name", SHORT),
        Column::new("code", Varchar(10)),
        Column::new("country", SHORT),
    ],
    relations: &[Relation::many("cities", "city", "state_id")],
};

const CITY: Table = Table {
    name: "city",
    columns: &[
        Column::serial("id"),
        Column::new("name", SHORT),
        Column::new("zipcode", Integer),
        Column::new("address", SHORT),
        Column::foreign_key("state_id", "state"),
        Column::new("country", SHORT),
    ],
    relations: &[
        Relation::one("state", "state", "state_id"),
        Relation::many("addresses", "address", "city_id"),
        Relation::many("restaurants", "restaurant", "city_id"),
    ],
};

const ADDRESS: Table = Table {
    name: "address",
    columns: &[
        Column::serial("id"),
        Column::new("street_address", SHORT),
        Column::foreign_key("city_id", "city"),
        Column::new("postal_code", Integer),
        Column::new("updated_at", Timestamp),
        Column::new("created_at", Timestamp),
    ],
    relations: &[
        Relation::one("city", "city", "city_id"),
        Relation::many("restaurants", "restaurant", "address_id"),
        Relation::many("users", "user", "address_id"),
        Relation::many("orders", "orders", "address_id"),
    ],
};

const RESTAURANT: Table = Table {
    name: "restaurant",
    columns: &[
        Column::serial("id"),
        Column::new("name", SHORT),
        Column::new("street_address", SHORT),
        Column::foreign_key("address_id", "address"),
        Column::foreign_key("city_id", "city"),
        Column::new("updated_at", Timestamp),
        Column::new("created_at", Timestamp),
    ],
    relations: &[
        Relation::one("address", "address", "address_id"),
        Relation::one("city", "city", "city_id"),
        Relation::many("owners", "restaurant_owner", "restaurant_id"),
        Relation::many("menu_items", "menu_item", "restaurant_id"),
        Relation::many("orders", "orders", "restaurant_id"),
    ],
};

const USER: Table = Table {
    name: "user",
    columns: &[
        Column::serial("id"),
        Column::new("name", SHORT),
        Column::new("contact_phone", SHORT),
        Column::new("personal_email", SHORT),
        Column::new("email", SHORT),
        Column::new("email_verified_at", Timestamp).nullable(),
        Column::new("password", SHORT),
        Column::new("updated_at", Timestamp),
        Column::new("created_at", Timestamp),
        Column::foreign_key("address_id", "address"),
    ],
    relations: &[
        Relation::one("address", "address", "address_id"),
        Relation::many("owned_restaurants", "restaurant_owner", "owner_id"),
        Relation::many("orders", "orders", "user_id"),
        Relation::many("comments", "comment", "user_id"),
    ],
};

const RESTAURANT_OWNER: Table = Table {
    name: "restaurant_owner",
    columns: &[
        Column::serial("id"),
        Column::foreign_key("restaurant_id", "restaurant"),
        Column::foreign_key("owner_id", "user"),
    ],
    relations: &[
        Relation::one("restaurant", "restaurant", "restaurant_id"),
        Relation::one("owner", "user", "owner_id"),
    ],
};

const CATEGORY: Table = Table {
    name: "category",
    columns: &[Column::serial("id"), Column::new("name", SHORT)],
    relations: &[Relation::many("menu_items", "menu_item", "category_id")],
};

const MENU_ITEM: Table = Table {
    name: "menu_item",
    columns: &[
        Column::serial("id"),
        Column::foreign_key("restaurant_id", "restaurant"),
        Column::foreign_key("category_id", "category"),
        Column::new("name", SHORT),
        Column::new("ingredients", Text),
        Column::new("price", Integer),
        Column::new("updated_at", Timestamp),
        Column::new("created_at", Timestamp),
    ],
    relations: &[
        Relation::one("restaurant", "restaurant", "restaurant_id"),
        Relation::one("category", "category", "category_id"),
        Relation::many("order_items", "order_menu_items", "menu_item_id"),
        Relation::many("comments", "comment", "menu_item_id"),
    ],
};

const ORDER_STATUS: Table = Table {
    name: "order_status",
    columns: &[Column::serial("id"), Column::new("status", SHORT)],
    relations: &[Relation::many("orders", "orders", "status_id")],
};

const ORDERS: Table = Table {
    name: "orders",
    columns: &[
        Column::serial("id"),
        Column::new("order_date", Timestamp),
        Column::new("estimated_delivery_time", Timestamp),
        Column::new("actual_delivery_time", Timestamp).nullable(),
        Column::foreign_key("status_id", "order_status"),
        Column::new("price", Integer),
        Column::foreign_key("address_id", "address"),
        Column::foreign_key("user_id", "user"),
        Column::foreign_key("restaurant_id", "restaurant"),
    ],
    relations: &[
        Relation::one("status", "order_status", "status_id"),
        Relation::one("address", "address", "address_id"),
        Relation::one("user", "user", "user_id"),
        Relation::one("restaurant", "restaurant", "restaurant_id"),
        Relation::many("order_items", "order_menu_items", "order_id"),
        Relation::many("status_history", "order_status_relation", "order_id"),
    ],
};

const ORDER_MENU_ITEMS: Table = Table {
    name: "order_menu_items",
    columns: &[
        Column::serial("id"),
        Column::foreign_key("order_id", "orders"),
        Column::foreign_key("menu_item_id", "menu_item"),
        Column::new("quantity", Integer),
    ],
    relations: &[
        Relation::one("order", "orders", "order_id"),
        Relation::one("menu_item", "menu_item", "menu_item_id"),
    ],
};

const COMMENT: Table = Table {
    name: "comment",
    columns: &[
        Column::serial("id"),
        Column::new("body", Text),
        Column::foreign_key("user_id", "user"),
        Column::foreign_key("menu_item_id", "menu_item"),
        Column::new("created_at", Timestamp),
        Column::new("updated_at", Timestamp),
    ],
    relations: &[
        Relation::one("user", "user", "user_id"),
        Relation::one("menu_item", "menu_item", "menu_item_id"),
    ],
};

const STATUS_CATALOG: Table = Table {
    name: "status_catalog",
    columns: &[Column::serial("id"), Column::new("name", SHORT)],
    relations: &[Relation::many(
        "order_status_relations",
        "order_status_relation",
        "status_catalog_id",
    )],
};

// Append-only: rows are inserted, never updated.
const ORDER_STATUS_RELATION: Table = Table {
    name: "order_status_relation",
    columns: &[
        Column::serial("id"),
        Column::foreign_key("order_id", "orders"),
        Column::foreign_key("status_catalog_id", "status_catalog"),
        Column::new("created_at", Timestamp).default_now(),
    ],
    relations: &[
        Relation::one("order", "orders", "order_id"),
        Relation::one("status_catalog", "status_catalog", "status_catalog_id"),
    ],
};

/// Every table of the store, parents before children.
pub static SCHEMA: &[Table] = &[
    STATE,
    CITY,
    ADDRESS,
    RESTAURANT,
    USER,
    RESTAURANT_OWNER,
    CATEGORY,
    MENU_ITEM,
    ORDER_STATUS,
    ORDERS,
    ORDER_MENU_ITEMS,
    COMMENT,
    STATUS_CATALOG,
    ORDER_STATUS_RELATION,
];

/// Looks up a table of [`SCHEMA`] by name.
pub fn table(name: &str) -> Option<&'static Table> {
    SCHEMA.iter().find(|t| t.name == name)
}
