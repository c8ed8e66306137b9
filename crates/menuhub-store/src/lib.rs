//! Data-access layer for the menuhub store.
//!
//! Thin, typed reads and writes over a migrated store. Every function takes
//! the connection explicitly; nothing here holds global state. Integrity is
//! left to the store: foreign keys, `NOT NULL`, restrict-on-delete and the
//! write-rule triggers all surface as [`StoreError::Constraint`] and are
//! never retried.
//!
//! # Write rules
//!
//! - Inserts set `created_at` and `updated_at` to the same instant.
//! - Updates set `updated_at` and never touch `created_at`.
//! - `order_status_relation` is append-only: [`append_status_event`] is
//!   the only write path and there is no update function.
//!
//! # Usage
//!
//! ```rust,ignore
//! use menuhub_store::{insert_state, insert_city};
//! use menuhub_types::{NewState, NewCity};
//!
//! let state = insert_state(&conn, &NewState {
//!     name: "Oregon".into(),
//!     code: "OR".into(),
//!     country: "US".into(),
//! })?;
//! let city = insert_city(&conn, &NewCity {
//!     name: "Portland".into(),
//!     zipcode: 97201,
//!     address: "City Hall".into(),
//!     state_id: state.id,
//!     country: "US".into(),
//! })?;
//! ```

mod error;
mod location;
mod menu;
mod order;
mod relations;
mod user;

pub use error::{ConstraintKind, StoreError};
pub use location::{
    addresses_in_city, cities_in_state, delete_address, delete_city, delete_state, get_address,
    get_city, get_state, insert_address, insert_city, insert_state, update_address, update_city,
    update_state,
};
pub use menu::{
    add_owner, comments_by_user, comments_on_menu_item, delete_category, delete_comment,
    delete_menu_item, delete_restaurant, delete_restaurant_owner, edit_comment, get_category,
    get_comment, get_menu_item, get_restaurant, get_restaurant_owner, insert_category,
    insert_comment, insert_menu_item, insert_restaurant, menu_for_restaurant,
    menu_items_in_category, owners_of_restaurant, rename_category, restaurants_in_city,
    restaurants_owned_by, update_menu_item_price, update_restaurant,
};
pub use order::{
    add_order_line, append_status_event, delete_order, delete_order_line, delete_order_status,
    delete_status_catalog, get_order, get_order_line, get_order_status, get_status_catalog,
    get_status_event, insert_order, insert_order_status, insert_status_catalog, order_details,
    order_lines, order_status_by_label, orders_for_user, record_delivery, set_order_status,
    status_catalog_by_label, status_history, OrderDetails, OrderLine, StatusEvent,
};
pub use relations::follow;
pub use user::{delete_user, get_user, insert_user, mark_email_verified, update_user_profile};

use chrono::{NaiveDateTime, Utc};

/// Current UTC time, as stored in `TIMESTAMP` columns.
fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Turns a zero-row update or delete into `StoreError::NotFound`.
fn expect_one(
    changed: usize,
    entity: &'static str,
    id: menuhub_types::Id,
) -> Result<(), StoreError> {
    if changed == 0 {
        return Err(StoreError::NotFound { entity, id });
    }
    Ok(())
}
