//! Restaurants, their owners, categories, menu items and comments.

use menuhub_types::{
    Category, Comment, Id, MenuItem, NewComment, NewMenuItem, NewRestaurant, Price, Restaurant,
    RestaurantOwner, User,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::user::{map_user, USER_COLUMNS};
use crate::{expect_one, now, StoreError};

const RESTAURANT_COLUMNS: &str =
    "id, name, street_address, address_id, city_id, updated_at, created_at";
pub(crate) const MENU_ITEM_COLUMNS: &str =
    "id, restaurant_id, category_id, name, ingredients, price, updated_at, created_at";
const COMMENT_COLUMNS: &str = "id, body, user_id, menu_item_id, created_at, updated_at";

pub(crate) fn map_restaurant(row: &Row<'_>) -> rusqlite::Result<Restaurant> {
    Ok(Restaurant {
        id: row.get(0)?,
        name: row.get(1)?,
        street_address: row.get(2)?,
        address_id: row.get(3)?,
        city_id: row.get(4)?,
        updated_at: row.get(5)?,
        created_at: row.get(6)?,
    })
}

pub(crate) fn map_menu_item(row: &Row<'_>) -> rusqlite::Result<MenuItem> {
    Ok(MenuItem {
        id: row.get(0)?,
        restaurant_id: row.get(1)?,
        category_id: row.get(2)?,
        name: row.get(3)?,
        ingredients: row.get(4)?,
        price: Price::from_minor_units(row.get(5)?),
        updated_at: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn map_comment(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        body: row.get(1)?,
        user_id: row.get(2)?,
        menu_item_id: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn map_category(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

fn map_owner(row: &Row<'_>) -> rusqlite::Result<RestaurantOwner> {
    Ok(RestaurantOwner {
        id: row.get(0)?,
        restaurant_id: row.get(1)?,
        owner_id: row.get(2)?,
    })
}

// --- Restaurants ---

pub fn insert_restaurant(
    conn: &Connection,
    new: &NewRestaurant,
) -> Result<Restaurant, StoreError> {
    let restaurant = conn.query_row(
        &format!(
            "INSERT INTO restaurant
                 (name, street_address, address_id, city_id, updated_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             RETURNING {RESTAURANT_COLUMNS}"
        ),
        params![new.name, new.street_address, new.address_id, new.city_id, now()],
        map_restaurant,
    )?;
    Ok(restaurant)
}

pub fn get_restaurant(conn: &Connection, id: Id) -> Result<Option<Restaurant>, StoreError> {
    let restaurant = conn
        .query_row(
            &format!("SELECT {RESTAURANT_COLUMNS} FROM restaurant WHERE id = ?1"),
            [id],
            map_restaurant,
        )
        .optional()?;
    Ok(restaurant)
}

/// Replaces a restaurant's fields and bumps `updated_at`.
pub fn update_restaurant(
    conn: &Connection,
    id: Id,
    changes: &NewRestaurant,
) -> Result<Restaurant, StoreError> {
    let restaurant = conn
        .query_row(
            &format!(
                "UPDATE restaurant
                 SET name = ?2, street_address = ?3, address_id = ?4, city_id = ?5,
                     updated_at = ?6
                 WHERE id = ?1
                 RETURNING {RESTAURANT_COLUMNS}"
            ),
            params![
                id,
                changes.name,
                changes.street_address,
                changes.address_id,
                changes.city_id,
                now()
            ],
            map_restaurant,
        )
        .optional()?;
    restaurant.ok_or(StoreError::NotFound {
        entity: "restaurant",
        id,
    })
}

pub fn delete_restaurant(conn: &Connection, id: Id) -> Result<(), StoreError> {
    let changed = conn.execute("DELETE FROM restaurant WHERE id = ?1", [id])?;
    expect_one(changed, "restaurant", id)
}

pub fn restaurants_in_city(
    conn: &Connection,
    city_id: Id,
) -> Result<Vec<Restaurant>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RESTAURANT_COLUMNS} FROM restaurant WHERE city_id = ?1 ORDER BY id"
    ))?;
    let restaurants = stmt
        .query_map([city_id], map_restaurant)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(restaurants)
}

/// Links a user to a restaurant as one of its owners.
pub fn add_owner(
    conn: &Connection,
    restaurant_id: Id,
    owner_id: Id,
) -> Result<RestaurantOwner, StoreError> {
    let link = conn.query_row(
        "INSERT INTO restaurant_owner (restaurant_id, owner_id) VALUES (?1, ?2)
         RETURNING id, restaurant_id, owner_id",
        params![restaurant_id, owner_id],
        map_owner,
    )?;
    Ok(link)
}

pub fn get_restaurant_owner(
    conn: &Connection,
    id: Id,
) -> Result<Option<RestaurantOwner>, StoreError> {
    let link = conn
        .query_row(
            "SELECT id, restaurant_id, owner_id FROM restaurant_owner WHERE id = ?1",
            [id],
            map_owner,
        )
        .optional()?;
    Ok(link)
}

/// Removes one ownership link. The restaurant and the user stay.
pub fn delete_restaurant_owner(conn: &Connection, id: Id) -> Result<(), StoreError> {
    let changed = conn.execute("DELETE FROM restaurant_owner WHERE id = ?1", [id])?;
    expect_one(changed, "restaurant_owner", id)
}

/// Users owning a restaurant, through `restaurant_owner`.
pub fn owners_of_restaurant(
    conn: &Connection,
    restaurant_id: Id,
) -> Result<Vec<User>, StoreError> {
    let columns = qualified("u", USER_COLUMNS);
    let mut stmt = conn.prepare(&format!(
        "SELECT {columns} FROM restaurant_owner ro
         JOIN \"user\" u ON u.id = ro.owner_id
         WHERE ro.restaurant_id = ?1
         ORDER BY ro.id"
    ))?;
    let owners = stmt
        .query_map([restaurant_id], map_user)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(owners)
}

/// Restaurants a user owns, through `restaurant_owner`.
pub fn restaurants_owned_by(
    conn: &Connection,
    owner_id: Id,
) -> Result<Vec<Restaurant>, StoreError> {
    let columns = qualified("r", RESTAURANT_COLUMNS);
    let mut stmt = conn.prepare(&format!(
        "SELECT {columns} FROM restaurant_owner ro
         JOIN restaurant r ON r.id = ro.restaurant_id
         WHERE ro.owner_id = ?1
         ORDER BY ro.id"
    ))?;
    let restaurants = stmt
        .query_map([owner_id], map_restaurant)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(restaurants)
}

// --- Categories and menu items ---

pub fn insert_category(conn: &Connection, name: &str) -> Result<Category, StoreError> {
    let category = conn.query_row(
        "INSERT INTO category (name) VALUES (?1) RETURNING id, name",
        [name],
        map_category,
    )?;
    Ok(category)
}

pub fn get_category(conn: &Connection, id: Id) -> Result<Option<Category>, StoreError> {
    let category = conn
        .query_row("SELECT id, name FROM category WHERE id = ?1", [id], map_category)
        .optional()?;
    Ok(category)
}

pub fn rename_category(conn: &Connection, id: Id, name: &str) -> Result<Category, StoreError> {
    let category = conn
        .query_row(
            "UPDATE category SET name = ?2 WHERE id = ?1 RETURNING id, name",
            params![id, name],
            map_category,
        )
        .optional()?;
    category.ok_or(StoreError::NotFound {
        entity: "category",
        id,
    })
}

/// Deletes a category. Fails with a foreign-key violation while menu items
/// are filed under it.
pub fn delete_category(conn: &Connection, id: Id) -> Result<(), StoreError> {
    let changed = conn.execute("DELETE FROM category WHERE id = ?1", [id])?;
    expect_one(changed, "category", id)
}

pub fn insert_menu_item(conn: &Connection, new: &NewMenuItem) -> Result<MenuItem, StoreError> {
    let item = conn.query_row(
        &format!(
            "INSERT INTO menu_item
                 (restaurant_id, category_id, name, ingredients, price, updated_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             RETURNING {MENU_ITEM_COLUMNS}"
        ),
        params![
            new.restaurant_id,
            new.category_id,
            new.name,
            new.ingredients,
            new.price.minor_units(),
            now()
        ],
        map_menu_item,
    )?;
    Ok(item)
}

pub fn get_menu_item(conn: &Connection, id: Id) -> Result<Option<MenuItem>, StoreError> {
    let item = conn
        .query_row(
            &format!("SELECT {MENU_ITEM_COLUMNS} FROM menu_item WHERE id = ?1"),
            [id],
            map_menu_item,
        )
        .optional()?;
    Ok(item)
}

pub fn update_menu_item_price(
    conn: &Connection,
    id: Id,
    price: Price,
) -> Result<MenuItem, StoreError> {
    let item = conn
        .query_row(
            &format!(
                "UPDATE menu_item SET price = ?2, updated_at = ?3 WHERE id = ?1
                 RETURNING {MENU_ITEM_COLUMNS}"
            ),
            params![id, price.minor_units(), now()],
            map_menu_item,
        )
        .optional()?;
    item.ok_or(StoreError::NotFound {
        entity: "menu_item",
        id,
    })
}

pub fn delete_menu_item(conn: &Connection, id: Id) -> Result<(), StoreError> {
    let changed = conn.execute("DELETE FROM menu_item WHERE id = ?1", [id])?;
    expect_one(changed, "menu_item", id)
}

/// A restaurant's menu, grouped by category then ordered by name.
pub fn menu_for_restaurant(
    conn: &Connection,
    restaurant_id: Id,
) -> Result<Vec<MenuItem>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MENU_ITEM_COLUMNS} FROM menu_item
         WHERE restaurant_id = ?1
         ORDER BY category_id, name, id"
    ))?;
    let items = stmt
        .query_map([restaurant_id], map_menu_item)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(items)
}

pub fn menu_items_in_category(
    conn: &Connection,
    category_id: Id,
) -> Result<Vec<MenuItem>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MENU_ITEM_COLUMNS} FROM menu_item WHERE category_id = ?1 ORDER BY id"
    ))?;
    let items = stmt
        .query_map([category_id], map_menu_item)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(items)
}

// --- Comments ---

pub fn insert_comment(conn: &Connection, new: &NewComment) -> Result<Comment, StoreError> {
    let comment = conn.query_row(
        &format!(
            "INSERT INTO comment (body, user_id, menu_item_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             RETURNING {COMMENT_COLUMNS}"
        ),
        params![new.body, new.user_id, new.menu_item_id, now()],
        map_comment,
    )?;
    Ok(comment)
}

pub fn get_comment(conn: &Connection, id: Id) -> Result<Option<Comment>, StoreError> {
    let comment = conn
        .query_row(
            &format!("SELECT {COMMENT_COLUMNS} FROM comment WHERE id = ?1"),
            [id],
            map_comment,
        )
        .optional()?;
    Ok(comment)
}

/// Replaces a comment's body and bumps `updated_at`.
pub fn edit_comment(conn: &Connection, id: Id, body: &str) -> Result<Comment, StoreError> {
    let comment = conn
        .query_row(
            &format!(
                "UPDATE comment SET body = ?2, updated_at = ?3 WHERE id = ?1
                 RETURNING {COMMENT_COLUMNS}"
            ),
            params![id, body, now()],
            map_comment,
        )
        .optional()?;
    comment.ok_or(StoreError::NotFound {
        entity: "comment",
        id,
    })
}

pub fn delete_comment(conn: &Connection, id: Id) -> Result<(), StoreError> {
    let changed = conn.execute("DELETE FROM comment WHERE id = ?1", [id])?;
    expect_one(changed, "comment", id)
}

pub fn comments_on_menu_item(
    conn: &Connection,
    menu_item_id: Id,
) -> Result<Vec<Comment>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COMMENT_COLUMNS} FROM comment WHERE menu_item_id = ?1 ORDER BY created_at, id"
    ))?;
    let comments = stmt
        .query_map([menu_item_id], map_comment)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(comments)
}

pub fn comments_by_user(conn: &Connection, user_id: Id) -> Result<Vec<Comment>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COMMENT_COLUMNS} FROM comment WHERE user_id = ?1 ORDER BY created_at, id"
    ))?;
    let comments = stmt
        .query_map([user_id], map_comment)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(comments)
}

/// Prefixes each column of a column list with a table alias.
pub(crate) fn qualified(alias: &str, columns: &str) -> String {
    columns
        .split(", ")
        .map(|c| format!("{alias}.{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}
