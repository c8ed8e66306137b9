//! Users.

use chrono::NaiveDateTime;
use menuhub_types::{Id, NewUser, User, UserProfile};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::{expect_one, now, StoreError};

pub(crate) const USER_COLUMNS: &str = "id, name, contact_phone, personal_email, email, \
     email_verified_at, password, updated_at, created_at, address_id";

pub(crate) fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        contact_phone: row.get(2)?,
        personal_email: row.get(3)?,
        email: row.get(4)?,
        email_verified_at: row.get(5)?,
        password: row.get(6)?,
        updated_at: row.get(7)?,
        created_at: row.get(8)?,
        address_id: row.get(9)?,
    })
}

/// Inserts a user. The password is stored as given; hashing belongs to the
/// caller.
pub fn insert_user(conn: &Connection, new: &NewUser) -> Result<User, StoreError> {
    let user = conn.query_row(
        &format!(
            "INSERT INTO \"user\" (
                 name, contact_phone, personal_email, email, password,
                 updated_at, created_at, address_id
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, ?7)
             RETURNING {USER_COLUMNS}"
        ),
        params![
            new.name,
            new.contact_phone,
            new.personal_email,
            new.email,
            new.password,
            now(),
            new.address_id
        ],
        map_user,
    )?;
    tracing::debug!(user_id = user.id, "user created");
    Ok(user)
}

pub fn get_user(conn: &Connection, id: Id) -> Result<Option<User>, StoreError> {
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM \"user\" WHERE id = ?1"),
            [id],
            map_user,
        )
        .optional()?;
    Ok(user)
}

/// Sets `email_verified_at` and bumps `updated_at`.
pub fn mark_email_verified(
    conn: &Connection,
    id: Id,
    at: NaiveDateTime,
) -> Result<User, StoreError> {
    let user = conn
        .query_row(
            &format!(
                "UPDATE \"user\" SET email_verified_at = ?2, updated_at = ?3 WHERE id = ?1
                 RETURNING {USER_COLUMNS}"
            ),
            params![id, at, now()],
            map_user,
        )
        .optional()?;
    user.ok_or(StoreError::NotFound { entity: "user", id })
}

/// Replaces a user's profile fields and bumps `updated_at`. The password
/// and verification timestamp are left alone.
pub fn update_user_profile(
    conn: &Connection,
    id: Id,
    profile: &UserProfile,
) -> Result<User, StoreError> {
    let user = conn
        .query_row(
            &format!(
                "UPDATE \"user\"
                 SET name = ?2, contact_phone = ?3, personal_email = ?4, email = ?5,
                     address_id = ?6, updated_at = ?7
                 WHERE id = ?1
                 RETURNING {USER_COLUMNS}"
            ),
            params![
                id,
                profile.name,
                profile.contact_phone,
                profile.personal_email,
                profile.email,
                profile.address_id,
                now()
            ],
            map_user,
        )
        .optional()?;
    user.ok_or(StoreError::NotFound { entity: "user", id })
}

pub fn delete_user(conn: &Connection, id: Id) -> Result<(), StoreError> {
    let changed = conn.execute("DELETE FROM \"user\" WHERE id = ?1", [id])?;
    expect_one(changed, "user", id)
}
