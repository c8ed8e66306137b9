//! States, cities and addresses.

use menuhub_types::{Address, City, Id, NewAddress, NewCity, NewState, State};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::{expect_one, now, StoreError};

fn map_state(row: &Row<'_>) -> rusqlite::Result<State> {
    Ok(State {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        country: row.get(3)?,
    })
}

fn map_city(row: &Row<'_>) -> rusqlite::Result<City> {
    Ok(City {
        id: row.get(0)?,
        name: row.get(1)?,
        zipcode: row.get(2)?,
        address: row.get(3)?,
        state_id: row.get(4)?,
        country: row.get(5)?,
    })
}

pub(crate) fn map_address(row: &Row<'_>) -> rusqlite::Result<Address> {
    Ok(Address {
        id: row.get(0)?,
        street_address: row.get(1)?,
        city_id: row.get(2)?,
        postal_code: row.get(3)?,
        updated_at: row.get(4)?,
        created_at: row.get(5)?,
    })
}

const STATE_COLUMNS: &str = "id, name, code, country";
const CITY_COLUMNS: &str = "id, name, zipcode, address, state_id, country";
pub(crate) const ADDRESS_COLUMNS: &str =
    "id, street_address, city_id, postal_code, updated_at, created_at";

pub fn insert_state(conn: &Connection, new: &NewState) -> Result<State, StoreError> {
    let state = conn.query_row(
        &format!(
            "INSERT INTO state (name, code, country) VALUES (?1, ?2, ?3) RETURNING {STATE_COLUMNS}"
        ),
        params![new.name, new.code, new.country],
        map_state,
    )?;
    Ok(state)
}

pub fn get_state(conn: &Connection, id: Id) -> Result<Option<State>, StoreError> {
    let state = conn
        .query_row(
            &format!("SELECT {STATE_COLUMNS} FROM state WHERE id = ?1"),
            [id],
            map_state,
        )
        .optional()?;
    Ok(state)
}

pub fn update_state(conn: &Connection, id: Id, changes: &NewState) -> Result<State, StoreError> {
    let state = conn
        .query_row(
            &format!(
                "UPDATE state SET name = ?2, code = ?3, country = ?4 WHERE id = ?1
                 RETURNING {STATE_COLUMNS}"
            ),
            params![id, changes.name, changes.code, changes.country],
            map_state,
        )
        .optional()?;
    state.ok_or(StoreError::NotFound { entity: "state", id })
}

/// Deletes a state. Fails with a foreign-key violation while cities
/// reference it.
pub fn delete_state(conn: &Connection, id: Id) -> Result<(), StoreError> {
    let changed = conn.execute("DELETE FROM state WHERE id = ?1", [id])?;
    expect_one(changed, "state", id)
}

pub fn insert_city(conn: &Connection, new: &NewCity) -> Result<City, StoreError> {
    let city = conn.query_row(
        &format!(
            "INSERT INTO city (name, zipcode, address, state_id, country)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING {CITY_COLUMNS}"
        ),
        params![new.name, new.zipcode, new.address, new.state_id, new.country],
        map_city,
    )?;
    Ok(city)
}

pub fn get_city(conn: &Connection, id: Id) -> Result<Option<City>, StoreError> {
    let city = conn
        .query_row(
            &format!("SELECT {CITY_COLUMNS} FROM city WHERE id = ?1"),
            [id],
            map_city,
        )
        .optional()?;
    Ok(city)
}

pub fn update_city(conn: &Connection, id: Id, changes: &NewCity) -> Result<City, StoreError> {
    let city = conn
        .query_row(
            &format!(
                "UPDATE city
                 SET name = ?2, zipcode = ?3, address = ?4, state_id = ?5, country = ?6
                 WHERE id = ?1
                 RETURNING {CITY_COLUMNS}"
            ),
            params![
                id,
                changes.name,
                changes.zipcode,
                changes.address,
                changes.state_id,
                changes.country
            ],
            map_city,
        )
        .optional()?;
    city.ok_or(StoreError::NotFound { entity: "city", id })
}

pub fn delete_city(conn: &Connection, id: Id) -> Result<(), StoreError> {
    let changed = conn.execute("DELETE FROM city WHERE id = ?1", [id])?;
    expect_one(changed, "city", id)
}

/// Cities of a state, by id.
pub fn cities_in_state(conn: &Connection, state_id: Id) -> Result<Vec<City>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CITY_COLUMNS} FROM city WHERE state_id = ?1 ORDER BY id"
    ))?;
    let cities = stmt
        .query_map([state_id], map_city)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(cities)
}

pub fn insert_address(conn: &Connection, new: &NewAddress) -> Result<Address, StoreError> {
    let at = now();
    let address = conn.query_row(
        &format!(
            "INSERT INTO address (street_address, city_id, postal_code, updated_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             RETURNING {ADDRESS_COLUMNS}"
        ),
        params![new.street_address, new.city_id, new.postal_code, at],
        map_address,
    )?;
    Ok(address)
}

pub fn get_address(conn: &Connection, id: Id) -> Result<Option<Address>, StoreError> {
    let address = conn
        .query_row(
            &format!("SELECT {ADDRESS_COLUMNS} FROM address WHERE id = ?1"),
            [id],
            map_address,
        )
        .optional()?;
    Ok(address)
}

/// Replaces an address's fields and bumps `updated_at`.
pub fn update_address(
    conn: &Connection,
    id: Id,
    changes: &NewAddress,
) -> Result<Address, StoreError> {
    let address = conn
        .query_row(
            &format!(
                "UPDATE address
                 SET street_address = ?2, city_id = ?3, postal_code = ?4, updated_at = ?5
                 WHERE id = ?1
                 RETURNING {ADDRESS_COLUMNS}"
            ),
            params![id, changes.street_address, changes.city_id, changes.postal_code, now()],
            map_address,
        )
        .optional()?;
    address.ok_or(StoreError::NotFound {
        entity: "address",
        id,
    })
}

pub fn delete_address(conn: &Connection, id: Id) -> Result<(), StoreError> {
    let changed = conn.execute("DELETE FROM address WHERE id = ?1", [id])?;
    expect_one(changed, "address", id)
}

pub fn addresses_in_city(conn: &Connection, city_id: Id) -> Result<Vec<Address>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ADDRESS_COLUMNS} FROM address WHERE city_id = ?1 ORDER BY id"
    ))?;
    let addresses = stmt
        .query_map([city_id], map_address)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(addresses)
}
