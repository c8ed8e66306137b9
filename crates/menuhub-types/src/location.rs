//! States, cities and street addresses.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::Id;

/// A row of the `state` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub id: Id,
    pub name: String,
    /// Short postal code of the state, at most 10 characters.
    pub code: String,
    pub country: String,
}

/// Insert payload for [`State`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewState {
    pub name: String,
    pub code: String,
    pub country: String,
}

/// A row of the `city` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub id: Id,
    pub name: String,
    pub zipcode: i64,
    pub address: String,
    pub state_id: Id,
    pub country: String,
}

/// Insert payload for [`City`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCity {
    pub name: String,
    pub zipcode: i64,
    pub address: String,
    pub state_id: Id,
    pub country: String,
}

/// A row of the `address` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: Id,
    pub street_address: String,
    pub city_id: Id,
    pub postal_code: i64,
    pub updated_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

/// Insert payload for [`Address`]. Timestamps are assigned by the store layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAddress {
    pub street_address: String,
    pub city_id: Id,
    pub postal_code: i64,
}
