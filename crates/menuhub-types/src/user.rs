//! Users and the restaurant ownership join entity.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::Id;

/// A row of the `user` table.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub name: String,
    pub contact_phone: String,
    pub personal_email: String,
    pub email: String,
    /// Unset until the user confirms their email address.
    pub email_verified_at: Option<NaiveDateTime>,
    /// Never serialized; empty when a `User` is deserialized.
    #[serde(skip_serializing, default)]
    pub password: String,
    pub updated_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub address_id: Id,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("contact_phone", &self.contact_phone)
            .field("personal_email", &self.personal_email)
            .field("email", &self.email)
            .field("email_verified_at", &self.email_verified_at)
            .field("password", &"[REDACTED]")
            .field("updated_at", &self.updated_at)
            .field("created_at", &self.created_at)
            .field("address_id", &self.address_id)
            .finish()
    }
}

/// Insert payload for [`User`].
///
/// `password` is stored as given; hashing belongs to the caller. The
/// payload is input only, so it deserializes but never serializes.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub contact_phone: String,
    pub personal_email: String,
    pub email: String,
    pub password: String,
    pub address_id: Id,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("address_id", &self.address_id)
            .finish_non_exhaustive()
    }
}

/// Profile fields of a [`User`] that can be edited after signup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub contact_phone: String,
    pub personal_email: String,
    pub email: String,
    pub address_id: Id,
}

/// A row of the `restaurant_owner` join table.
///
/// One row per (restaurant, owner) pairing, with its own surrogate key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestaurantOwner {
    pub id: Id,
    pub restaurant_id: Id,
    pub owner_id: Id,
}
