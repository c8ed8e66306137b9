//! Shared row types and value types for the menuhub food-ordering store.
//!
//! Every table declared by `menuhub-schema` has a row struct here (the shape
//! returned by reads) and, where rows are created by the application, a
//! `New*` struct (the shape accepted by inserts). Surrogate keys are `i64`
//! because SQLite rowids are 64-bit.
//!
//! Timestamps are [`chrono::NaiveDateTime`]: the store keeps them as
//! `TIMESTAMP` columns without a zone, and writers always use UTC.

mod location;
mod menu;
mod order;
mod user;

pub use location::{Address, City, NewAddress, NewCity, NewState, State};
pub use menu::{Category, Comment, MenuItem, NewComment, NewMenuItem, NewRestaurant, Restaurant};
pub use order::{
    NewOrder, NewOrderMenuItem, Order, OrderMenuItem, OrderStatus, OrderStatusRelation,
    StatusCatalog,
};
pub use user::{NewUser, RestaurantOwner, User, UserProfile};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Surrogate key type shared by every table.
pub type Id = i64;

/// A monetary amount as an integer count of minor currency units (cents).
///
/// Prices never pass through floating point. Arithmetic is checked: an
/// overflow yields `None` instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// Zero minor units.
    pub const ZERO: Price = Price(0);

    /// Wraps a count of minor units.
    pub const fn from_minor_units(units: i64) -> Self {
        Self(units)
    }

    /// Returns the count of minor units.
    pub const fn minor_units(self) -> i64 {
        self.0
    }

    /// Adds two prices, returning `None` on overflow.
    pub fn checked_add(self, other: Price) -> Option<Price> {
        self.0.checked_add(other.0).map(Price)
    }

    /// Multiplies a unit price by a quantity, returning `None` on overflow.
    pub fn checked_mul(self, quantity: i64) -> Option<Price> {
        self.0.checked_mul(quantity).map(Price)
    }

    /// Sums an iterator of prices, returning `None` on overflow.
    pub fn checked_sum<I: IntoIterator<Item = Price>>(prices: I) -> Option<Price> {
        prices
            .into_iter()
            .try_fold(Price::ZERO, |acc, price| acc.checked_add(price))
    }
}

impl fmt::Display for Price {
    /// Renders as major.minor with two minor digits, e.g. `12.05`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

/// Labels seeded into the `order_status` and `status_catalog` lookup tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusLabel {
    /// Order placed, not yet accepted by the restaurant.
    Pending,
    /// Restaurant accepted the order.
    Accepted,
    /// Kitchen is preparing the order.
    Preparing,
    /// Courier picked the order up.
    OutForDelivery,
    /// Order handed to the customer.
    Delivered,
    /// Order cancelled by either party.
    Cancelled,
}

impl StatusLabel {
    /// Every label, in seeding order.
    pub const ALL: [StatusLabel; 6] = [
        Self::Pending,
        Self::Accepted,
        Self::Preparing,
        Self::OutForDelivery,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Returns the label stored in the lookup tables.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::Preparing => "PREPARING",
            Self::OutForDelivery => "OUT_FOR_DELIVERY",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StatusLabel {
    type Err = ParseStatusLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| ParseStatusLabelError(s.to_string()))
    }
}

/// Error returned when parsing an unknown status label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status label: {0}")]
pub struct ParseStatusLabelError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_displays_minor_units_as_decimal() {
        assert_eq!(Price::from_minor_units(1205).to_string(), "12.05");
        assert_eq!(Price::from_minor_units(7).to_string(), "0.07");
        assert_eq!(Price::from_minor_units(-250).to_string(), "-2.50");
    }

    #[test]
    fn price_arithmetic_stays_integral() {
        let unit = Price::from_minor_units(333);
        assert_eq!(unit.checked_mul(3), Some(Price::from_minor_units(999)));

        let total = Price::checked_sum([unit, unit, Price::from_minor_units(1)]);
        assert_eq!(total, Some(Price::from_minor_units(667)));
    }

    #[test]
    fn price_overflow_is_reported() {
        assert_eq!(Price::from_minor_units(i64::MAX).checked_mul(2), None);
        assert_eq!(
            Price::checked_sum([Price::from_minor_units(i64::MAX), Price::from_minor_units(1)]),
            None
        );
    }

    #[test]
    fn status_labels_round_trip_through_strings() {
        for label in StatusLabel::ALL {
            let parsed: StatusLabel = label.as_str().parse().expect("label should parse");
            assert_eq!(parsed, label);
        }
        assert!("SHIPPED".parse::<StatusLabel>().is_err());
    }
}
