//! Item quantity.

use core::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Errors that can occur when coercing a value into a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// The value is not an integer (or a string holding one).
    #[error("Quantity must be numeric!")]
    NotNumeric,
    /// The value is below zero.
    #[error("Quantity cannot be negative!")]
    Negative,
    /// The value does not fit the storage column.
    #[error("Quantity must be at most {max}!")]
    TooLarge {
        /// Largest accepted quantity.
        max: u32,
    },
}

/// Non-negative whole number of units of an item.
///
/// The upper bound matches a Postgres `INTEGER` column.
///
/// ```
/// use serde_json::json;
/// use shoplist_core::Quantity;
///
/// assert_eq!(Quantity::coerce(&json!(2)).map(Quantity::get), Ok(2));
/// assert_eq!(Quantity::coerce(&json!(" 16 ")).map(Quantity::get), Ok(16));
/// assert!(Quantity::coerce(&json!("-1")).is_err());
/// assert!(Quantity::coerce(&json!("abc")).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    /// Largest accepted quantity.
    #[allow(clippy::cast_sign_loss)] // i32::MAX is positive
    pub const MAX: u32 = i32::MAX as u32;

    /// Create a quantity from an integer.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::Negative` below zero and `QuantityError::TooLarge`
    /// above [`Quantity::MAX`].
    pub fn new(value: i64) -> Result<Self, QuantityError> {
        if value < 0 {
            return Err(QuantityError::Negative);
        }
        u32::try_from(value)
            .ok()
            .filter(|v| *v <= Self::MAX)
            .map(Self)
            .ok_or(QuantityError::TooLarge { max: Self::MAX })
    }

    /// Coerce a loosely typed JSON value into a quantity.
    ///
    /// Accepts JSON integers and strings holding an optionally signed decimal
    /// integer (surrounding whitespace ignored). Fractions, booleans, null and
    /// other strings are rejected.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::NotNumeric` for non-integer input, otherwise the
    /// errors of [`Quantity::new`].
    pub fn coerce(value: &Value) -> Result<Self, QuantityError> {
        let number = match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    i
                } else if n.as_u64().is_some() {
                    return Err(QuantityError::TooLarge { max: Self::MAX });
                } else {
                    return Err(QuantityError::NotNumeric);
                }
            }
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| QuantityError::NotNumeric)?,
            _ => return Err(QuantityError::NotNumeric),
        };
        Self::new(number)
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Get the value as the `INTEGER` column type.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)] // bounded by Quantity::MAX
    pub const fn as_i32(self) -> i32 {
        self.0 as i32
    }
}

impl TryFrom<i32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(i64::from(value))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
