//! Validated names for accounts, lists, items and profiles.
//!
//! Every user-supplied name passes through one of these constructors before it
//! reaches business logic. Lengths are counted in characters, not bytes.

use core::fmt;

use serde::Serialize;

/// Characters that may not appear in item or profile names.
pub const FORBIDDEN_CHARACTERS: &[char] = &[
    '@', '_', '!', '#', '$', '%', '^', '&', '*', '(', ')', '<', '>', '?', '/', '\\', '|', '}',
    '{', '~', ':',
];

/// Errors that can occur when validating a list, item or profile name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// Shorter than the minimum length.
    #[error("{0} name is too short!")]
    TooShort(&'static str),
    /// Longer than the maximum length.
    #[error("{0} name must be at most {1} characters!")]
    TooLong(&'static str, usize),
    /// Contains a character from [`FORBIDDEN_CHARACTERS`].
    #[error("{0} name contains special characters!")]
    ForbiddenCharacters(&'static str),
}

/// Errors that can occur when validating a [`Username`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UsernameError {
    /// Shorter than [`Username::MIN_LENGTH`].
    #[error("Username is too short!")]
    TooShort,
    /// Contains whitespace or control characters.
    #[error("Username may not contain whitespace")]
    Whitespace,
}

fn contains_forbidden(value: &str) -> bool {
    value.contains(FORBIDDEN_CHARACTERS)
}

/// Name of a shopping list. At least two characters; unique per owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ListName(String);

impl ListName {
    /// Minimum length in characters.
    pub const MIN_LENGTH: usize = 2;

    /// Validate a list name.
    ///
    /// # Errors
    ///
    /// Returns `NameError::TooShort` if the name has fewer than two characters.
    pub fn parse(value: &str) -> Result<Self, NameError> {
        if value.chars().count() < Self::MIN_LENGTH {
            return Err(NameError::TooShort("List"));
        }
        Ok(Self(value.to_owned()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Name of an item on a shopping list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ItemName(String);

impl ItemName {
    /// Minimum length in characters.
    pub const MIN_LENGTH: usize = 2;

    /// Validate an item name.
    ///
    /// # Errors
    ///
    /// Returns `NameError::TooShort` for names under two characters and
    /// `NameError::ForbiddenCharacters` if any of [`FORBIDDEN_CHARACTERS`] appears.
    pub fn parse(value: &str) -> Result<Self, NameError> {
        if value.chars().count() < Self::MIN_LENGTH {
            return Err(NameError::TooShort("Item"));
        }
        if contains_forbidden(value) {
            return Err(NameError::ForbiddenCharacters("Item"));
        }
        Ok(Self(value.to_owned()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// First or last name on a user profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PersonName(String);

impl PersonName {
    /// Minimum length in characters.
    pub const MIN_LENGTH: usize = 2;
    /// Maximum length in characters.
    pub const MAX_LENGTH: usize = 100;

    /// Validate a profile name. `kind` labels the field in error messages
    /// (e.g. `"First"`).
    ///
    /// # Errors
    ///
    /// Returns a `NameError` if the name is too short, too long or contains
    /// forbidden characters.
    pub fn parse(kind: &'static str, value: &str) -> Result<Self, NameError> {
        let len = value.chars().count();
        if len < Self::MIN_LENGTH {
            return Err(NameError::TooShort(kind));
        }
        if len > Self::MAX_LENGTH {
            return Err(NameError::TooLong(kind, Self::MAX_LENGTH));
        }
        if contains_forbidden(value) {
            return Err(NameError::ForbiddenCharacters(kind));
        }
        Ok(Self(value.to_owned()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Login name of an account. Globally unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Minimum length in characters.
    pub const MIN_LENGTH: usize = 6;

    /// Validate a username.
    ///
    /// # Errors
    ///
    /// Returns `UsernameError::TooShort` under six characters and
    /// `UsernameError::Whitespace` if any whitespace or control character appears.
    pub fn parse(value: &str) -> Result<Self, UsernameError> {
        if value.chars().count() < Self::MIN_LENGTH {
            return Err(UsernameError::TooShort);
        }
        if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(UsernameError::Whitespace);
        }
        Ok(Self(value.to_owned()))
    }

    /// Returns the username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! impl_display {
    ($($name:ident),*) => {
        $(
            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl AsRef<str> for $name {
                fn as_ref(&self) -> &str {
                    &self.0
                }
            }
        )*
    };
}

impl_display!(ListName, ItemName, PersonName, Username);
