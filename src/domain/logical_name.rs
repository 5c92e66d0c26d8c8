// Copyright (c) 2025 - Cowboy AI, Inc.
//! Logical Name Value Object
//!
//! Every declaration and export in a stack is addressed by a logical name.
//! Names are what references point at, so they are validated once here and
//! never re-checked downstream.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Logical name validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("Logical name is empty")]
    Empty,

    #[error("Logical name exceeds maximum length of 128 characters: {0}")]
    TooLong(usize),

    #[error("Logical name must start with an ASCII letter: {0}")]
    InvalidStart(String),

    #[error("Invalid character in logical name: {0}")]
    InvalidCharacter(char),
}

/// Logical name of a declaration or export
///
/// Invariants:
/// - Non-empty, at most 128 characters
/// - Starts with an ASCII letter
/// - Remaining characters are ASCII alphanumerics, `_` or `-`
///
/// # Examples
///
/// ```rust
/// use cim_stack_graph::domain::LogicalName;
///
/// assert!(LogicalName::new("publicSubnetA").is_ok());
/// assert!(LogicalName::new("pub_route_association").is_ok());
/// assert!(LogicalName::new("1subnet").is_err());
/// assert!(LogicalName::new("my subnet").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LogicalName(String);

impl LogicalName {
    /// Maximum length of a logical name
    pub const MAX_LENGTH: usize = 128;

    /// Create a new logical name with validation
    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into();

        let first = name.chars().next().ok_or(NameError::Empty)?;

        if name.len() > Self::MAX_LENGTH {
            return Err(NameError::TooLong(name.len()));
        }

        if !first.is_ascii_alphabetic() {
            return Err(NameError::InvalidStart(name));
        }

        if let Some(ch) = name
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && *c != '_' && *c != '-')
        {
            return Err(NameError::InvalidCharacter(ch));
        }

        Ok(Self(name))
    }

    /// Get the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for LogicalName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LogicalName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for LogicalName {
    type Error = NameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LogicalName> for String {
    fn from(name: LogicalName) -> Self {
        name.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(LogicalName::new("newVPC").is_ok());
        assert!(LogicalName::new("private_route_association").is_ok());
        assert!(LogicalName::new("allow-tls").is_ok());
        assert!(LogicalName::new("a").is_ok());
    }

    #[test]
    fn test_invalid_names() {
        assert_eq!(LogicalName::new(""), Err(NameError::Empty));
        assert!(matches!(
            LogicalName::new("_hidden"),
            Err(NameError::InvalidStart(_))
        ));
        assert_eq!(
            LogicalName::new("vpc.main"),
            Err(NameError::InvalidCharacter('.'))
        );
    }

    #[test]
    fn test_length_limit() {
        assert!(LogicalName::new("a".repeat(128)).is_ok());
        assert_eq!(
            LogicalName::new("a".repeat(129)),
            Err(NameError::TooLong(129))
        );
    }

    #[test]
    fn test_serde_validates() {
        let name: LogicalName = serde_json::from_str("\"myEIP\"").unwrap();
        assert_eq!(name.as_str(), "myEIP");
        assert!(serde_json::from_str::<LogicalName>("\"bad name\"").is_err());
    }
}
