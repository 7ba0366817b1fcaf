//! Record family names.
//!
//! A [`RecordName`] identifies one family of event declarations in a file:
//! the versioned fields structs (`<name>V0_41`, `<name>V0_42`), the fields
//! type itself, and the canonical event struct (`<name>` without its
//! `Fields` suffix).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Version suffix of the struct being extended.
pub const CURRENT_VERSION: &str = "V0_42";

/// Version suffix of the struct the upgrade constructor converts from.
pub const PREVIOUS_VERSION: &str = "V0_41";

const FIELDS_SUFFIX: &str = "Fields";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordNameError {
    #[error("record name is empty")]
    Empty,

    #[error("record name '{0}' is not a Rust identifier")]
    NotIdentifier(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordName(String);

impl RecordName {
    pub fn new(name: impl Into<String>) -> Result<Self, RecordNameError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(RecordNameError::Empty);
        }

        let mut chars = trimmed.chars();
        let head_ok = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if !head_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(RecordNameError::NotIdentifier(name));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `<name><version>`, e.g. `BlocklistSmtpFieldsV0_42`.
    pub fn versioned(&self, version: &str) -> String {
        format!("{}{}", self.0, version)
    }

    pub fn current(&self) -> String {
        self.versioned(CURRENT_VERSION)
    }

    pub fn previous(&self) -> String {
        self.versioned(PREVIOUS_VERSION)
    }

    /// The event struct name: the record name minus a trailing `Fields`.
    ///
    /// A name that is nothing but `Fields`, or has no such suffix, is its own
    /// canonical name.
    pub fn canonical(&self) -> &str {
        match self.0.strip_suffix(FIELDS_SUFFIX) {
            Some(stem) if !stem.is_empty() => stem,
            _ => &self.0,
        }
    }
}

impl fmt::Display for RecordName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RecordName {
    type Error = RecordNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RecordName> for String {
    fn from(value: RecordName) -> Self {
        value.0
    }
}

impl std::str::FromStr for RecordName {
    type Err = RecordNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_names() {
        let record = RecordName::new("BlocklistSmtpFields").unwrap();
        assert_eq!(record.current(), "BlocklistSmtpFieldsV0_42");
        assert_eq!(record.previous(), "BlocklistSmtpFieldsV0_41");
        assert_eq!(record.canonical(), "BlocklistSmtp");
    }

    #[test]
    fn canonical_without_suffix_is_identity() {
        let record = RecordName::new("Foo").unwrap();
        assert_eq!(record.canonical(), "Foo");
        assert_eq!(record.current(), "FooV0_42");

        let bare = RecordName::new("Fields").unwrap();
        assert_eq!(bare.canonical(), "Fields");
    }

    #[test]
    fn only_trailing_suffix_is_stripped() {
        let record = RecordName::new("FieldsetFields").unwrap();
        assert_eq!(record.canonical(), "Fieldset");
    }

    #[test]
    fn rejects_non_identifiers() {
        assert_eq!(RecordName::new("  "), Err(RecordNameError::Empty));
        assert!(matches!(
            RecordName::new("Foo Bar"),
            Err(RecordNameError::NotIdentifier(_))
        ));
        assert!(matches!(
            RecordName::new("9Foo"),
            Err(RecordNameError::NotIdentifier(_))
        ));
        assert!(matches!(
            RecordName::new("Foo.*"),
            Err(RecordNameError::NotIdentifier(_))
        ));
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(RecordName::new(" Foo ").unwrap().as_str(), "Foo");
    }
}
