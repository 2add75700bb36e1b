//! Canonical names for columns, tables and scenarios
//!
//! Identifiers are trimmed on construction and never blank. Comparison,
//! hashing and ordering all use the canonical string, case-sensitively.

use crate::error::{Result, TabfixtureError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(name: impl AsRef<str>) -> Result<Self> {
                let trimmed = name.as_ref().trim();
                if trimmed.is_empty() {
                    return Err(TabfixtureError::invalid_input(concat!(
                        $kind,
                        " name must not be blank"
                    )));
                }
                Ok(Self(Arc::from(trimmed)))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

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

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                &*self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                &*self.0 == *other
            }
        }

        impl FromStr for $name {
            type Err = TabfixtureError;

            fn from_str(s: &str) -> Result<Self> {
                Self::new(s)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = TabfixtureError;

            fn try_from(s: &str) -> Result<Self> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = TabfixtureError;

            fn try_from(s: String) -> Result<Self> {
                Self::new(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

identifier!(
    /// Name of a column within a table
    ColumnId,
    "Column"
);

identifier!(
    /// Name of a table within a dataset
    TableId,
    "Table"
);

identifier!(
    /// Name of a scenario selected through the marker column
    ScenarioId,
    "Scenario"
);

/// Build a list of column identifiers, rejecting the first blank name
pub fn column_ids<I, S>(names: I) -> Result<Vec<ColumnId>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names.into_iter().map(ColumnId::new).collect()
}

/// Build a list of scenario identifiers, rejecting the first blank name
pub fn scenario_ids<I, S>(names: I) -> Result<Vec<ScenarioId>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names.into_iter().map(ScenarioId::new).collect()
}
