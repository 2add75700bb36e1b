//! Nullable cell values

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell: either a present string or absent (database NULL).
///
/// An empty string is a present value; only the scenario filter folds it
/// into absence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellValue(Option<String>);

impl CellValue {
    /// The absent value
    pub const NULL: CellValue = CellValue(None);

    pub fn new(value: impl Into<String>) -> Self {
        Self(Some(value.into()))
    }

    pub fn null() -> Self {
        Self(None)
    }

    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    /// Absent, or present but only whitespace
    pub fn is_blank(&self) -> bool {
        self.0.as_deref().map_or(true, |v| v.trim().is_empty())
    }

    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Present-but-empty strings become absent; everything else is kept
    pub fn normalize_empty(self) -> Self {
        match self.0 {
            Some(v) if v.is_empty() => Self(None),
            other => Self(other),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(v) => write!(f, "\"{}\"", v),
            None => f.write_str("<null>"),
        }
    }
}

impl From<Option<String>> for CellValue {
    fn from(value: Option<String>) -> Self {
        Self(value)
    }
}

impl From<Option<&str>> for CellValue {
    fn from(value: Option<&str>) -> Self {
        Self(value.map(str::to_string))
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self(Some(value))
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self(Some(value.to_string()))
    }
}
