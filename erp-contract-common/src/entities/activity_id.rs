use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised when building an [ActivityId] from an empty or blank value.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("an activity id can not be empty")]
pub struct EmptyActivityIdError;

/// ActivityId correlates one tracker row with one API operation (ie: `DATA-00-002`).
///
/// Surrounding whitespaces are trimmed, an empty value is rejected.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActivityId(String);

impl ActivityId {
    /// Value used for operations that carry no `x-activity-id` annotation.
    pub const UNKNOWN: &'static str = "UNKNOWN";

    /// ActivityId factory
    pub fn new<T: AsRef<str>>(value: T) -> Result<Self, EmptyActivityIdError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(EmptyActivityIdError);
        }

        Ok(Self(trimmed.to_string()))
    }

    /// The sentinel id of operations without annotation
    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_string())
    }

    /// Check if this id is the [UNKNOWN][Self::UNKNOWN] sentinel
    pub fn is_unknown(&self) -> bool {
        self.0 == Self::UNKNOWN
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ActivityId {
    fn default() -> Self {
        Self::unknown()
    }
}

impl TryFrom<String> for ActivityId {
    type Error = EmptyActivityIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ActivityId {
    type Error = EmptyActivityIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ActivityId> for String {
    fn from(value: ActivityId) -> Self {
        value.0
    }
}

impl Display for ActivityId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
