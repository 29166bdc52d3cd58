use std::fmt::{Display, Formatter};

use crate::entities::HttpMethod;

/// Identifies an API operation as `"<METHOD> <path>"`, ie: `"POST /setup/trusts"`.
///
/// The path is kept verbatim, including unresolved `{param}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OperationKey(String);

impl OperationKey {
    /// OperationKey factory
    pub fn new(method: HttpMethod, path: &str) -> Self {
        Self(format!("{method} {path}"))
    }

    /// Get the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OperationKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
