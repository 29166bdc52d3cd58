use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};

use erp_contract_common::TOKEN_PLACEHOLDER;

/// Bearer token substituted into case headers.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Pick the token by priority: the environment override, then the case file default,
    /// then the empty string. Empty values are ignored.
    pub fn resolve(env_override: Option<&str>, case_file_default: Option<&str>) -> Self {
        let token = [env_override, case_file_default]
            .into_iter()
            .flatten()
            .find(|token| !token.is_empty())
            .unwrap_or_default();

        Self(token.to_string())
    }

    /// Replace every `${TOKEN}` placeholder of the value.
    pub fn substitute(&self, value: &str) -> String {
        value.replace(TOKEN_PLACEHOLDER, &self.0)
    }

    /// Copy of the headers with the placeholder replaced, other values are left unmodified.
    pub fn substitute_headers(&self, headers: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        headers
            .iter()
            .map(|(name, value)| (name.clone(), self.substitute(value)))
            .collect()
    }

    /// Check if no token was provided
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Debug for BearerToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "BearerToken(<empty>)")
        } else {
            write!(f, "BearerToken(<redacted>)")
        }
    }
}
