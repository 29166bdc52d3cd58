use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::entities::{ActivityId, HttpMethod, OperationKey};

/// Status codes expected by a freshly generated case, to be narrowed when the case is reviewed.
pub const DEFAULT_EXPECTED_STATUSES: [u16; 2] = [200, 400];

/// Error raised when a test case fails validation on load.
#[derive(Debug, Error)]
pub enum TestCaseError {
    /// The case is not a valid JSON object or misses a required field.
    #[error("malformed case: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A field is present but its value is not acceptable.
    #[error("field `{field}` is invalid: {reason}")]
    InvalidField {
        /// Name of the field, as written in the case file
        field: &'static str,
        /// What is wrong with the value
        reason: String,
    },
}

/// One executable contract-test scenario: a request and its expected outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// Activity the case belongs to
    #[serde(rename = "activityId", default)]
    pub activity_id: ActivityId,

    /// Human readable name, defaults to `"<METHOD> <path>"`
    #[serde(default)]
    pub name: String,

    /// HTTP verb of the request
    pub method: HttpMethod,

    /// Path appended to the base url, taken literally
    pub path: String,

    /// Request headers, values may contain the `${TOKEN}` placeholder
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// JSON body, sent only when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,

    /// Status codes accepted for the response
    pub expect: Vec<u16>,

    /// Validate the JSON response body against the OpenAPI `200` response schema
    #[serde(rename = "validateAgainstOpenAPI", default)]
    pub validate_against_openapi: bool,
}

impl TestCase {
    /// Build the draft case of an OpenAPI operation.
    pub fn draft(
        activity_id: Option<ActivityId>,
        summary: Option<&str>,
        method: HttpMethod,
        path: &str,
    ) -> Self {
        Self {
            activity_id: activity_id.unwrap_or_default(),
            name: summary
                .map(str::to_string)
                .unwrap_or_else(|| Self::default_name(method, path)),
            method,
            path: path.to_string(),
            headers: BTreeMap::new(),
            body: None,
            expect: DEFAULT_EXPECTED_STATUSES.to_vec(),
            validate_against_openapi: false,
        }
    }

    /// Deserialize and validate a case from its JSON representation.
    pub fn from_json_value(value: Value) -> Result<Self, TestCaseError> {
        let case: Self = serde_json::from_value(value)?;
        case.validate()
    }

    /// Check the fields values, filling the name with its default if it's empty.
    pub fn validate(mut self) -> Result<Self, TestCaseError> {
        if !self.path.starts_with('/') {
            return Err(TestCaseError::InvalidField {
                field: "path",
                reason: format!("'{}' must start with a '/'", self.path),
            });
        }

        if self.expect.is_empty() {
            return Err(TestCaseError::InvalidField {
                field: "expect",
                reason: "at least one status code must be expected".to_string(),
            });
        }

        if let Some(status) = self.expect.iter().find(|s| !(100..=599).contains(*s)) {
            return Err(TestCaseError::InvalidField {
                field: "expect",
                reason: format!("{status} is not an http status code"),
            });
        }

        if self.name.trim().is_empty() {
            self.name = Self::default_name(self.method, &self.path);
        }

        Ok(self)
    }

    /// Key of the OpenAPI operation this case targets
    pub fn operation_key(&self) -> OperationKey {
        OperationKey::new(self.method, &self.path)
    }

    /// Check if the given status is one of the expected ones
    pub fn expects_status(&self, status: u16) -> bool {
        self.expect.contains(&status)
    }

    fn default_name(method: HttpMethod, path: &str) -> String {
        format!("{method} {path}")
    }
}
