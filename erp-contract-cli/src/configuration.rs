//! Configuration parameters of the `erp-contract` commands, read from the configuration file,
//! the environment and the command line.

use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

/// Configuration keys, shared by the configuration file, the `ERP_CONTRACT_*` environment
/// variables and the command line.
pub mod keys {
    /// Path of the OpenAPI document
    pub const OPENAPI_FILE: &str = "openapi_file";
    /// Path of the preferred tracker workbook
    pub const TRACKER_FILE: &str = "tracker_file";
    /// Path of the tracker workbook used when the preferred one does not exist
    pub const TRACKER_FALLBACK_FILE: &str = "tracker_fallback_file";
    /// Path of the case file replayed by the runner
    pub const CASES_FILE: &str = "cases_file";
    /// Url the case paths are appended to, overrides the one of the case file
    pub const BASE_URL: &str = "base_url";
    /// Bound on the wait for each replayed request, in seconds
    pub const REQUEST_TIMEOUT_SECS: &str = "request_timeout_secs";
}

/// Default case file, relative to the working directory
pub const DEFAULT_CASES_FILE: &str = "contract-tests/cases.json";

/// Prefix of the environment variables overriding the configuration
pub const ENV_VARIABLES_PREFIX: &str = "ERP_CONTRACT";

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Error raised when a required parameter is not present.
    #[error("Parameter '{0}' is mandatory.")]
    Required(String),

    /// Error raised when a parameter can not be converted to the expected type.
    #[error("Parameter '{name}' has an invalid value '{value}': {reason}")]
    Invalid {
        /// Parameter name
        name: String,
        /// Raw value
        value: String,
        /// Why the value is rejected
        reason: String,
    },
}

/// Configuration parameters holder
#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConfigParameters {
    parameters: HashMap<String, String>,
}

impl ConfigParameters {
    /// Constructor
    pub fn new(parameters: HashMap<String, String>) -> Self {
        Self { parameters }
    }

    /// Useful constructor for testing
    #[cfg(test)]
    pub fn build(parameters: &[(&str, &str)]) -> Self {
        let parameters = parameters
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Self::new(parameters)
    }

    /// Add or replace a parameter in the holder
    #[cfg(test)]
    pub fn add_parameter(&mut self, name: &str, value: &str) -> &mut Self {
        let _ = self.parameters.insert(name.to_string(), value.to_string());

        self
    }

    /// Fetch a parameter from the holder.
    pub fn get(&self, name: &str) -> Option<String> {
        self.parameters.get(name).cloned()
    }

    /// Fetch a parameter from the holder. If the parameter is not set, the
    /// given default value is returned instead.
    pub fn get_or(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or(default.to_string())
    }

    /// Fetch a parameter from the holder. If the parameter is not set, an error
    /// is raised.
    pub fn require(&self, name: &str) -> Result<String, ConfigError> {
        self.get(name)
            .ok_or_else(|| ConfigError::Required(name.to_string()))
    }

    /// Fetch a parameter and parse it as a number of seconds.
    pub fn require_secs(&self, name: &str) -> Result<u64, ConfigError> {
        let value = self.require(name)?;

        value
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::Invalid {
                name: name.to_string(),
                value: value.clone(),
                reason: e.to_string(),
            })
    }
}
