#![warn(missing_docs)]

//! Shared datatypes and utilities used by the School ERP contract tooling.
//!
//! Provide:
//! - The [entities] exchanged between the OpenAPI loader, the activity tracker, the case
//!   generator and the contract-test runner.
//! - [Logging][logging] extensions to name the component emitting a log.
//! - Test utilities (behind the `test_tools` feature): temporary directories and loggers.

pub mod entities;
pub mod logging;
#[cfg(any(test, feature = "test_tools"))]
pub mod test_utils;

/// Generic error type
pub type StdError = anyhow::Error;

/// Generic result type
pub type StdResult<T> = anyhow::Result<T, StdError>;

/// Name of the environment variable holding a bearer token that overrides the one of a
/// case file.
pub const CONTRACT_TOKEN_ENV_VAR: &str = "ERP_CONTRACT_TOKEN";

/// Placeholder replaced by the bearer token in case header values.
pub const TOKEN_PLACEHOLDER: &str = "${TOKEN}";
