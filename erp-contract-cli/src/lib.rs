#![warn(missing_docs)]
//! Command line front-end of the School ERP contract tooling.
//!
//! Each tool is a subcommand of the `erp-contract` binary, they share the same logging,
//! configuration and exit codes conventions:
//! - `check-tracker`: compare the tracker activity ids with the OpenAPI ones,
//! - `generate-cases`: draft one contract-test case per OpenAPI operation,
//! - `run`: replay a case file against a running server,
//! - `verify-examples`: check the examples embedded in the OpenAPI document.

mod command_context;
pub mod commands;
pub mod configuration;

pub use command_context::*;
