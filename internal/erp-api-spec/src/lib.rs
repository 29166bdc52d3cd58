#![warn(missing_docs)]
//! This crate provides a toolset around the School ERP OpenAPI document:
//! - load the document and list its operations and their `x-activity-id` annotations,
//! - compile the `200` response schemas into a read-only [ValidatorCache],
//! - draft one contract-test case per operation with the [CaseGenerator],
//! - verify that the examples embedded in the document conform to their schemas.

mod case_generator;
mod examples;
mod openapi;
mod validator;

pub use case_generator::*;
pub use examples::*;
pub use openapi::*;
pub use validator::*;

/// Default OpenAPI document file, relative to the working directory
pub const DEFAULT_SPEC_FILE: &str = "openapi.yaml";

/// Extension key of an operation object holding its activity id
pub const ACTIVITY_ID_EXTENSION: &str = "x-activity-id";
