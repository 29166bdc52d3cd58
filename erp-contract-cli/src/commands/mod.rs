//! Command module
//! This module holds the subcommands that can be used from the CLI.

mod check_tracker;
mod generate_cases;
mod run;
mod verify_examples;

pub use check_tracker::*;
pub use generate_cases::*;
pub use run::*;
pub use verify_examples::*;

use std::path::PathBuf;

use anyhow::Context;
use slog::{Logger, debug};

use erp_activity_tracker::TrackerNotFoundError;
use erp_api_spec::{DEFAULT_SPEC_FILE, OpenApiDocument};
use erp_contract_common::StdResult;

use crate::configuration::{ConfigParameters, keys};

/// Exit code of a command that ran but reported a problem (drift, failed case, bad example)
/// or that could not run.
pub const FAILURE_EXIT_CODE: u8 = 1;

/// Exit code when no tracker workbook could be found.
pub const TRACKER_NOT_FOUND_EXIT_CODE: u8 = 2;

/// Result of a command that could run until its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Nothing to report
    Success,
    /// The command reported a problem on stdout
    Failure,
}

impl CommandOutcome {
    /// Process exit code of a command result
    pub fn exit_code(result: &StdResult<Self>) -> u8 {
        match result {
            Ok(Self::Success) => 0,
            Ok(Self::Failure) => FAILURE_EXIT_CODE,
            Err(error) if error.downcast_ref::<TrackerNotFoundError>().is_some() => {
                TRACKER_NOT_FOUND_EXIT_CODE
            }
            Err(_) => FAILURE_EXIT_CODE,
        }
    }

    pub(crate) fn from_success(is_success: bool) -> Self {
        if is_success {
            Self::Success
        } else {
            Self::Failure
        }
    }
}

pub(crate) fn load_openapi_document(
    params: &ConfigParameters,
    logger: &Logger,
) -> StdResult<OpenApiDocument> {
    let path = PathBuf::from(params.get_or(keys::OPENAPI_FILE, DEFAULT_SPEC_FILE));
    debug!(logger, "Loading OpenAPI document"; "path" => %path.display());

    OpenApiDocument::from_file(&path)
        .with_context(|| format!("Can not load OpenAPI document '{}'", path.display()))
}
