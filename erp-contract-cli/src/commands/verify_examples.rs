use clap::Parser;
use slog::warn;

use erp_contract_common::StdResult;

use crate::CommandContext;
use crate::commands::{CommandOutcome, load_openapi_document};

/// Clap command to check that the examples of the OpenAPI document conform to their schema
#[derive(Parser, Debug, Clone)]
pub struct VerifyExamplesCommand {}

impl VerifyExamplesCommand {
    /// Main command execution
    pub fn execute(&self, context: CommandContext) -> StdResult<CommandOutcome> {
        let params = context.config_parameters()?;
        let logger = context.logger();
        let document = load_openapi_document(&params, logger)?;

        let errors = document.verify_examples();
        if errors.is_empty() {
            println!("Every example of the OpenAPI document conforms to its schema.");
            return Ok(CommandOutcome::Success);
        }

        warn!(logger, "Invalid examples found"; "count" => errors.len());
        println!("Invalid examples in the OpenAPI document:");
        for error in &errors {
            println!("{error}");
        }

        Ok(CommandOutcome::Failure)
    }
}
