use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use slog::info;

use erp_api_spec::{CaseGenerator, DEFAULT_BASE_URL};
use erp_contract_common::StdResult;

use crate::CommandContext;
use crate::commands::{CommandOutcome, load_openapi_document};
use crate::configuration::keys;

/// Clap command to draft one contract-test case per OpenAPI operation
#[derive(Parser, Debug, Clone)]
pub struct GenerateCasesCommand {
    /// File the draft is written to, the draft is printed on stdout if not set.
    #[clap(long, short)]
    output: Option<PathBuf>,

    /// Base url written in the draft, default to the configured one.
    #[clap(long)]
    base_url: Option<String>,
}

impl GenerateCasesCommand {
    /// Main command execution
    pub fn execute(&self, context: CommandContext) -> StdResult<CommandOutcome> {
        let params = context.config_parameters()?;
        let logger = context.logger();
        let document = load_openapi_document(&params, logger)?;

        let base_url = self
            .base_url
            .clone()
            .unwrap_or_else(|| params.get_or(keys::BASE_URL, DEFAULT_BASE_URL));
        let draft = CaseGenerator::new(&document).generate_file(&base_url, Utc::now())?;
        let json = serde_json::to_string_pretty(&draft)?;

        match &self.output {
            Some(output) => {
                if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Can not create directory '{}'", parent.display())
                    })?;
                }
                std::fs::write(output, format!("{json}\n"))
                    .with_context(|| format!("Can not write draft to '{}'", output.display()))?;
                info!(logger, "Draft case file written";
                    "path" => %output.display(), "cases" => draft.cases.len()
                );
            }
            None => println!("{json}"),
        }

        Ok(CommandOutcome::Success)
    }
}
