use anyhow::Context;
use clap::Parser;
use slog::{debug, info};

use erp_activity_tracker::{
    ActivityTracker, ConsistencyReport, DEFAULT_TRACKER_FALLBACK_FILE, DEFAULT_TRACKER_FILE,
    TrackerLocator, check_consistency,
};
use erp_contract_common::StdResult;

use crate::CommandContext;
use crate::commands::{CommandOutcome, load_openapi_document};
use crate::configuration::keys;

/// Clap command to compare the activity ids of the tracker with the ones of the OpenAPI
/// document
#[derive(Parser, Debug, Clone)]
pub struct CheckTrackerCommand {
    /// Enable JSON output.
    #[clap(long)]
    json: bool,
}

impl CheckTrackerCommand {
    /// Main command execution
    pub fn execute(&self, context: CommandContext) -> StdResult<CommandOutcome> {
        let report = self.build_report(&context)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("{report}");
        }

        Ok(CommandOutcome::from_success(report.is_consistent()))
    }

    fn build_report(&self, context: &CommandContext) -> StdResult<ConsistencyReport> {
        let params = context.config_parameters()?;
        let logger = context.logger();

        let locator = TrackerLocator::new(
            params.get_or(keys::TRACKER_FILE, DEFAULT_TRACKER_FILE),
            params.get_or(keys::TRACKER_FALLBACK_FILE, DEFAULT_TRACKER_FALLBACK_FILE),
        );
        let tracker_path = locator.locate()?;
        debug!(logger, "Tracker located"; "path" => %tracker_path.display());
        let tracker = ActivityTracker::from_file(tracker_path, logger)?;

        let document = load_openapi_document(&params, logger)?;
        let api_ids = document
            .activity_ids(logger)
            .with_context(|| "Can not collect the OpenAPI activity ids")?;

        let report = check_consistency(&tracker.activity_ids(), &api_ids);
        info!(logger, "Consistency checked";
            "missing_in_api" => report.missing_in_api.len(),
            "missing_in_tracker" => report.missing_in_tracker.len()
        );

        Ok(report)
    }
}
