use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::Parser;
use cli_table::{Cell, Table, format::Justify, print_stdout};
use slog::{Logger, debug, warn};
use tokio_util::sync::CancellationToken;

use erp_api_spec::ValidatorCache;
use erp_contract_common::{CONTRACT_TOKEN_ENV_VAR, StdResult};
use erp_contract_common::entities::{CaseFile, TestCase};
use erp_contract_runner::{
    BearerToken, CaseVerdict, ContractTestRunner, ReqwestReplayClient, RunReport,
};

use crate::CommandContext;
use crate::commands::{CommandOutcome, load_openapi_document};
use crate::configuration::{DEFAULT_CASES_FILE, keys};

/// Clap command to replay a case file against a running server
#[derive(Parser, Debug, Clone)]
pub struct RunCommand {
    /// Case file to replay, default to the configured one.
    #[clap(long)]
    cases: Option<PathBuf>,

    /// Url the case paths are appended to, overrides the configured one and the one of the
    /// case file.
    #[clap(long)]
    base_url: Option<String>,

    /// Only replay the cases of this activity.
    #[clap(long)]
    activity: Option<String>,

    /// Bound on the wait for each request, in seconds.
    #[clap(long)]
    timeout: Option<u64>,

    /// Enable JSON output.
    #[clap(long)]
    json: bool,

    /// Bearer token substituted to `${TOKEN}` in the case headers, overrides the one of the
    /// case file.
    #[clap(long, env = CONTRACT_TOKEN_ENV_VAR, hide_env_values = true)]
    token: Option<String>,
}

impl RunCommand {
    /// Main command execution
    pub async fn execute(&self, context: CommandContext) -> StdResult<CommandOutcome> {
        let params = context.config_parameters()?;
        let logger = context.logger();

        let cases_path = self
            .cases
            .clone()
            .unwrap_or_else(|| PathBuf::from(params.get_or(keys::CASES_FILE, DEFAULT_CASES_FILE)));
        let case_file = CaseFile::from_file(&cases_path)
            .with_context(|| format!("Can not load case file '{}'", cases_path.display()))?;
        let token = BearerToken::resolve(self.token.as_deref(), case_file.bearer());
        if token.is_empty() {
            debug!(logger, "No bearer token provided");
        }
        let base_url = self
            .base_url
            .clone()
            .or_else(|| params.get(keys::BASE_URL))
            .unwrap_or(case_file.base_url);
        let timeout = match self.timeout {
            Some(timeout) => timeout,
            None => params.require_secs(keys::REQUEST_TIMEOUT_SECS)?,
        };
        let cases = self.select_cases(case_file.cases)?;

        let validators = if cases.iter().any(|case| case.validate_against_openapi) {
            let document = load_openapi_document(&params, logger)?;
            ValidatorCache::build(&document, logger)
        } else {
            debug!(logger, "No case validates its body, OpenAPI document not loaded");
            ValidatorCache::default()
        };

        let client = ReqwestReplayClient::new(Duration::from_secs(timeout), logger)?;
        let runner = ContractTestRunner::new(
            Arc::new(client),
            Arc::new(validators),
            base_url,
            token,
            logger,
        );

        let cancellation = CancellationToken::new();
        let interrupt_listener = spawn_interrupt_listener(cancellation.clone(), logger.clone());
        let report = runner.run(&cases, &cancellation).await;
        interrupt_listener.abort();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_report(&report)?;
        }

        Ok(CommandOutcome::from_success(report.is_success()))
    }

    fn select_cases(&self, cases: Vec<TestCase>) -> StdResult<Vec<TestCase>> {
        let Some(activity) = self.activity.as_deref().map(str::trim) else {
            return Ok(cases);
        };

        let selected: Vec<TestCase> = cases
            .into_iter()
            .filter(|case| case.activity_id.as_str() == activity)
            .collect();
        if selected.is_empty() {
            return Err(anyhow!("No case belongs to activity '{activity}'"));
        }

        Ok(selected)
    }
}

fn spawn_interrupt_listener(
    cancellation: CancellationToken,
    logger: Logger,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!(logger, "Interrupt received, stopping before the next case");
            cancellation.cancel();
        }
    })
}

fn print_report(report: &RunReport) -> StdResult<()> {
    if !report.outcomes.is_empty() {
        let table = report
            .outcomes
            .iter()
            .map(|outcome| {
                vec![
                    outcome.activity_id.as_str().cell(),
                    outcome.name.as_str().cell(),
                    outcome.operation.as_str().cell(),
                    outcome
                        .status
                        .map(|status| status.to_string())
                        .unwrap_or_else(|| "-".to_string())
                        .cell()
                        .justify(Justify::Right),
                    if outcome.verdict.is_passed() { "passed" } else { "FAILED" }.cell(),
                ]
            })
            .collect::<Vec<_>>()
            .table()
            .title(vec![
                "Activity".cell(),
                "Name".cell(),
                "Operation".cell(),
                "Status".cell().justify(Justify::Right),
                "Result".cell(),
            ]);
        print_stdout(table)?;
    }

    let failures = failure_lines(report);
    if !failures.is_empty() {
        println!("Failed cases:");
        for line in failures {
            println!("{line}");
        }
    }

    let mut summary = format!(
        "{} passed, {} failed",
        report.passed_count(),
        report.failed_count()
    );
    if report.interrupted {
        summary.push_str(&format!(", {} not run (interrupted)", report.not_run));
    }
    println!("{summary}");

    Ok(())
}

/// One line per failed case with the reason of its failure, schema violations can be too long
/// to fit in a table cell.
fn failure_lines(report: &RunReport) -> Vec<String> {
    report
        .failures()
        .filter_map(|outcome| match &outcome.verdict {
            CaseVerdict::Failed(failure) => Some(format!(
                "- [{}] {} ({}): {failure}",
                outcome.activity_id, outcome.name, outcome.operation
            )),
            CaseVerdict::Passed => None,
        })
        .collect()
}
