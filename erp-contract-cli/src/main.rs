use anyhow::Context;
use clap::{Parser, Subcommand};
use config::{ConfigBuilder, Map, Source, Value, ValueKind, builder::DefaultState};
use slog::{Drain, Fuse, Level, Logger, debug};
use slog_term::Decorator;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use std::{fs::File, path::PathBuf};

use erp_activity_tracker::{DEFAULT_TRACKER_FALLBACK_FILE, DEFAULT_TRACKER_FILE};
use erp_api_spec::DEFAULT_SPEC_FILE;
use erp_contract_common::StdResult;

use erp_contract_cli::CommandContext;
use erp_contract_cli::commands::{
    CheckTrackerCommand, CommandOutcome, GenerateCasesCommand, RunCommand, VerifyExamplesCommand,
};
use erp_contract_cli::configuration::{DEFAULT_CASES_FILE, ENV_VARIABLES_PREFIX, keys};

/// Default bound on the wait for each replayed request, in seconds
const DEFAULT_REQUEST_TIMEOUT_SECS: &str = "15";

enum LogOutputType {
    StdErr,
    File(String),
}

impl LogOutputType {
    fn get_writer(&self) -> StdResult<Box<dyn Write + Send>> {
        let writer: Box<dyn Write + Send> = match self {
            LogOutputType::StdErr => Box::new(std::io::stderr()),
            LogOutputType::File(filepath) => Box::new(
                File::create(filepath)
                    .with_context(|| format!("Can not create output log file: {filepath}"))?,
            ),
        };

        Ok(writer)
    }
}

#[derive(Parser, Debug, Clone)]
#[clap(name = "erp-contract")]
#[clap(
    about = "This program checks the School ERP API against its OpenAPI contract and activity tracker.",
    long_about = None
)]
#[command(version)]
pub struct Args {
    /// Available commands
    #[clap(subcommand)]
    command: ContractCommands,

    /// Run Mode.
    #[clap(long, env = "RUN_MODE", default_value = "dev")]
    run_mode: String,

    /// Verbosity level (-v=warning, -vv=info, -vvv=debug, -vvvv=trace).
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory where configuration file is located.
    #[clap(long, default_value = "./config")]
    pub config_directory: PathBuf,

    /// Override configuration OpenAPI document path.
    #[clap(long)]
    openapi_file: Option<String>,

    /// Override configuration tracker workbook path.
    #[clap(long)]
    tracker_file: Option<String>,

    /// Override configuration fallback tracker workbook path.
    #[clap(long)]
    tracker_fallback_file: Option<String>,

    /// Enable JSON output for logs displayed according to verbosity level
    #[clap(long)]
    log_format_json: bool,

    /// Redirect the logs to a file
    #[clap(long, alias("o"))]
    log_output: Option<String>,
}

impl Args {
    pub async fn execute(&self, root_logger: Logger) -> StdResult<CommandOutcome> {
        debug!(
            root_logger,
            "ERP contract CLI version: {}",
            env!("CARGO_PKG_VERSION")
        );
        debug!(root_logger, "Run Mode: {}", self.run_mode);
        let config = self.config_builder(&root_logger)?;
        let context = CommandContext::new(config, root_logger);

        self.command.execute(context).await
    }

    fn config_builder(&self, logger: &Logger) -> StdResult<ConfigBuilder<DefaultState>> {
        let filename = format!("{}/{}.json", self.config_directory.display(), self.run_mode);
        debug!(logger, "Reading configuration file '{filename}'.");
        let config = config::Config::builder()
            .set_default(keys::OPENAPI_FILE, DEFAULT_SPEC_FILE)?
            .set_default(keys::TRACKER_FILE, DEFAULT_TRACKER_FILE)?
            .set_default(keys::TRACKER_FALLBACK_FILE, DEFAULT_TRACKER_FALLBACK_FILE)?
            .set_default(keys::CASES_FILE, DEFAULT_CASES_FILE)?
            .set_default(keys::REQUEST_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS)?
            .add_source(config::File::with_name(&filename).required(false))
            .add_source(config::Environment::with_prefix(ENV_VARIABLES_PREFIX))
            .add_source(self.clone());

        Ok(config)
    }

    fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::Error,
            1 => Level::Warning,
            2 => Level::Info,
            3 => Level::Debug,
            _ => Level::Trace,
        }
    }

    fn get_log_output_type(&self) -> LogOutputType {
        if let Some(output_filepath) = &self.log_output {
            LogOutputType::File(output_filepath.to_string())
        } else {
            LogOutputType::StdErr
        }
    }

    fn wrap_drain<D: Decorator + Send + 'static>(&self, decorator: D) -> Fuse<slog_async::Async> {
        let drain = slog_term::CompactFormat::new(decorator).build().fuse();
        let drain = slog::LevelFilter::new(drain, self.log_level()).fuse();

        slog_async::Async::new(drain).build().fuse()
    }

    fn build_logger(&self) -> StdResult<Logger> {
        let log_output_type = self.get_log_output_type();
        let writer = log_output_type.get_writer()?;

        let drain = if self.log_format_json {
            let drain = slog_bunyan::with_name("erp-contract", writer)
                .set_pretty(false)
                .build()
                .fuse();
            let drain = slog::LevelFilter::new(drain, self.log_level()).fuse();

            slog_async::Async::new(drain).build().fuse()
        } else {
            match log_output_type {
                LogOutputType::StdErr => self.wrap_drain(slog_term::TermDecorator::new().build()),
                LogOutputType::File(_) => self.wrap_drain(slog_term::PlainDecorator::new(writer)),
            }
        };

        Ok(Logger::root(Arc::new(drain), slog::o!()))
    }
}

impl Source for Args {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> Result<Map<String, Value>, config::ConfigError> {
        let mut map = Map::new();
        let namespace = "clap arguments".to_string();

        for (key, value) in [
            (keys::OPENAPI_FILE, &self.openapi_file),
            (keys::TRACKER_FILE, &self.tracker_file),
            (keys::TRACKER_FALLBACK_FILE, &self.tracker_fallback_file),
        ] {
            if let Some(value) = value.clone() {
                map.insert(
                    key.to_string(),
                    Value::new(Some(&namespace), ValueKind::from(value)),
                );
            }
        }

        Ok(map)
    }
}

#[derive(Subcommand, Debug, Clone)]
enum ContractCommands {
    /// Compare the activity ids of the tracker with the ones of the OpenAPI document
    CheckTracker(CheckTrackerCommand),

    /// Draft one contract-test case per OpenAPI operation
    #[clap(alias("gen"))]
    GenerateCases(GenerateCasesCommand),

    /// Replay a case file against a running server
    Run(RunCommand),

    /// Check that the examples of the OpenAPI document conform to their schema
    VerifyExamples(VerifyExamplesCommand),
}

impl ContractCommands {
    pub async fn execute(&self, context: CommandContext) -> StdResult<CommandOutcome> {
        match self {
            Self::CheckTracker(cmd) => cmd.execute(context),
            Self::GenerateCases(cmd) => cmd.execute(context),
            Self::Run(cmd) => cmd.execute(context).await,
            Self::VerifyExamples(cmd) => cmd.execute(context),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load args
    let args = Args::parse();
    let logger = match args.build_logger() {
        Ok(logger) => logger,
        Err(error) => {
            eprintln!("Error: {error:?}");
            return ExitCode::FAILURE;
        }
    };

    let result = args.execute(logger).await;
    if let Err(error) = &result {
        eprintln!("Error: {error:?}");
    }

    ExitCode::from(CommandOutcome::exit_code(&result))
}

#[cfg(test)]
mod tests {
    use erp_contract_common::test_utils::{TempDir, TestLogger};

    use super::*;

    fn params(args: &Args) -> erp_contract_cli::configuration::ConfigParameters {
        CommandContext::new(
            args.config_builder(&TestLogger::stdout()).unwrap(),
            TestLogger::stdout(),
        )
        .config_parameters()
        .unwrap()
    }

    #[test]
    fn parse_subcommands() {
        for subcommand in ["check-tracker", "generate-cases", "run", "verify-examples"] {
            Args::try_parse_from(["erp-contract", subcommand])
                .unwrap_or_else(|e| panic!("'{subcommand}' should parse: {e}"));
        }
    }

    #[test]
    fn verbosity_maps_to_log_levels() {
        let args = Args::try_parse_from(["erp-contract", "-vvv", "check-tracker"]).unwrap();

        assert_eq!(Level::Debug, args.log_level());
    }

    #[test]
    fn defaults_are_used_without_configuration_file() {
        let config_directory = TempDir::create("main", "defaults_are_used_without_configuration_file");
        let args = Args::try_parse_from([
            "erp-contract",
            "--config-directory",
            config_directory.to_str().unwrap(),
            "check-tracker",
        ])
        .unwrap();

        let params = params(&args);

        assert_eq!(
            (
                "tracker-extended.xlsx".to_string(),
                "tracker.xlsx".to_string(),
                "contract-tests/cases.json".to_string(),
                15,
            ),
            (
                params.get_or(keys::TRACKER_FILE, ""),
                params.get_or(keys::TRACKER_FALLBACK_FILE, ""),
                params.get_or(keys::CASES_FILE, ""),
                params.require_secs(keys::REQUEST_TIMEOUT_SECS).unwrap(),
            )
        );
    }

    #[test]
    fn command_line_overrides_configuration_file() {
        let config_directory =
            TempDir::create("main", "command_line_overrides_configuration_file");
        std::fs::write(
            config_directory.join("ci.json"),
            r#"{"openapi_file": "from-file.yaml", "base_url": "http://erp.ci:3000"}"#,
        )
        .unwrap();
        let args = Args::try_parse_from([
            "erp-contract",
            "--run-mode",
            "ci",
            "--config-directory",
            config_directory.to_str().unwrap(),
            "--openapi-file",
            "from-cli.yaml",
            "verify-examples",
        ])
        .unwrap();

        let params = params(&args);

        assert_eq!(Some("from-cli.yaml".to_string()), params.get(keys::OPENAPI_FILE));
        assert_eq!(Some("http://erp.ci:3000".to_string()), params.get(keys::BASE_URL));
    }

    #[test]
    fn run_subcommand_rejects_a_non_numeric_timeout() {
        let result = Args::try_parse_from(["erp-contract", "run", "--timeout", "soon"]);

        assert!(result.is_err());
    }
}
