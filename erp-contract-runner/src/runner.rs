use std::sync::Arc;

use serde_json::Value;
use slog::{Logger, debug, info, warn};
use tokio_util::sync::CancellationToken;

use erp_api_spec::ValidatorCache;
use erp_contract_common::entities::TestCase;
use erp_contract_common::logging::LoggerExtensions;

use crate::{
    BearerToken, CaseFailure, CaseOutcome, CaseVerdict, ReplayClient, ReplayError,
    ReplayRequest, ReplayResponse, RunReport,
};

/// Build the url of a case: the base url followed by the literal case path.
///
/// A single trailing `/` of the base url is dropped since case paths start with one.
pub fn build_case_url(base_url: &str, path: &str) -> String {
    let base_url = base_url.strip_suffix('/').unwrap_or(base_url);

    format!("{base_url}{path}")
}

/// A case that has not been sent yet.
#[derive(Debug)]
pub struct PendingCase<'a> {
    case: &'a TestCase,
}

impl<'a> PendingCase<'a> {
    /// Wrap a case
    pub fn new(case: &'a TestCase) -> Self {
        Self { case }
    }

    /// Request of the case, with the token substituted in its headers
    pub fn request(&self, base_url: &str, token: &BearerToken) -> ReplayRequest {
        ReplayRequest {
            method: self.case.method,
            url: build_case_url(base_url, &self.case.path),
            headers: token.substitute_headers(&self.case.headers),
            body: self.case.body.clone(),
        }
    }

    /// Send the request of the case.
    ///
    /// A request failure does not abort anything: it is kept in the executed case and turns
    /// into a failed outcome on assessment.
    pub async fn execute(
        self,
        client: &dyn ReplayClient,
        base_url: &str,
        token: &BearerToken,
    ) -> ExecutedCase<'a> {
        let request = self.request(base_url, token);
        let response = client.replay(&request).await;

        ExecutedCase {
            case: self.case,
            response,
        }
    }
}

/// A case whose request was sent, successfully or not.
#[derive(Debug)]
pub struct ExecutedCase<'a> {
    case: &'a TestCase,
    response: Result<ReplayResponse, ReplayError>,
}

impl ExecutedCase<'_> {
    /// Decide the outcome of the case.
    ///
    /// The status is always checked first. The body is then validated only if the case asks
    /// for it, the response is JSON and a validator exists for the case operation.
    pub fn assess(self, validators: &ValidatorCache, logger: &Logger) -> CaseOutcome {
        let case = self.case;
        let (status, verdict) = match self.response {
            Ok(response) => (
                Some(response.status),
                match Self::check_response(case, &response, validators, logger) {
                    Ok(()) => CaseVerdict::Passed,
                    Err(failure) => CaseVerdict::Failed(failure),
                },
            ),
            Err(error) => (None, CaseVerdict::Failed(CaseFailure::Request(error))),
        };

        CaseOutcome {
            activity_id: case.activity_id.clone(),
            name: case.name.clone(),
            operation: case.operation_key(),
            status,
            verdict,
        }
    }

    fn check_response(
        case: &TestCase,
        response: &ReplayResponse,
        validators: &ValidatorCache,
        logger: &Logger,
    ) -> Result<(), CaseFailure> {
        if !case.expects_status(response.status) {
            return Err(CaseFailure::StatusMismatch {
                expected: case.expect.clone(),
                actual: response.status,
            });
        }

        if !case.validate_against_openapi || !response.is_json() {
            return Ok(());
        }

        let key = case.operation_key();
        let Some(validator) = validators.get(&key) else {
            debug!(logger, "No response validator, body validation skipped"; "operation" => %key);
            return Ok(());
        };

        let body: Value = serde_json::from_slice(&response.body)
            .map_err(|e| CaseFailure::InvalidJsonBody(e.to_string()))?;
        validator.validate(&body).map_err(|violations| {
            for error in &violations.errors {
                warn!(logger, "Response does not match schema"; "operation" => %key, "error" => error);
            }
            CaseFailure::from(violations)
        })
    }
}

/// Replay a list of cases, one after the other, against a server.
pub struct ContractTestRunner {
    client: Arc<dyn ReplayClient>,
    validators: Arc<ValidatorCache>,
    base_url: String,
    token: BearerToken,
    logger: Logger,
}

impl ContractTestRunner {
    /// Constructor
    ///
    /// The validator cache must be complete: it is only read during the run.
    pub fn new(
        client: Arc<dyn ReplayClient>,
        validators: Arc<ValidatorCache>,
        base_url: String,
        token: BearerToken,
        logger: &Logger,
    ) -> Self {
        Self {
            client,
            validators,
            base_url,
            token,
            logger: logger.new_with_component_name::<Self>(),
        }
    }

    /// Run every case in order, a failed case never stops the run.
    ///
    /// When the cancellation token fires the run stops before the next case, the case in
    /// flight is abandoned, and the report holds the outcomes gathered so far.
    pub async fn run(&self, cases: &[TestCase], cancellation: &CancellationToken) -> RunReport {
        let mut report = RunReport::default();
        info!(self.logger, "Replaying contract-test cases";
            "cases" => cases.len(), "base_url" => &self.base_url
        );

        for (index, case) in cases.iter().enumerate() {
            let outcome = tokio::select! {
                biased;
                _ = cancellation.cancelled() => None,
                outcome = self.run_case(case) => Some(outcome),
            };

            let Some(outcome) = outcome else {
                warn!(self.logger, "Run interrupted"; "executed" => index, "total" => cases.len());
                report.interrupted = true;
                report.not_run = cases.len() - index;
                break;
            };

            match &outcome.verdict {
                CaseVerdict::Passed => {
                    info!(self.logger, "Case passed"; "name" => &outcome.name, "status" => outcome.status);
                }
                CaseVerdict::Failed(failure) => {
                    warn!(self.logger, "Case failed";
                        "name" => &outcome.name, "operation" => %outcome.operation, "reason" => %failure
                    );
                }
            }
            report.outcomes.push(outcome);
        }

        info!(self.logger, "Run completed";
            "passed" => report.passed_count(), "failed" => report.failed_count(), "not_run" => report.not_run
        );

        report
    }

    async fn run_case(&self, case: &TestCase) -> CaseOutcome {
        let logger = self.logger.new(slog::o!("activity_id" => case.activity_id.to_string()));
        debug!(logger, "Executing case"; "name" => &case.name);

        PendingCase::new(case)
            .execute(self.client.as_ref(), &self.base_url, &self.token)
            .await
            .assess(&self.validators, &logger)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use anyhow::anyhow;
    use httpmock::MockServer;
    use serde_json::json;

    use erp_api_spec::OpenApiDocument;
    use erp_contract_common::entities::{ActivityId, HttpMethod};
    use erp_contract_common::test_utils::TestLogger;

    use crate::{DEFAULT_REQUEST_TIMEOUT, MockReplayClient, ReqwestReplayClient};

    use super::*;

    const HEALTH_SPEC: &str = r#"
paths:
  /health:
    get:
      x-activity-id: SYS-00-001
      responses:
        "200":
          description: Service is up
          content:
            application/json:
              schema:
                type: object
                required: [health]
                properties:
                  health:
                    type: string
"#;

    fn health_validators() -> ValidatorCache {
        let document = OpenApiDocument::from_yaml_str(HEALTH_SPEC).unwrap();
        ValidatorCache::build(&document, &TestLogger::stdout())
    }

    fn health_case(expect: Vec<u16>, validate: bool) -> TestCase {
        TestCase {
            activity_id: ActivityId::new("SYS-00-001").unwrap(),
            name: "Health".to_string(),
            method: HttpMethod::Get,
            path: "/health".to_string(),
            headers: BTreeMap::new(),
            body: None,
            expect,
            validate_against_openapi: validate,
        }
    }

    fn json_response(status: u16, body: &str) -> ReplayResponse {
        ReplayResponse {
            status,
            content_type: Some("application/json".to_string()),
            body: body.as_bytes().to_vec(),
        }
    }

    fn assess_response(case: &TestCase, response: Result<ReplayResponse, ReplayError>) -> CaseOutcome {
        ExecutedCase { case, response }.assess(&health_validators(), &TestLogger::stdout())
    }

    mod url {
        use super::*;

        #[test]
        fn path_is_appended_to_the_base_url() {
            assert_eq!(
                "http://localhost:3000/setup/trusts",
                build_case_url("http://localhost:3000", "/setup/trusts")
            );
        }

        #[test]
        fn single_trailing_slash_of_the_base_url_is_dropped() {
            assert_eq!(
                "http://localhost:3000/api/health",
                build_case_url("http://localhost:3000/api/", "/health")
            );
        }

        #[test]
        fn path_template_is_kept_literally() {
            assert_eq!(
                "http://localhost:3000/students/{id}",
                build_case_url("http://localhost:3000", "/students/{id}")
            );
        }
    }

    #[test]
    fn pending_case_request_has_the_token_substituted() {
        let mut case = health_case(vec![200], false);
        case.method = HttpMethod::Post;
        case.headers
            .insert("Authorization".to_string(), "Bearer ${TOKEN}".to_string());
        case.body = Some(json!({"name": "Green Valley"}));

        let request = PendingCase::new(&case).request(
            "http://localhost:3000",
            &BearerToken::resolve(Some("secret"), None),
        );

        assert_eq!(
            ReplayRequest {
                method: HttpMethod::Post,
                url: "http://localhost:3000/health".to_string(),
                headers: BTreeMap::from([(
                    "Authorization".to_string(),
                    "Bearer secret".to_string()
                )]),
                body: Some(json!({"name": "Green Valley"})),
            },
            request
        );
    }

    mod assess {
        use super::*;

        #[test]
        fn expected_status_passes() {
            let case = health_case(vec![200, 400], false);

            let outcome = assess_response(&case, Ok(json_response(400, "{}")));

            assert!(outcome.verdict.is_passed());
            assert_eq!(Some(400), outcome.status);
        }

        #[test]
        fn unexpected_status_fails_with_expected_and_actual() {
            let case = health_case(vec![200], true);

            let outcome = assess_response(&case, Ok(json_response(500, r#"{"error":"boom"}"#)));

            assert!(matches!(
                outcome.verdict,
                CaseVerdict::Failed(CaseFailure::StatusMismatch { ref expected, actual: 500 })
                    if *expected == vec![200]
            ));
        }

        #[test]
        fn body_matching_the_schema_passes() {
            let case = health_case(vec![200], true);

            let outcome = assess_response(&case, Ok(json_response(200, r#"{"health":"ok"}"#)));

            assert!(outcome.verdict.is_passed(), "{:?}", outcome.verdict);
        }

        #[test]
        fn body_violating_the_schema_fails_with_every_error() {
            let case = health_case(vec![200], true);

            let outcome = assess_response(&case, Ok(json_response(200, r#"{"health":1}"#)));

            match outcome.verdict {
                CaseVerdict::Failed(CaseFailure::SchemaViolation(violations)) => {
                    assert_eq!(1, violations.errors.len(), "{violations}");
                }
                verdict => panic!("unexpected verdict: {verdict:?}"),
            }
        }

        #[test]
        fn body_is_not_validated_unless_asked() {
            let case = health_case(vec![200], false);

            let outcome = assess_response(&case, Ok(json_response(200, r#"{"health":1}"#)));

            assert!(outcome.verdict.is_passed());
        }

        #[test]
        fn non_json_response_is_not_validated() {
            let case = health_case(vec![200], true);
            let response = ReplayResponse {
                status: 200,
                content_type: Some("text/plain".to_string()),
                body: b"ok".to_vec(),
            };

            let outcome = assess_response(&case, Ok(response));

            assert!(outcome.verdict.is_passed());
        }

        #[test]
        fn operation_without_validator_is_not_validated() {
            let mut case = health_case(vec![200], true);
            case.path = "/reports".to_string();

            let outcome = assess_response(&case, Ok(json_response(200, r#"{"health":1}"#)));

            assert!(outcome.verdict.is_passed());
        }

        #[test]
        fn invalid_json_body_fails() {
            let case = health_case(vec![200], true);

            let outcome = assess_response(&case, Ok(json_response(200, "{not json")));

            assert!(matches!(
                outcome.verdict,
                CaseVerdict::Failed(CaseFailure::InvalidJsonBody(_))
            ));
        }

        #[test]
        fn request_error_fails_without_status() {
            let case = health_case(vec![200], false);

            let outcome = assess_response(
                &case,
                Err(ReplayError::RemoteServerUnreachable(anyhow!(
                    "connection refused"
                ))),
            );

            assert_eq!(None, outcome.status);
            assert!(matches!(
                outcome.verdict,
                CaseVerdict::Failed(CaseFailure::Request(_))
            ));
        }
    }

    mod run {
        use super::*;

        fn runner(client: MockReplayClient) -> ContractTestRunner {
            ContractTestRunner::new(
                Arc::new(client),
                Arc::new(health_validators()),
                "http://localhost:3000".to_string(),
                BearerToken::default(),
                &TestLogger::stdout(),
            )
        }

        #[tokio::test]
        async fn failed_case_does_not_stop_the_run() {
            let mut client = MockReplayClient::new();
            client
                .expect_replay()
                .withf(|request| request.url.ends_with("/slow"))
                .times(1)
                .returning(|_| Err(ReplayError::Timeout(DEFAULT_REQUEST_TIMEOUT)));
            client
                .expect_replay()
                .withf(|request| request.url.ends_with("/health"))
                .times(1)
                .returning(|_| Ok(json_response(200, r#"{"health":"ok"}"#)));
            let mut slow_case = health_case(vec![200], true);
            slow_case.path = "/slow".to_string();
            let cases = [slow_case, health_case(vec![200], true)];

            let report = runner(client).run(&cases, &CancellationToken::new()).await;

            assert_eq!(2, report.outcomes.len());
            assert_eq!(1, report.passed_count());
            assert_eq!(1, report.failed_count());
            assert!(!report.outcomes[0].verdict.is_passed());
            assert!(!report.is_success());
        }

        #[tokio::test]
        async fn every_case_passing_is_a_success() {
            let mut client = MockReplayClient::new();
            client
                .expect_replay()
                .times(3)
                .returning(|_| Ok(json_response(200, r#"{"health":"ok"}"#)));
            let cases = vec![health_case(vec![200], true); 3];

            let report = runner(client).run(&cases, &CancellationToken::new()).await;

            assert_eq!(3, report.passed_count());
            assert!(report.is_success());
        }

        #[tokio::test]
        async fn empty_case_list_is_a_success() {
            let report = runner(MockReplayClient::new())
                .run(&[], &CancellationToken::new())
                .await;

            assert!(report.outcomes.is_empty());
            assert!(report.is_success());
        }

        #[tokio::test]
        async fn cancelled_before_start_runs_nothing() {
            let cancellation = CancellationToken::new();
            cancellation.cancel();
            let cases = vec![health_case(vec![200], false); 2];

            let report = runner(MockReplayClient::new()).run(&cases, &cancellation).await;

            assert!(report.outcomes.is_empty());
            assert!(report.interrupted);
            assert_eq!(2, report.not_run);
        }

        #[tokio::test]
        async fn interruption_keeps_the_outcomes_already_gathered() {
            let cancellation = CancellationToken::new();
            let mut client = MockReplayClient::new();
            let interrupt = cancellation.clone();
            client.expect_replay().times(1).returning(move |_| {
                interrupt.cancel();
                Ok(json_response(200, r#"{"health":"ok"}"#))
            });
            let cases = vec![health_case(vec![200], false); 3];

            let report = runner(client).run(&cases, &cancellation).await;

            assert_eq!(1, report.outcomes.len());
            assert!(report.outcomes[0].verdict.is_passed());
            assert!(report.interrupted);
            assert_eq!(2, report.not_run);
            assert!(!report.is_success());
        }
    }

    #[tokio::test]
    async fn health_case_against_a_live_server() {
        let healthy_server = MockServer::start();
        healthy_server.mock(|when, then| {
            when.method(httpmock::Method::GET).path("/health");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"health":"ok"}"#);
        });
        let failing_server = MockServer::start();
        failing_server.mock(|when, then| {
            when.method(httpmock::Method::GET).path("/health");
            then.status(500)
                .header("content-type", "application/json")
                .body(r#"{"error":"down"}"#);
        });
        let logger = TestLogger::stdout();
        let client: Arc<dyn ReplayClient> =
            Arc::new(ReqwestReplayClient::new(DEFAULT_REQUEST_TIMEOUT, &logger).unwrap());
        let validators = Arc::new(health_validators());
        let cases = [health_case(vec![200], true)];

        let healthy_report = ContractTestRunner::new(
            client.clone(),
            validators.clone(),
            healthy_server.base_url(),
            BearerToken::default(),
            &logger,
        )
        .run(&cases, &CancellationToken::new())
        .await;
        let failing_report = ContractTestRunner::new(
            client,
            validators,
            failing_server.base_url(),
            BearerToken::default(),
            &logger,
        )
        .run(&cases, &CancellationToken::new())
        .await;

        assert!(healthy_report.is_success());
        assert!(matches!(
            failing_report.outcomes[0].verdict,
            CaseVerdict::Failed(CaseFailure::StatusMismatch { actual: 500, .. })
        ));
    }
}
