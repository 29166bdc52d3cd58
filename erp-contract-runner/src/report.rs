use serde::{Serialize, Serializer};
use thiserror::Error;

use erp_api_spec::SchemaViolations;
use erp_contract_common::entities::{ActivityId, OperationKey};

use crate::ReplayError;

/// Why a case failed.
#[derive(Debug, Error)]
pub enum CaseFailure {
    /// The response status is not one of the expected ones.
    #[error("expected status in {expected:?} but got {actual}")]
    StatusMismatch {
        /// Expected statuses
        expected: Vec<u16>,
        /// Received status
        actual: u16,
    },

    /// The body was announced as JSON but could not be parsed.
    #[error("response body is not valid json: {0}")]
    InvalidJsonBody(String),

    /// The JSON body does not satisfy the OpenAPI response schema.
    #[error(transparent)]
    SchemaViolation(#[from] SchemaViolations),

    /// The request could not be replayed.
    #[error("request failed: {}", format_error_chain(.0))]
    Request(#[from] ReplayError),
}

fn format_error_chain(error: &ReplayError) -> String {
    let mut messages = vec![error.to_string()];
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        messages.push(cause.to_string());
        source = cause.source();
    }

    messages.join(": ")
}

impl Serialize for CaseFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Final state of an executed case.
#[derive(Debug, Serialize)]
#[serde(tag = "result", content = "reason", rename_all = "lowercase")]
pub enum CaseVerdict {
    /// Every assertion held
    Passed,
    /// The first assertion that did not hold
    Failed(CaseFailure),
}

impl CaseVerdict {
    /// Check if the case passed
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Outcome of one case of a run.
#[derive(Debug, Serialize)]
pub struct CaseOutcome {
    /// Activity the case belongs to
    #[serde(rename = "activityId")]
    pub activity_id: ActivityId,
    /// Name of the case
    pub name: String,
    /// Operation targeted by the case
    #[serde(serialize_with = "serialize_display")]
    pub operation: OperationKey,
    /// Received status, absent if the request failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Verdict
    #[serde(flatten)]
    pub verdict: CaseVerdict,
}

fn serialize_display<S: Serializer>(value: &OperationKey, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.as_str())
}

/// Outcomes of a run, in execution order.
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    /// One outcome per executed case
    pub outcomes: Vec<CaseOutcome>,
    /// The run was interrupted before executing every case
    pub interrupted: bool,
    /// Number of cases that were never executed because of the interruption
    #[serde(rename = "notRun")]
    pub not_run: usize,
}

impl RunReport {
    /// Number of passed cases
    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.verdict.is_passed()).count()
    }

    /// Number of failed cases
    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }

    /// Failed cases
    pub fn failures(&self) -> impl Iterator<Item = &CaseOutcome> {
        self.outcomes.iter().filter(|o| !o.verdict.is_passed())
    }

    /// Every case was executed and passed
    pub fn is_success(&self) -> bool {
        !self.interrupted && self.failed_count() == 0
    }
}
