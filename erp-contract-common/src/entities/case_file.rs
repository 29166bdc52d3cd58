use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::entities::{TestCase, TestCaseError};

/// Error raised when loading a [CaseFile].
#[derive(Debug, Error)]
pub enum CaseFileError {
    /// The file could not be read.
    #[error("could not read case file '{}'", path.display())]
    Read {
        /// Path of the case file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The file is not JSON or does not have the expected top level shape.
    #[error("case file '{}' is malformed", path.display())]
    Malformed {
        /// Path of the case file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// One of the cases failed validation.
    #[error("case #{index} of '{}' is invalid", path.display())]
    InvalidCase {
        /// Path of the case file
        path: PathBuf,
        /// 0-based position of the case in the list
        index: usize,
        /// Underlying error
        #[source]
        source: TestCaseError,
    },
}

/// Authentication section of a case file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseFileAuth {
    /// Default bearer token, overridden by the environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer: Option<String>,
}

/// Hand-maintained list of cases replayed by the contract-test runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseFile {
    /// Url the case paths are appended to
    #[serde(rename = "baseUrl")]
    pub base_url: String,

    /// Authentication defaults
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<CaseFileAuth>,

    /// Cases, in execution order
    pub cases: Vec<TestCase>,
}

#[derive(Deserialize)]
struct CaseFileMessage {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(default)]
    auth: Option<CaseFileAuth>,
    cases: Vec<Value>,
}

impl CaseFile {
    /// Load and validate a case file, every case is checked before any is returned.
    pub fn from_file(path: &Path) -> Result<Self, CaseFileError> {
        let content = std::fs::read_to_string(path).map_err(|source| CaseFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json_str(&content, path)
    }

    fn from_json_str(content: &str, path: &Path) -> Result<Self, CaseFileError> {
        let message: CaseFileMessage =
            serde_json::from_str(content).map_err(|source| CaseFileError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;

        let cases = message
            .cases
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                TestCase::from_json_value(value).map_err(|source| CaseFileError::InvalidCase {
                    path: path.to_path_buf(),
                    index,
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            base_url: message.base_url,
            auth: message.auth,
            cases,
        })
    }

    /// Bearer token embedded in the file, if any
    pub fn bearer(&self) -> Option<&str> {
        self.auth.as_ref().and_then(|auth| auth.bearer.as_deref())
    }
}

/// Draft case file produced by the case generator, meant to be reviewed and copied into a
/// hand-maintained [CaseFile].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedCaseFile {
    /// Reminder that the file is a draft
    #[serde(rename = "_comment")]
    pub comment: String,

    /// Generation date
    #[serde(rename = "generatedAt")]
    pub generated_at: DateTime<Utc>,

    /// Default url the case paths are appended to
    #[serde(rename = "baseUrl")]
    pub base_url: String,

    /// One case per OpenAPI operation, in document order
    pub cases: Vec<TestCase>,
}

impl GeneratedCaseFile {
    /// Comment written at the top of every generated file
    pub const COMMENT: &'static str = "Generated draft: copy the cases worth keeping into the \
        hand-maintained case file, then review paths, headers, bodies and expected statuses.";

    /// GeneratedCaseFile factory
    pub fn new(base_url: &str, cases: Vec<TestCase>, generated_at: DateTime<Utc>) -> Self {
        Self {
            comment: Self::COMMENT.to_string(),
            generated_at,
            base_url: base_url.to_string(),
            cases,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::entities::HttpMethod;

    use super::*;

    fn parse(value: Value) -> Result<CaseFile, CaseFileError> {
        CaseFile::from_json_str(&value.to_string(), Path::new("cases.json"))
    }

    #[test]
    fn load_case_file_with_auth() {
        let case_file = parse(json!({
            "baseUrl": "http://localhost:3000",
            "auth": {"bearer": "file-token"},
            "cases": [
                {"method": "GET", "path": "/health", "expect": [200]},
                {
                    "activityId": "SETUP-01-001",
                    "name": "Create trust",
                    "method": "POST",
                    "path": "/setup/trusts",
                    "headers": {"Authorization": "Bearer ${TOKEN}"},
                    "body": {"name": "Green Valley"},
                    "expect": [201],
                    "validateAgainstOpenAPI": true
                }
            ]
        }))
        .unwrap();

        assert_eq!("http://localhost:3000", case_file.base_url);
        assert_eq!(Some("file-token"), case_file.bearer());
        assert_eq!(2, case_file.cases.len());
        assert_eq!(HttpMethod::Post, case_file.cases[1].method);
        assert_eq!(Some(json!({"name": "Green Valley"})), case_file.cases[1].body);
        assert!(case_file.cases[1].validate_against_openapi);
    }

    #[test]
    fn auth_is_optional() {
        let case_file = parse(json!({"baseUrl": "http://localhost", "cases": []})).unwrap();

        assert_eq!(None, case_file.bearer());
    }

    #[test]
    fn invalid_case_error_gives_its_index() {
        let error = parse(json!({
            "baseUrl": "http://localhost",
            "cases": [
                {"method": "GET", "path": "/health", "expect": [200]},
                {"method": "GET", "expect": [200]}
            ]
        }))
        .unwrap_err();

        match error {
            CaseFileError::InvalidCase { index, source, .. } => {
                assert_eq!(1, index);
                assert!(source.to_string().contains("missing field `path`"));
            }
            _ => panic!("Expected an InvalidCase error, got: {error:?}"),
        }
    }

    #[test]
    fn missing_base_url_is_malformed() {
        let error = parse(json!({"cases": []})).unwrap_err();

        assert!(matches!(error, CaseFileError::Malformed { .. }));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let error = CaseFile::from_file(Path::new("/does/not/exist/cases.json")).unwrap_err();

        assert!(matches!(error, CaseFileError::Read { .. }));
    }

    #[test]
    fn generated_case_file_layout() {
        let generated_at = DateTime::parse_from_rfc3339("2026-10-19T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let generated = GeneratedCaseFile::new(
            "http://localhost:3000",
            vec![TestCase::draft(None, None, HttpMethod::Get, "/health")],
            generated_at,
        );

        let value = serde_json::to_value(&generated).unwrap();

        assert_eq!(json!(GeneratedCaseFile::COMMENT), value["_comment"]);
        assert_eq!(json!("2026-10-19T08:00:00Z"), value["generatedAt"]);
        assert_eq!(json!("http://localhost:3000"), value["baseUrl"]);
        assert_eq!(1, value["cases"].as_array().unwrap().len());
    }
}
