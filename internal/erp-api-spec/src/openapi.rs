use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde_json::Value;
use slog::{Logger, warn};
use thiserror::Error;

use erp_contract_common::entities::{ActivityId, HttpMethod, OperationKey};

use crate::ACTIVITY_ID_EXTENSION;

/// Error raised when loading or reading an [OpenApiDocument].
#[derive(Debug, Error)]
pub enum OpenApiError {
    /// The document file could not be read.
    #[error("could not read OpenAPI document '{}'", path.display())]
    Read {
        /// Path of the document
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML.
    #[error("OpenAPI document is not valid YAML")]
    Parse(#[source] serde_yaml::Error),

    /// The document has no `paths` object.
    #[error("OpenAPI document has no `paths` object")]
    MissingPaths,

    /// An `x-activity-id` annotation is neither a non-empty string nor a number.
    #[error("operation '{operation}' has an invalid `x-activity-id`: {value}")]
    InvalidActivityId {
        /// Operation carrying the annotation
        operation: OperationKey,
        /// Annotation value as found in the document
        value: Value,
    },
}

/// An OpenAPI 3.x document, parsed once and read-only afterward.
///
/// Object keys keep the document ordering.
#[derive(Debug, Clone)]
pub struct OpenApiDocument {
    openapi: Value,
}

/// One operation of an [OpenApiDocument]: an HTTP method under a path template.
#[derive(Debug, Clone, Copy)]
pub struct OpenApiOperation<'a> {
    /// Path template, ie: `/trusts/{trustId}`
    pub path: &'a str,
    /// HTTP method
    pub method: HttpMethod,
    /// The OpenAPI operation object
    pub operation: &'a Value,
}

impl OpenApiOperation<'_> {
    /// `"<METHOD> <path>"` key of the operation
    pub fn key(&self) -> OperationKey {
        OperationKey::new(self.method, self.path)
    }

    /// The `x-activity-id` annotation of the operation, if any
    ///
    /// Numeric annotations are read as their text, like the numeric codes of the tracker.
    pub fn activity_id(&self) -> Result<Option<ActivityId>, OpenApiError> {
        let value = match self.operation.get(ACTIVITY_ID_EXTENSION) {
            None | Some(Value::Null) => return Ok(None),
            Some(value) => value,
        };
        let id = match value {
            Value::String(id) => ActivityId::new(id).ok(),
            Value::Number(number) => ActivityId::new(number.to_string()).ok(),
            _ => None,
        };

        id.map(Some).ok_or_else(|| OpenApiError::InvalidActivityId {
            operation: self.key(),
            value: value.clone(),
        })
    }

    /// The summary text of the operation, if any
    pub fn summary(&self) -> Option<&str> {
        self.operation
            .get("summary")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|summary| !summary.is_empty())
    }

    /// JSON schema of the response body for the given status, if declared
    pub fn json_response_schema(&self, status: &str) -> Option<&Value> {
        self.operation
            .get("responses")?
            .get(status)?
            .get("content")?
            .get("application/json")?
            .get("schema")
    }
}

impl OpenApiDocument {
    /// Load a YAML document from a file
    pub fn from_file(path: &Path) -> Result<Self, OpenApiError> {
        let yaml_spec = std::fs::read_to_string(path).map_err(|source| OpenApiError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_yaml_str(&yaml_spec)
    }

    /// Parse a YAML document
    pub fn from_yaml_str(yaml_spec: &str) -> Result<Self, OpenApiError> {
        let openapi: Value = serde_yaml::from_str(yaml_spec).map_err(OpenApiError::Parse)?;
        if !openapi.get("paths").is_some_and(Value::is_object) {
            return Err(OpenApiError::MissingPaths);
        }

        Ok(Self { openapi })
    }

    /// The parsed document tree
    pub fn as_value(&self) -> &Value {
        &self.openapi
    }

    /// The `components` object, [Value::Null] if the document has none
    pub fn components(&self) -> &Value {
        self.openapi.get("components").unwrap_or(&Value::Null)
    }

    /// Every operation of the document, in the document ordering.
    ///
    /// Path item keys that are not HTTP methods (`parameters`, `summary`, extensions...) are
    /// skipped.
    pub fn operations(&self) -> Vec<OpenApiOperation<'_>> {
        let Some(paths) = self.openapi.get("paths").and_then(Value::as_object) else {
            return vec![];
        };

        paths
            .iter()
            .filter_map(|(path, path_item)| path_item.as_object().map(|item| (path, item)))
            .flat_map(|(path, path_item)| {
                path_item.iter().filter_map(move |(key, operation)| {
                    key.parse::<HttpMethod>().ok().map(|method| OpenApiOperation {
                        path,
                        method,
                        operation,
                    })
                })
            })
            .collect()
    }

    /// Set of the `x-activity-id` annotations of the document.
    ///
    /// An id annotated on more than one operation is logged as a warning.
    pub fn activity_ids(&self, logger: &Logger) -> Result<BTreeSet<ActivityId>, OpenApiError> {
        let mut ids = BTreeSet::new();
        for operation in self.operations() {
            if let Some(id) = operation.activity_id()? {
                if ids.contains(&id) {
                    warn!(logger, "Activity id is annotated on several operations";
                        "activity_id" => %id, "operation" => %operation.key()
                    );
                }
                ids.insert(id);
            }
        }

        Ok(ids)
    }
}
