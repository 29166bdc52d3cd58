use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

use jsonschema::Validator;
use serde_json::Value;
use slog::{Logger, debug, warn};
use thiserror::Error;

use erp_contract_common::entities::OperationKey;
use erp_contract_common::logging::LoggerExtensions;

use crate::OpenApiDocument;

/// Status whose response schema is used to validate replayed responses
pub const VALIDATED_RESPONSE_STATUS: &str = "200";

/// A value does not conform to a schema.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("schema validation failed: {}", errors.join(", "))]
pub struct SchemaViolations {
    /// One message per validation error
    pub errors: Vec<String>,
}

/// Compiled JSON schema of an operation response.
pub struct ResponseValidator {
    validator: Validator,
}

impl Debug for ResponseValidator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseValidator").finish_non_exhaustive()
    }
}

impl ResponseValidator {
    /// Compile a schema taken from the given document.
    ///
    /// The document `components` are embedded at the root of the schema so that local
    /// `#/components/...` references resolve.
    pub fn compile(schema: &Value, document: &OpenApiDocument) -> Result<Self, String> {
        let schema = match schema {
            Value::Object(object) => {
                let mut object = object.clone();
                let components = document.components();
                if !components.is_null() {
                    object.insert("components".to_string(), components.clone());
                }
                Value::Object(object)
            }
            Value::Bool(_) => schema.clone(),
            _ => return Err(format!("schema is not an object: {schema}")),
        };

        let validator = jsonschema::validator_for(&schema).map_err(|e| e.to_string())?;

        Ok(Self { validator })
    }

    /// Validate a value, all the violations are reported
    pub fn validate(&self, value: &Value) -> Result<(), SchemaViolations> {
        let errors: Vec<String> = self
            .validator
            .iter_errors(value)
            .map(|e| format!("{e} (at '{}')", e.instance_path))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SchemaViolations { errors })
        }
    }
}

/// Compiled `200` response validators of every operation of a document, keyed by
/// `"<METHOD> <path>"`.
///
/// The cache must be fully built before the first case is replayed: it is never mutated
/// afterward, so it can be shared by reference without synchronization.
#[derive(Debug, Default)]
pub struct ValidatorCache {
    validators: HashMap<OperationKey, ResponseValidator>,
}

impl ValidatorCache {
    /// Compile the validators of all the operations of the document.
    ///
    /// Operations without a `200` JSON schema, or whose schema can't be compiled, have no
    /// entry: a compile failure is logged and never fails the build.
    pub fn build(document: &OpenApiDocument, logger: &Logger) -> Self {
        let logger = logger.new_with_component_name::<Self>();
        let mut validators = HashMap::new();

        for operation in document.operations() {
            let Some(schema) = operation.json_response_schema(VALIDATED_RESPONSE_STATUS) else {
                debug!(logger, "No response schema declared"; "operation" => %operation.key());
                continue;
            };

            match ResponseValidator::compile(schema, document) {
                Ok(validator) => {
                    validators.insert(operation.key(), validator);
                }
                Err(error) => {
                    warn!(logger, "Response schema could not be compiled, body validation is skipped";
                        "operation" => %operation.key(), "error" => error
                    );
                }
            }
        }

        Self { validators }
    }

    /// Validator of an operation, `None` when the operation has none
    pub fn get(&self, key: &OperationKey) -> Option<&ResponseValidator> {
        self.validators.get(key)
    }

    /// Number of compiled validators
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Check if no validator could be compiled
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}
