use serde_json::Value;

use crate::{OpenApiDocument, ResponseValidator};

/// An `example` of the document that does not conform to its schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleError {
    /// Location of the example in the document, ie: `paths /health get responses 200`
    pub location: String,
    /// Why the example is rejected
    pub reason: String,
    /// The example itself
    pub example: Value,
}

impl std::fmt::Display for ExampleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "- {}: Error\n    {}\n    Example: {}",
            self.location, self.reason, self.example
        )
    }
}

impl OpenApiDocument {
    /// Verify that all the examples of the document conform to their type definition.
    pub fn verify_examples(&self) -> Vec<ExampleError> {
        self.verify_examples_value("", self.as_value())
    }

    fn verify_examples_value(&self, path_to_value: &str, root_value: &Value) -> Vec<ExampleError> {
        let mut errors: Vec<ExampleError> = self
            .verify_example_conformity(path_to_value, root_value)
            .into_iter()
            .collect();

        match root_value {
            Value::Object(object) => {
                for (value_key, value) in object {
                    let location = format!("{path_to_value} {value_key}");
                    errors.append(&mut self.verify_examples_value(location.trim_start(), value));
                }
            }
            Value::Array(array) => {
                for value in array {
                    errors.append(
                        &mut self.verify_examples_value(&format!("{path_to_value}[?]"), value),
                    );
                }
            }
            _ => {}
        }

        errors
    }

    fn verify_example_conformity(&self, location: &str, component: &Value) -> Option<ExampleError> {
        let example = component.get("example")?;
        // The type definition is at the same level as the example (components) unless there
        // is a schema property (paths).
        let definition = component.get("schema").unwrap_or(component);
        let definition = strip_example(definition);

        let result = ResponseValidator::compile(&definition, self)
            .and_then(|validator| validator.validate(example).map_err(|e| e.to_string()));

        result.err().map(|reason| ExampleError {
            location: location.to_string(),
            reason,
            example: example.clone(),
        })
    }
}

fn strip_example(definition: &Value) -> Value {
    let mut definition = definition.clone();
    if let Some(object) = definition.as_object_mut() {
        object.remove("example");
    }
    definition
}
