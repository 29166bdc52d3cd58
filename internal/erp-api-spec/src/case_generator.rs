use chrono::{DateTime, Utc};

use erp_contract_common::entities::{GeneratedCaseFile, TestCase};

use crate::{OpenApiDocument, OpenApiError};

/// Base url written in generated case files when none is given
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Draft one contract-test case per operation of an OpenAPI document.
pub struct CaseGenerator<'a> {
    document: &'a OpenApiDocument,
}

impl<'a> CaseGenerator<'a> {
    /// CaseGenerator factory
    pub fn new(document: &'a OpenApiDocument) -> Self {
        Self { document }
    }

    /// One case per `(path, method)` of the document, in the document ordering.
    pub fn generate_cases(&self) -> Result<Vec<TestCase>, OpenApiError> {
        self.document
            .operations()
            .into_iter()
            .map(|operation| {
                Ok(TestCase::draft(
                    operation.activity_id()?,
                    operation.summary(),
                    operation.method,
                    operation.path,
                ))
            })
            .collect()
    }

    /// Draft case file holding all the generated cases.
    pub fn generate_file(
        &self,
        base_url: &str,
        generated_at: DateTime<Utc>,
    ) -> Result<GeneratedCaseFile, OpenApiError> {
        Ok(GeneratedCaseFile::new(
            base_url,
            self.generate_cases()?,
            generated_at,
        ))
    }
}
