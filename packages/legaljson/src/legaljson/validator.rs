//! Structural validation of LegalJSON against the bundled JSON schema.

use jsonschema::Validator;
use serde_json::Value;

use crate::error::{ParserError, Result};
use crate::types::LegalDocument;

const SCHEMA_JSON: &str = include_str!("../../schema/legaljson.schema.json");

/// Validates documents against the LegalJSON schema (draft-07).
pub struct LegalJsonValidator {
    validator: Validator,
}

impl LegalJsonValidator {
    /// Compile the bundled schema.
    ///
    /// # Errors
    /// `ParserConfiguration` if the bundled schema does not compile.
    pub fn new() -> Result<Self> {
        let schema: Value = serde_json::from_str(SCHEMA_JSON)
            .map_err(|e| ParserError::ParserConfiguration(format!("invalid LegalJSON schema: {e}")))?;
        let validator = Validator::new(&schema).map_err(|e| {
            ParserError::ParserConfiguration(format!("failed to compile LegalJSON schema: {e}"))
        })?;
        Ok(Self { validator })
    }

    /// Check a JSON value, returning whether it conforms and one message per violation.
    #[must_use]
    pub fn validate_value(&self, value: &Value) -> (bool, Vec<String>) {
        let errors: Vec<String> = self
            .validator
            .iter_errors(value)
            .map(|e| {
                let path = e.instance_path().to_string();
                if path.is_empty() {
                    e.to_string()
                } else {
                    format!("{path}: {e}")
                }
            })
            .collect();
        (errors.is_empty(), errors)
    }

    /// Check a parsed document.
    ///
    /// # Errors
    /// `Json` if the document cannot be serialized.
    pub fn validate(&self, document: &LegalDocument) -> Result<(bool, Vec<String>)> {
        let value = serde_json::to_value(document)?;
        Ok(self.validate_value(&value))
    }
}
