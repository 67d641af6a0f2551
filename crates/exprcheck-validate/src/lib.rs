//! exprcheck - semantic validation for filter/formula expressions
//!
//! Parses an expression, type-checks field references, function calls,
//! casts, arithmetic operands and CASE branches against a caller-supplied
//! catalog, and reports every problem found as a plain-English message.
//!
//! ```text
//! expression text → AST (exprcheck-ast) → Validator + TypeCatalog → ValidationResult
//! ```
//!
//! Validation is synchronous and pure. The catalog must not change while a
//! call is in progress.

use exprcheck_catalog::{Field, FunctionDef, TypeCatalog};
use serde::{Deserialize, Serialize};
use tracing::debug;

mod validator;

pub use validator::Validator;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    #[serde(rename = "isValid")]
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: vec![],
        }
    }

    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// Errors joined into one helper-text line, e.g. `joined("; ")`
    pub fn joined(&self, separator: &str) -> String {
        self.errors.join(separator)
    }
}

/// Validate expression text against a catalog.
///
/// Blank input is valid without parsing. A fresh [`Validator`] is built for
/// every call.
pub fn validate_expression(expression: &str, catalog: &TypeCatalog) -> ValidationResult {
    if expression.trim().is_empty() {
        return ValidationResult::valid();
    }

    let result = Validator::new(catalog).validate(expression);
    debug!(
        length = expression.len(),
        errors = result.errors.len(),
        "validated expression"
    );
    result
}

/// Convenience form of [`validate_expression`] taking the field and function lists directly
pub fn validate(expression: &str, fields: &[Field], functions: &[FunctionDef]) -> ValidationResult {
    let catalog = TypeCatalog::new(fields.to_vec(), functions.to_vec());
    validate_expression(expression, &catalog)
}
