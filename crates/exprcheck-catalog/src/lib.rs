//! Field and function catalog for expression validation
//!
//! The catalog is supplied by the caller (usually loaded from a JSON or YAML
//! file) and is read-only while an expression is validated.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

pub mod search;
pub mod types;

pub use search::{CatalogItem, CatalogQuery, OperatorInfo, OPERATORS};
pub use types::{is_numeric_type, is_type_compatible};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON catalog: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse YAML catalog: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unsupported catalog format: {0} (expected .json, .yaml or .yml)")]
    UnsupportedFormat(String),

    #[error("Duplicate field: {0}")]
    DuplicateField(String),

    #[error("Duplicate function: {0}")]
    DuplicateFunction(String),
}

/// A queryable column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "dataType")]
    pub data_type: String,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Declared parameter type: `"int"`, `"field|number"` or `["string", "int"]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamType {
    Single(String),
    List(Vec<String>),
}

impl ParamType {
    /// Acceptable type tokens, split on `|` and trimmed.
    pub fn tokens(&self) -> Vec<String> {
        let entries: Vec<&str> = match self {
            ParamType::Single(s) => vec![s.as_str()],
            ParamType::List(items) => items.iter().map(String::as_str).collect(),
        };
        entries
            .into_iter()
            .flat_map(|entry| entry.split('|'))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// `"any"` as the whole declaration or as a list member.
    pub fn accepts_any(&self) -> bool {
        match self {
            ParamType::Single(s) => s == types::ANY_TYPE,
            ParamType::List(items) => items.iter().any(|t| t == types::ANY_TYPE),
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamType::Single(s) => f.write_str(s),
            ParamType::List(items) => f.write_str(&items.join(" | ")),
        }
    }
}

impl From<&str> for ParamType {
    fn from(s: &str) -> Self {
        ParamType::Single(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionParam {
    pub name: String,
    #[serde(rename = "dataType")]
    pub data_type: ParamType,
    #[serde(default)]
    pub optional: bool,
    /// Display hint: the parameter is meant to receive a field reference.
    #[serde(default, rename = "isField")]
    pub is_field: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FunctionParam {
    pub fn new(name: impl Into<String>, data_type: impl Into<ParamType>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            optional: false,
            is_field: false,
            description: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    #[serde(default)]
    pub params: Vec<FunctionParam>,
    #[serde(rename = "returnType")]
    pub return_type: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FunctionDef {
    pub fn new(name: impl Into<String>, params: Vec<FunctionParam>, return_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params,
            return_type: return_type.into(),
            category: String::new(),
            description: None,
        }
    }

    pub fn required_count(&self) -> usize {
        self.params.iter().filter(|p| !p.optional).count()
    }

    pub fn max_count(&self) -> usize {
        self.params.len()
    }

    /// The result type is opaque and bypasses static checks downstream.
    pub fn returns_field(&self) -> bool {
        self.return_type == types::FIELD_TYPE
    }

    /// Help-text signature, e.g. `ROUND(number: field|number, decimals: int) → field`
    pub fn signature(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|p| {
                let suffix = if p.is_field { " (field)" } else { "" };
                format!("{}: {}{}", p.name, p.data_type, suffix)
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({}) → {}", self.name, params, self.return_type)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    fields: Vec<Field>,
    #[serde(default)]
    functions: Vec<FunctionDef>,
}

/// The fields and functions an expression is checked against
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    fields: Vec<Field>,
    functions: Vec<FunctionDef>,
}

impl TypeCatalog {
    pub fn new(fields: Vec<Field>, functions: Vec<FunctionDef>) -> Self {
        Self { fields, functions }
    }

    /// Load a catalog file, choosing the format from its extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&contents),
            _ => Err(CatalogError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn from_json_str(contents: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(contents)?;
        Self::checked(file)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(contents)?;
        Self::checked(file)
    }

    fn checked(file: CatalogFile) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        if let Some(dup) = file.fields.iter().find(|f| !seen.insert(f.name.as_str())) {
            return Err(CatalogError::DuplicateField(dup.name.clone()));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = file.functions.iter().find(|f| !seen.insert(f.name.as_str())) {
            return Err(CatalogError::DuplicateFunction(dup.name.clone()));
        }

        Ok(Self::new(file.fields, file.functions))
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn functions(&self) -> &[FunctionDef] {
        &self.functions
    }

    pub fn find_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn find_function(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn is_numeric_type(&self, ty: &str) -> bool {
        types::is_numeric_type(ty)
    }

    pub fn is_type_compatible(&self, a: &str, b: &str) -> bool {
        types::is_type_compatible(a, b)
    }
}
