//! Catalog browsing for editor help panels

use crate::{Field, FunctionDef, TypeCatalog};

/// Category selecting every field and function.
pub const ALL_CATEGORY: &str = "All";

/// Category selecting fields only.
pub const FIELDS_CATEGORY: &str = "Available Fields";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorInfo {
    pub symbol: &'static str,
    pub description: &'static str,
}

/// Operator palette offered alongside fields and functions
pub const OPERATORS: &[OperatorInfo] = &[
    OperatorInfo { symbol: "+", description: "Addition (numeric only)" },
    OperatorInfo { symbol: "-", description: "Subtraction (numeric only)" },
    OperatorInfo { symbol: "*", description: "Multiplication (numeric only)" },
    OperatorInfo { symbol: "/", description: "Division (numeric only)" },
    OperatorInfo { symbol: "<", description: "Less than" },
    OperatorInfo { symbol: ">", description: "Greater than" },
    OperatorInfo { symbol: "<=", description: "Less than or equal" },
    OperatorInfo { symbol: ">=", description: "Greater than or equal" },
    OperatorInfo { symbol: "=", description: "Equal" },
];

#[derive(Debug, Clone, Default)]
pub struct CatalogQuery {
    /// `All`, `Available Fields` or a function category; `None` means `All`.
    pub category: Option<String>,
    /// Case-insensitive substring filter.
    pub text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogItem<'a> {
    Field(&'a Field),
    Function(&'a FunctionDef),
}

impl CatalogItem<'_> {
    pub fn name(&self) -> &str {
        match self {
            CatalogItem::Field(f) => &f.name,
            CatalogItem::Function(f) => &f.name,
        }
    }

    /// One-line description: `Type: <dataType>` or the function signature.
    pub fn describe(&self) -> String {
        match self {
            CatalogItem::Field(f) => format!("Type: {}", f.data_type),
            CatalogItem::Function(f) => f.signature(),
        }
    }

    fn matches(&self, needle: &str) -> bool {
        match self {
            CatalogItem::Field(f) => {
                f.name.to_lowercase().contains(needle)
                    || format!("Type: {}", f.data_type).to_lowercase().contains(needle)
            }
            CatalogItem::Function(f) => {
                f.name.to_lowercase().contains(needle)
                    || f.description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(needle))
                    || f.params.iter().any(|p| p.name.to_lowercase().contains(needle))
            }
        }
    }
}

impl TypeCatalog {
    /// Distinct function categories in first-seen order
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();
        for func in self.functions() {
            if !categories.contains(&func.category.as_str()) {
                categories.push(&func.category);
            }
        }
        categories
    }

    /// Fields and functions matching the query, fields first, in catalog order
    pub fn search(&self, query: &CatalogQuery) -> Vec<CatalogItem<'_>> {
        let fields = self.fields().iter().map(CatalogItem::Field);
        let functions = self.functions().iter().map(CatalogItem::Function);

        let items: Vec<CatalogItem<'_>> = match query.category.as_deref() {
            None | Some(ALL_CATEGORY) => fields.chain(functions).collect(),
            Some(FIELDS_CATEGORY) => fields.collect(),
            Some(category) => functions
                .filter(|item| matches!(item, CatalogItem::Function(f) if f.category == category))
                .collect(),
        };

        match query.text.as_deref().map(str::to_lowercase) {
            Some(needle) if !needle.is_empty() => {
                items.into_iter().filter(|item| item.matches(&needle)).collect()
            }
            _ => items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FunctionParam;

    fn catalog() -> TypeCatalog {
        let mut round = FunctionDef::new(
            "ROUND",
            vec![
                FunctionParam::new("number", "field|number"),
                FunctionParam::new("decimals", "int"),
            ],
            "field",
        );
        round.category = "Numeric Functions".to_string();
        round.description = Some("Rounds a number to a specified number of decimal places".to_string());

        let mut substring = FunctionDef::new(
            "SUBSTRING",
            vec![
                FunctionParam::new("string", "field|string"),
                FunctionParam::new("start", "int"),
                FunctionParam::new("length", "int"),
            ],
            "field",
        );
        substring.category = "String Functions".to_string();

        let mut abs = FunctionDef::new("ABS", vec![FunctionParam::new("number", "field|number")], "field");
        abs.category = "Numeric Functions".to_string();

        TypeCatalog::new(
            vec![Field::new("amount", "decimal"), Field::new("event_date", "date")],
            vec![round, substring, abs],
        )
    }

    fn names(items: &[CatalogItem<'_>]) -> Vec<String> {
        items.iter().map(|i| i.name().to_string()).collect()
    }

    #[test]
    fn test_categories_in_first_seen_order() {
        assert_eq!(catalog().categories(), vec!["Numeric Functions", "String Functions"]);
    }

    #[test]
    fn test_search_all() {
        let catalog = catalog();
        let items = catalog.search(&CatalogQuery::default());
        assert_eq!(names(&items), vec!["amount", "event_date", "ROUND", "SUBSTRING", "ABS"]);
    }

    #[test]
    fn test_search_by_category() {
        let catalog = catalog();
        let query = CatalogQuery {
            category: Some("Numeric Functions".to_string()),
            text: None,
        };
        assert_eq!(names(&catalog.search(&query)), vec!["ROUND", "ABS"]);

        let query = CatalogQuery {
            category: Some(FIELDS_CATEGORY.to_string()),
            text: None,
        };
        assert_eq!(names(&catalog.search(&query)), vec!["amount", "event_date"]);
    }

    #[test]
    fn test_search_text_matches_descriptions_and_params() {
        let catalog = catalog();

        let by_type = CatalogQuery { category: None, text: Some("DATE".to_string()) };
        assert_eq!(names(&catalog.search(&by_type)), vec!["event_date"]);

        let by_param = CatalogQuery { category: None, text: Some("length".to_string()) };
        assert_eq!(names(&catalog.search(&by_param)), vec!["SUBSTRING"]);

        let by_description = CatalogQuery { category: None, text: Some("decimal places".to_string()) };
        assert_eq!(names(&catalog.search(&by_description)), vec!["ROUND"]);
    }

    #[test]
    fn test_describe() {
        let catalog = catalog();
        let items = catalog.search(&CatalogQuery::default());
        assert_eq!(items[0].describe(), "Type: decimal");
        assert_eq!(items[4].describe(), "ABS(number: field|number) → field");
    }
}
