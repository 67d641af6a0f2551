//! AST types for filter/formula expressions
//!
//! The serialized shape (`"type"` tag, camelCase fields) is the contract shared
//! with any external parser: a JSON AST in this shape can be validated directly.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    Field {
        name: String,
    },
    NumberLiteral {
        value: f64,
    },
    StringLiteral {
        value: String,
    },
    FunctionCall {
        name: String,
        /// Empty argument slots (`f(, x)`) are kept as `None`.
        #[serde(default)]
        arguments: Vec<Option<Node>>,
    },
    CastFunction {
        #[serde(default)]
        value: Option<Box<Node>>,
        #[serde(rename = "targetType")]
        target_type: String,
    },
    BinaryExpression {
        operator: Operator,
        #[serde(default)]
        left: Option<Box<Node>>,
        #[serde(default)]
        right: Option<Box<Node>>,
    },
    CaseExpression {
        whens: Vec<WhenClause>,
        #[serde(rename = "else", default, skip_serializing_if = "Option::is_none")]
        else_branch: Option<Box<Node>>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhenClause {
    #[serde(default)]
    pub condition: Option<Node>,
    #[serde(default)]
    pub result: Option<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    #[serde(rename = "type")]
    pub kind: OperatorKind,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatorKind {
    ArithmeticOperator,
    ComparisonOperator,
    LogicalOperator,
}

impl Operator {
    /// Classify an operator symbol; logical keywords are normalized to upper case.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let (kind, value) = match symbol {
            "+" | "-" | "*" | "/" | "%" => (OperatorKind::ArithmeticOperator, symbol.to_string()),
            "=" | "==" | "!=" | "<>" | "<" | "<=" | ">" | ">=" => {
                (OperatorKind::ComparisonOperator, symbol.to_string())
            }
            s if s.eq_ignore_ascii_case("and") || s.eq_ignore_ascii_case("or") => {
                (OperatorKind::LogicalOperator, s.to_ascii_uppercase())
            }
            _ => return None,
        };
        Some(Operator { kind, value })
    }

    pub fn arithmetic(symbol: impl Into<String>) -> Self {
        Operator { kind: OperatorKind::ArithmeticOperator, value: symbol.into() }
    }

    pub fn comparison(symbol: impl Into<String>) -> Self {
        Operator { kind: OperatorKind::ComparisonOperator, value: symbol.into() }
    }

    pub fn is_arithmetic(&self) -> bool {
        self.kind == OperatorKind::ArithmeticOperator
    }
}

impl Node {
    pub fn field(name: impl Into<String>) -> Self {
        Node::Field { name: name.into() }
    }

    pub fn number(value: f64) -> Self {
        Node::NumberLiteral { value }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Node::StringLiteral { value: value.into() }
    }

    pub fn call(name: impl Into<String>, arguments: Vec<Node>) -> Self {
        Node::FunctionCall {
            name: name.into(),
            arguments: arguments.into_iter().map(Some).collect(),
        }
    }

    pub fn cast(value: Node, target_type: impl Into<String>) -> Self {
        Node::CastFunction {
            value: Some(Box::new(value)),
            target_type: target_type.into(),
        }
    }

    pub fn binary(operator: Operator, left: Node, right: Node) -> Self {
        Node::BinaryExpression {
            operator,
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
        }
    }

    /// The `type` tag this node serializes with.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Field { .. } => "Field",
            Node::NumberLiteral { .. } => "NumberLiteral",
            Node::StringLiteral { .. } => "StringLiteral",
            Node::FunctionCall { .. } => "FunctionCall",
            Node::CastFunction { .. } => "CastFunction",
            Node::BinaryExpression { .. } => "BinaryExpression",
            Node::CaseExpression { .. } => "CaseExpression",
        }
    }
}

/// True when the value has no fractional part.
pub fn is_integer(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0
}

/// Deepest node level (root is 0) the parser produces and the validator walks.
pub const MAX_DEPTH: usize = 256;

/// Render a number literal the way editor-facing messages show it:
/// exponent notation below 1e-6 and from 1e21 up, plain decimals otherwise.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let magnitude = value.abs();
    if magnitude >= 1e-6 && magnitude < 1e21 {
        return value.to_string();
    }

    let scientific = format!("{:e}", value);
    match scientific.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => format!("{}e+{}", mantissa, exponent),
        _ => scientific,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_type_tag() {
        let node = Node::binary(Operator::arithmetic("+"), Node::field("age"), Node::number(1.0));
        let json = serde_json::to_value(&node).unwrap();

        assert_eq!(json["type"], "BinaryExpression");
        assert_eq!(json["operator"]["type"], "ArithmeticOperator");
        assert_eq!(json["operator"]["value"], "+");
        assert_eq!(json["left"]["type"], "Field");
        assert_eq!(json["left"]["name"], "age");
    }

    #[test]
    fn test_deserializes_external_ast() {
        let json = r#"{
            "type": "CaseExpression",
            "whens": [
                {"condition": {"type": "Field", "name": "flag"},
                 "result": {"type": "StringLiteral", "value": "yes"}}
            ],
            "else": {"type": "CastFunction",
                     "value": {"type": "NumberLiteral", "value": 1},
                     "targetType": "string"}
        }"#;
        let node: Node = serde_json::from_str(json).unwrap();

        match node {
            Node::CaseExpression { whens, else_branch } => {
                assert_eq!(whens.len(), 1);
                assert_eq!(whens[0].result, Some(Node::string("yes")));
                assert_eq!(else_branch.map(|b| *b), Some(Node::cast(Node::number(1.0), "string")));
            }
            other => panic!("unexpected node: {:?}", other),
        }
    }

    #[test]
    fn test_missing_operand_is_none() {
        let json = r#"{"type": "BinaryExpression",
                       "operator": {"type": "ArithmeticOperator", "value": "+"},
                       "left": {"type": "Field", "name": "a"}}"#;
        let node: Node = serde_json::from_str(json).unwrap();

        assert!(matches!(node, Node::BinaryExpression { right: None, .. }));
    }

    #[test]
    fn test_operator_classification() {
        assert_eq!(Operator::from_symbol("%").unwrap().kind, OperatorKind::ArithmeticOperator);
        assert_eq!(Operator::from_symbol("<>").unwrap().kind, OperatorKind::ComparisonOperator);
        assert_eq!(Operator::from_symbol("and").unwrap().value, "AND");
        assert!(Operator::from_symbol("^").is_none());
    }

    #[test]
    fn test_is_integer() {
        assert!(is_integer(3.0));
        assert!(is_integer(-0.0));
        assert!(!is_integer(2.5));
        assert!(!is_integer(f64::NAN));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.000001), "0.000001");
        assert_eq!(format_number(1e-7), "1e-7");
        assert_eq!(format_number(-2.5e-8), "-2.5e-8");
        assert_eq!(format_number(123456.789), "123456.789");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
    }
}
