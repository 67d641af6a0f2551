//! Semantic validation rules over the expression AST
//!
//! Diagnostics are accumulated in traversal order and never abort the walk.
//! Absent nodes (empty argument slots, missing operands) are skipped.
//! Nodes below [`MAX_DEPTH`] are not visited; one diagnostic reports the cut.

use exprcheck_ast::{format_number, is_integer, Node, Operator, WhenClause, MAX_DEPTH};
use exprcheck_catalog::types::{self, FIELD_TYPE};
use exprcheck_catalog::{FunctionParam, TypeCatalog};
use tracing::trace;

use crate::ValidationResult;

#[derive(Debug, Clone, Copy)]
enum Side {
    Left,
    Right,
}

impl Side {
    fn label(self) -> &'static str {
        match self {
            Side::Left => "Left",
            Side::Right => "Right",
        }
    }
}

/// Validates expressions against one catalog.
///
/// The catalog is captured at construction; build a new validator when the
/// field or function list changes.
pub struct Validator<'c> {
    catalog: &'c TypeCatalog,
}

impl<'c> Validator<'c> {
    pub fn new(catalog: &'c TypeCatalog) -> Self {
        Self { catalog }
    }

    /// Parse and validate. A syntax error becomes the only diagnostic.
    pub fn validate(&self, expression: &str) -> ValidationResult {
        match exprcheck_ast::parse(expression) {
            Ok(ast) => self.validate_ast(&ast),
            Err(e) => {
                trace!(error = %e, "syntax error");
                ValidationResult::from_errors(vec![e.to_string()])
            }
        }
    }

    /// Validate an already parsed (or externally produced) AST.
    pub fn validate_ast(&self, ast: &Node) -> ValidationResult {
        let mut errors = Vec::new();
        self.validate_node(Some(ast), &mut errors);
        ValidationResult::from_errors(errors)
    }

    pub fn validate_node(&self, node: Option<&Node>, errors: &mut Vec<String>) {
        self.walk(node, 0, errors);
    }

    fn walk(&self, node: Option<&Node>, depth: usize, errors: &mut Vec<String>) {
        let Some(node) = node else { return };
        if too_deep(depth, errors) {
            return;
        }
        trace!(kind = node.kind(), depth, "validating node");

        match node {
            Node::Field { name } => self.validate_field(name, errors),
            Node::FunctionCall { name, arguments } => {
                self.validate_function_call(name, arguments, depth, errors)
            }
            Node::CastFunction { value, target_type } => {
                self.walk(value.as_deref(), depth + 1, errors);
                if !types::is_valid_cast_target(target_type) {
                    errors.push(format!("Invalid cast target type: \"{}\"", target_type));
                }
            }
            Node::BinaryExpression { operator, left, right } => {
                self.validate_binary(operator, left.as_deref(), right.as_deref(), depth, errors)
            }
            Node::CaseExpression { whens, else_branch } => {
                self.validate_case(whens, else_branch.as_deref(), depth, errors)
            }
            Node::NumberLiteral { .. } | Node::StringLiteral { .. } => {}
        }
    }

    /// Best-effort static type; `None` when unresolvable.
    pub fn node_type<'a>(&'a self, node: Option<&'a Node>) -> Option<&'a str> {
        match node? {
            Node::NumberLiteral { value } => Some(if is_integer(*value) { "int" } else { "number" }),
            Node::StringLiteral { .. } => Some("string"),
            Node::Field { name } => self.catalog.find_field(name).map(|f| f.data_type.as_str()),
            Node::FunctionCall { name, .. } => self.catalog.find_function(name).map(|f| f.return_type.as_str()),
            Node::CastFunction { target_type, .. } => Some(target_type.as_str()),
            Node::BinaryExpression { .. } | Node::CaseExpression { .. } => None,
        }
    }

    fn validate_field(&self, name: &str, errors: &mut Vec<String>) {
        if self.catalog.find_field(name).is_none() {
            errors.push(format!("Unknown field: \"{}\"", name));
        }
    }

    fn returns_field(&self, function_name: &str) -> bool {
        self.catalog
            .find_function(function_name)
            .is_some_and(|f| f.returns_field())
    }

    fn validate_function_call(&self, name: &str, arguments: &[Option<Node>], depth: usize, errors: &mut Vec<String>) {
        let Some(func) = self.catalog.find_function(name) else {
            errors.push(format!("Unknown function: \"{}\"", name));
            return;
        };

        let required = func.required_count();
        let max = func.max_count();
        let got = arguments.len();
        if got < required || got > max {
            if required == max {
                errors.push(format!(
                    "Function \"{}\" expects {} arguments, but got {}",
                    name, required, got
                ));
            } else {
                errors.push(format!(
                    "Function \"{}\" expects {} to {} arguments, but got {}",
                    name, required, max, got
                ));
            }
            return;
        }

        for (arg, param) in arguments.iter().zip(&func.params) {
            let arg = arg.as_ref();
            // Nested calls report their own problems before this argument is typed
            if let Some(Node::FunctionCall { name: inner, arguments: inner_args }) = arg {
                if !too_deep(depth + 1, errors) {
                    self.validate_function_call(inner, inner_args, depth + 1, errors);
                }
            }

            if param.data_type.accepts_any() {
                continue;
            }
            self.validate_argument(arg, param, name, errors);
        }
    }

    fn validate_argument(&self, arg: Option<&Node>, param: &FunctionParam, func_name: &str, errors: &mut Vec<String>) {
        let param_types = param.data_type.tokens();
        let expected = param_types.join(" | ");

        let (Some(arg), Some(arg_type)) = (arg, self.node_type(arg)) else {
            errors.push(format!("Unknown type for argument in function \"{}\"", func_name));
            return;
        };

        match arg {
            Node::FunctionCall { name, .. } if self.returns_field(name) => {}
            Node::Field { name } => {
                let Some(field) = self.catalog.find_field(name) else {
                    errors.push(format!("Unknown field: \"{}\"", name));
                    return;
                };
                if param_types.iter().any(|t| t == FIELD_TYPE) {
                    return;
                }
                if !param_types.iter().any(|t| types::is_type_compatible(&field.data_type, t)) {
                    errors.push(format!(
                        "Type mismatch in function \"{}\": parameter \"{}\" expects {}, but field \"{}\" is of type {}",
                        func_name, param.name, expected, name, field.data_type
                    ));
                }
            }
            Node::NumberLiteral { value } => {
                let accepts_integer = param_types.iter().any(|t| types::is_integer_type(t));
                let accepts_float = param_types.iter().any(|t| types::is_float_type(t));

                if accepts_integer && !accepts_float && !is_integer(*value) {
                    errors.push(format!(
                        "Type mismatch in function \"{}\": parameter \"{}\" expects integer type, but got decimal number {}",
                        func_name, param.name, format_number(*value)
                    ));
                } else if !accepts_integer && !accepts_float {
                    errors.push(format!(
                        "Type mismatch in function \"{}\": parameter \"{}\" expects {}, but got number",
                        func_name, param.name, expected
                    ));
                }
            }
            _ => {
                if !param_types.iter().any(|t| types::is_type_compatible(arg_type, t)) {
                    errors.push(format!(
                        "Type mismatch in function \"{}\": parameter \"{}\" expects {}, but got {}",
                        func_name, param.name, expected, arg_type
                    ));
                }
            }
        }
    }

    fn validate_binary(
        &self,
        operator: &Operator,
        left: Option<&Node>,
        right: Option<&Node>,
        depth: usize,
        errors: &mut Vec<String>,
    ) {
        self.walk(left, depth + 1, errors);
        self.walk(right, depth + 1, errors);

        if operator.is_arithmetic() {
            self.check_arithmetic_operand(Side::Left, left, &operator.value, errors);
            self.check_arithmetic_operand(Side::Right, right, &operator.value, errors);
        }
    }

    fn check_arithmetic_operand(&self, side: Side, operand: Option<&Node>, op: &str, errors: &mut Vec<String>) {
        let Some(ty) = self.node_type(operand) else {
            errors.push(format!("{} operand of \"{}\" has unknown type", side.label(), op));
            return;
        };

        // Only call operands get the "or field type" wording, whatever they return
        match operand {
            Some(Node::FunctionCall { name, .. }) => {
                if !self.returns_field(name) && !types::is_numeric_type(ty) {
                    errors.push(format!(
                        "{} operand of \"{}\" must be numeric (int, bigint, double, decimal, float) or field type, but got {}",
                        side.label(), op, ty
                    ));
                }
            }
            _ => {
                if !types::is_numeric_type(ty) {
                    errors.push(format!(
                        "{} operand of \"{}\" must be numeric (int, bigint, double, decimal, float), but got {}",
                        side.label(), op, ty
                    ));
                }
            }
        }
    }

    fn validate_case(&self, whens: &[WhenClause], else_branch: Option<&Node>, depth: usize, errors: &mut Vec<String>) {
        let first_type = whens.first().and_then(|w| self.node_type(w.result.as_ref()));

        for (index, when) in whens.iter().enumerate() {
            self.walk(when.condition.as_ref(), depth + 1, errors);
            self.walk(when.result.as_ref(), depth + 1, errors);

            if index == 0 {
                continue;
            }
            if let (Some(first), Some(current)) = (first_type, self.node_type(when.result.as_ref())) {
                if !types::is_type_compatible(first, current) {
                    errors.push(format!(
                        "Type mismatch in CASE expression: WHEN clause {} returns {}, but first WHEN clause returns {}",
                        index + 1, current, first
                    ));
                }
            }
        }

        let Some(else_node) = else_branch else { return };
        self.walk(Some(else_node), depth + 1, errors);

        if let (Some(when_type), Some(else_type)) = (first_type, self.node_type(Some(else_node))) {
            if !types::is_type_compatible(when_type, else_type) {
                errors.push(format!(
                    "Type mismatch in CASE expression: ELSE clause returns {}, but WHEN clauses return {}",
                    else_type, when_type
                ));
            }
        }
    }
}

/// Reports the depth cut once per walk.
fn too_deep(depth: usize, errors: &mut Vec<String>) -> bool {
    if depth <= MAX_DEPTH {
        return false;
    }
    let message = format!("Expression is nested too deeply (limit {})", MAX_DEPTH);
    if !errors.contains(&message) {
        errors.push(message);
    }
    true
}
