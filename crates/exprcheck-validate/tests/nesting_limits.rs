//! Deeply nested input yields a diagnostic instead of exhausting the stack

use exprcheck_ast::{Node, Operator, MAX_DEPTH, MAX_NESTING};
use exprcheck_catalog::{Field, FunctionDef, FunctionParam, TypeCatalog};
use exprcheck_validate::{validate_expression, Validator};

fn catalog() -> TypeCatalog {
    TypeCatalog::new(
        vec![Field::new("a", "int"), Field::new("age", "int")],
        vec![FunctionDef::new("ABS", vec![FunctionParam::new("number", "field|number")], "field")],
    )
}

fn nesting_error(limit: usize) -> String {
    format!("Expression is nested too deeply (limit {})", limit)
}

#[test]
fn test_deep_parentheses() {
    for levels in [500, 1000, 2000] {
        let expression = format!("{}a{}", "(".repeat(levels), ")".repeat(levels));
        let result = validate_expression(&expression, &catalog());

        assert!(!result.is_valid);
        assert_eq!(result.errors, vec![nesting_error(MAX_NESTING)], "levels: {}", levels);
    }
}

#[test]
fn test_long_sum_chain() {
    let expression = vec!["a"; 20_000].join(" + ");
    let result = validate_expression(&expression, &catalog());

    assert!(!result.is_valid);
    assert_eq!(result.errors, vec![nesting_error(MAX_DEPTH)]);
}

#[test]
fn test_chain_within_limit_is_validated() {
    let expression = vec!["a"; 200].join(" + ");
    let result = validate_expression(&expression, &catalog());

    // Every operator but the innermost has a binary left operand
    assert_eq!(result.errors.len(), 198);
    assert!(result.errors.iter().all(|e| e == "Left operand of \"+\" has unknown type"));
}

#[test]
fn test_deep_built_ast_is_cut_once() {
    let mut node = Node::field("age");
    for _ in 0..MAX_DEPTH + 50 {
        node = Node::binary(Operator::comparison("="), node, Node::field("age"));
    }

    let result = Validator::new(&catalog()).validate_ast(&node);

    assert_eq!(result.errors, vec![nesting_error(MAX_DEPTH)]);
}

#[test]
fn test_deep_nested_calls_are_cut_once() {
    let mut node = Node::field("age");
    for _ in 0..MAX_DEPTH + 50 {
        node = Node::call("ABS", vec![node]);
    }

    let result = Validator::new(&catalog()).validate_ast(&node);

    assert_eq!(result.errors, vec![nesting_error(MAX_DEPTH)]);
}
